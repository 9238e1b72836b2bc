pub mod collaborators;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod price;
pub mod state;
pub mod store;
pub mod types;

pub use collaborators::{Minter, RandomnessOracle};
pub use errors::{MintError, OracleError, TicketsError};
pub use events::TicketsEvent;
pub use state::{ClaimOutcome, PendingRequest, TicketsConfig, TicketsState, TICKET_PRICE};
pub use types::{Address, Amount, KeyHash, Randomness, RequestId};

/// Tickets paid for up front and resolved later by VRF randomness.
///
/// Claiming and fulfillment happen in separate calls with unbounded time in
/// between. The only link between them is the request id the oracle issues
/// at claim time and echoes back on fulfillment.
///
/// ## Claim lifecycle
///
/// 1. **Claim**: a caller pays exactly the ticket price through
///    [`Tickets::claim_ticket`]; a randomness request is placed and the claim
///    is recorded as pending under the returned request id.
/// 2. **Fulfill**: the VRF coordinator calls [`Tickets::fulfill_randomness`];
///    the pending claim is removed and the ticket minted to the claimant.
///
/// A request that is never fulfilled stays pending.
pub struct Tickets<O, M> {
    state: TicketsState,
    oracle: O,
    minter: M,
}

impl<O: RandomnessOracle, M: Minter> Tickets<O, M> {
    pub fn new(config: TicketsConfig, oracle: O, minter: M) -> Self {
        Self {
            state: TicketsState::new(config),
            oracle,
            minter,
        }
    }

    /// Claim a ticket by attaching exactly the ticket price.
    ///
    /// Returns the oracle request id that will resolve this claim.
    pub fn claim_ticket(
        &self,
        caller: Address,
        metadata_uri: impl Into<String>,
        attached: Amount,
    ) -> Result<RequestId, TicketsError> {
        instructions::claim_ticket::handler(
            &self.state,
            &self.oracle,
            caller,
            metadata_uri.into(),
            attached,
        )
    }

    /// Deliver randomness for a pending request.
    ///
    /// Only callable by the configured oracle coordinator. Resolves the
    /// claim at most once.
    pub fn fulfill_randomness(
        &self,
        caller: Address,
        request_id: RequestId,
        randomness: Randomness,
    ) -> Result<ClaimOutcome, TicketsError> {
        instructions::fulfill_randomness::handler(
            &self.state,
            &self.minter,
            caller,
            request_id,
            randomness,
        )
    }

    pub fn config(&self) -> &TicketsConfig {
        &self.state.config
    }

    pub fn pending_count(&self) -> usize {
        self.state.pending.len()
    }

    pub fn is_pending(&self, request_id: &RequestId) -> bool {
        self.state.pending.contains(request_id)
    }

    pub fn pending_request(&self, request_id: &RequestId) -> Option<PendingRequest> {
        self.state.pending.get(request_id)
    }

    pub fn pending_requests(&self) -> Vec<PendingRequest> {
        self.state.pending.snapshot()
    }

    pub fn events(&self) -> Vec<TicketsEvent> {
        self.state.events.snapshot()
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn minter(&self) -> &M {
        &self.minter
    }
}
