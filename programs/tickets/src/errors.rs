use thiserror::Error;

use crate::state::ClaimOutcome;
use crate::types::{Address, Amount, RequestId};

/// Error codes for the Tickets core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketsError {
    /// The attached payment is not exactly the unit price.
    #[error("Tickets: Tickets go for {expected} ETH each.")]
    WrongPrice { expected: Amount, attached: Amount },
    /// The oracle refused or could not place the randomness request.
    #[error("Tickets: randomness request failed: {0}")]
    OracleRequestFailed(#[from] OracleError),
    /// A pending request already exists under this id.
    #[error("Tickets: request {0} is already pending")]
    DuplicateRequestId(RequestId),
    /// No pending request exists under this id (never issued, or already fulfilled).
    #[error("Tickets: unknown request {0}")]
    UnknownRequestId(RequestId),
    /// The fulfillment caller is not the configured VRF coordinator.
    #[error("Tickets: only the VRF coordinator can fulfill (caller {caller})")]
    NotOracle { caller: Address },
    /// The pending context was consumed but the mint failed. Not recoverable.
    #[error("Tickets: mint failed for request {request_id}: {source}")]
    MintFailed {
        request_id: RequestId,
        outcome: Box<ClaimOutcome>,
        #[source]
        source: MintError,
    },
    /// A configured address was the zero address.
    #[error("Tickets: zero address not allowed for {0}")]
    ZeroAddressNotAllowed(&'static str),
}

/// Failures reported by the randomness oracle collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The consumer's fee-token balance cannot cover the request fee.
    #[error("insufficient fee-token balance: have {balance}, need {fee}")]
    InsufficientBalance { balance: Amount, fee: Amount },
    /// The oracle does not serve this key hash.
    #[error("key hash is not registered")]
    UnregisteredKeyHash,
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

/// Failures reported by the minting collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MintError {
    #[error("supply exhausted ({max_supply} issued)")]
    SupplyExhausted { max_supply: u64 },
    #[error("mint rejected: {0}")]
    Rejected(String),
}
