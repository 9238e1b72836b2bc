use crate::collaborators::Minter;
use crate::errors::TicketsError;
use crate::events::{MintFailed, TicketMinted, TicketsEvent};
use crate::state::{ClaimOutcome, TicketsState};
use crate::types::{Address, Randomness, RequestId};

/// Resolve a pending claim with randomness delivered by the oracle.
///
/// 1. Only the configured coordinator may call; anyone else gets `NotOracle`
///    whether or not the request id exists.
/// 2. Takes the pending claim out of the store. A second delivery of the same
///    id finds nothing and fails with `UnknownRequestId`.
/// 3. Mints to the claimant and emits [`TicketMinted`].
///
/// A failed mint is terminal: the claim stays consumed, [`MintFailed`] is
/// emitted, and the error is returned with the resolved outcome attached.
pub fn handler(
    state: &TicketsState,
    minter: &dyn Minter,
    caller: Address,
    request_id: RequestId,
    randomness: Randomness,
) -> Result<ClaimOutcome, TicketsError> {
    let config = &state.config;
    if caller != config.oracle_coordinator {
        return Err(TicketsError::NotOracle { caller });
    }

    let pending = state.pending.take(&request_id)?;
    let outcome = ClaimOutcome::resolve(pending, randomness);
    let token_uri = config.token_uri(&outcome.metadata_uri);

    match minter.mint(&outcome.claimant, &token_uri, &outcome.randomness) {
        Ok(item_id) => {
            state.events.emit(TicketsEvent::TicketMinted(TicketMinted {
                request_id,
                owner: outcome.claimant,
                item_id,
                randomness,
            }));
            Ok(outcome)
        }
        Err(source) => {
            state.events.emit(TicketsEvent::MintFailed(MintFailed {
                request_id,
                claimant: outcome.claimant,
                reason: source.to_string(),
            }));
            Err(TicketsError::MintFailed {
                request_id,
                outcome: Box::new(outcome),
                source,
            })
        }
    }
}
