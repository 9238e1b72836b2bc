use std::time::{SystemTime, UNIX_EPOCH};

use crate::collaborators::RandomnessOracle;
use crate::errors::TicketsError;
use crate::events::{TicketClaimed, TicketsEvent};
use crate::price;
use crate::state::{PendingRequest, TicketsState};
use crate::types::{Address, Amount, RequestId};

/// Accept a paid claim and place its randomness request.
///
/// 1. Rejects any payment other than the exact ticket price, before anything else happens.
/// 2. Requests randomness from the oracle with the configured key hash and fee.
/// 3. Records the claim under the returned request id.
/// 4. Emits [`TicketClaimed`].
///
/// An oracle failure leaves the store untouched.
pub fn handler(
    state: &TicketsState,
    oracle: &dyn RandomnessOracle,
    caller: Address,
    metadata_uri: String,
    attached: Amount,
) -> Result<RequestId, TicketsError> {
    let config = &state.config;
    price::check(attached, config.ticket_price)?;

    let request_id = oracle.request_randomness(&config.key_hash, config.fee)?;

    state.pending.put(
        request_id,
        PendingRequest {
            request_id,
            claimant: caller,
            metadata_uri: metadata_uri.clone(),
            created_at: unix_now(),
        },
    )?;

    state.events.emit(TicketsEvent::TicketClaimed(TicketClaimed {
        request_id,
        claimant: caller,
        metadata_uri,
    }));

    Ok(request_id)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
