use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info};

use crate::types::{Address, Randomness, RequestId};

/// Emitted when a paid claim is accepted and its randomness request placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketClaimed {
    pub request_id: RequestId,
    pub claimant: Address,
    pub metadata_uri: String,
}

/// Emitted when a fulfillment resolves a claim and the minter issues the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketMinted {
    pub request_id: RequestId,
    pub owner: Address,
    pub item_id: u64,
    pub randomness: Randomness,
}

/// Emitted when the pending context was consumed but minting failed.
///
/// The oracle does not redeliver, so this claim cannot be resolved again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintFailed {
    pub request_id: RequestId,
    pub claimant: Address,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum TicketsEvent {
    TicketClaimed(TicketClaimed),
    TicketMinted(TicketMinted),
    MintFailed(MintFailed),
}

/// Append-only record of everything the core has emitted.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Mutex<Vec<TicketsEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: TicketsEvent) {
        match &event {
            TicketsEvent::TicketClaimed(e) => info!(
                request_id = %e.request_id,
                claimant = %e.claimant,
                metadata_uri = %e.metadata_uri,
                "TicketClaimed"
            ),
            TicketsEvent::TicketMinted(e) => info!(
                request_id = %e.request_id,
                owner = %e.owner,
                item_id = e.item_id,
                "TicketMinted"
            ),
            TicketsEvent::MintFailed(e) => error!(
                request_id = %e.request_id,
                claimant = %e.claimant,
                reason = %e.reason,
                "MintFailed: pending claim consumed without a mint"
            ),
        }
        self.entries.lock().push(event);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<TicketsEvent> {
        self.entries.lock().clone()
    }
}
