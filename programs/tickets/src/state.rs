use serde::{Deserialize, Serialize};

use crate::errors::TicketsError;
use crate::events::EventLog;
use crate::store::PendingRequestStore;
use crate::types::{Address, Amount, KeyHash, Randomness, RequestId};

/// Default unit price of a ticket: 0.1 ETH.
pub const TICKET_PRICE: Amount = Amount::from_wei(100_000_000_000_000_000);

/// Construction-time configuration. Never mutated after [`TicketsConfig::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketsConfig {
    /// The VRF coordinator. The only caller allowed to fulfill randomness.
    pub oracle_coordinator: Address,
    /// Token the oracle fee is paid in.
    pub fee_token: Address,
    /// Oracle key selecting the proving path.
    pub key_hash: KeyHash,
    /// Fee-token amount paid per randomness request.
    pub fee: Amount,
    /// Exact payment required per claim.
    pub ticket_price: Amount,
    /// Prefix applied to every minted item's metadata URI.
    pub base_uri: String,
}

impl TicketsConfig {
    /// Build a configuration at the default [`TICKET_PRICE`].
    ///
    /// The coordinator and fee token must be non-zero addresses.
    pub fn new(
        oracle_coordinator: Address,
        fee_token: Address,
        key_hash: KeyHash,
        fee: Amount,
        base_uri: impl Into<String>,
    ) -> Result<Self, TicketsError> {
        if oracle_coordinator.is_zero() {
            return Err(TicketsError::ZeroAddressNotAllowed("oracle_coordinator"));
        }
        if fee_token.is_zero() {
            return Err(TicketsError::ZeroAddressNotAllowed("fee_token"));
        }
        Ok(Self {
            oracle_coordinator,
            fee_token,
            key_hash,
            fee,
            ticket_price: TICKET_PRICE,
            base_uri: base_uri.into(),
        })
    }

    pub fn with_ticket_price(mut self, ticket_price: Amount) -> Self {
        self.ticket_price = ticket_price;
        self
    }

    /// Token URI of a minted item: `base_uri` followed by the claim's metadata URI.
    pub fn token_uri(&self, metadata_uri: &str) -> String {
        format!("{}{}", self.base_uri, metadata_uri)
    }
}

/// A claim that has been accepted and is waiting for oracle randomness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    /// Identifier issued by the oracle at request time.
    pub request_id: RequestId,
    /// The account that paid for the claim.
    pub claimant: Address,
    /// Caller-supplied description of the item to produce.
    pub metadata_uri: String,
    /// Unix seconds at acceptance. Audit only; nothing expires on it.
    pub created_at: u64,
}

/// A resolved claim, handed to the minter as one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    pub request_id: RequestId,
    pub claimant: Address,
    pub metadata_uri: String,
    pub randomness: Randomness,
}

impl ClaimOutcome {
    pub fn resolve(pending: PendingRequest, randomness: Randomness) -> Self {
        Self {
            request_id: pending.request_id,
            claimant: pending.claimant,
            metadata_uri: pending.metadata_uri,
            randomness,
        }
    }
}

/// All mutable state owned by one Tickets instance.
///
/// Instruction handlers receive it by reference; nothing else holds it.
#[derive(Debug)]
pub struct TicketsState {
    pub config: TicketsConfig,
    pub pending: PendingRequestStore,
    pub events: EventLog,
}

impl TicketsState {
    pub fn new(config: TicketsConfig) -> Self {
        Self {
            config,
            pending: PendingRequestStore::new(),
            events: EventLog::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn rejects_zero_coordinator() {
        let err = TicketsConfig::new(
            Address::default(),
            addr(2),
            KeyHash::new([3; 32]),
            TICKET_PRICE,
            "",
        )
        .unwrap_err();
        assert_eq!(err, TicketsError::ZeroAddressNotAllowed("oracle_coordinator"));
    }

    #[test]
    fn rejects_zero_fee_token() {
        let err = TicketsConfig::new(addr(1), Address::default(), KeyHash::default(), Amount::ZERO, "")
            .unwrap_err();
        assert_eq!(err, TicketsError::ZeroAddressNotAllowed("fee_token"));
    }

    #[test]
    fn token_uri_prefixes_base_uri() {
        let config = TicketsConfig::new(addr(1), addr(2), KeyHash::default(), Amount::ZERO, "ipfs://")
            .unwrap();
        assert_eq!(config.token_uri("ticket.png"), "ipfs://ticket.png");
        assert_eq!(config.ticket_price, TICKET_PRICE);
    }
}
