//! In-memory ticket registry: the minting side of the Tickets flow.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use tickets::{Address, MintError, Minter, Randomness};

/// A minted ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    /// Sequential id, starting at 0.
    pub item_id: u64,
    pub owner: Address,
    pub token_uri: String,
    /// The VRF output that resolved the claim, hex-encoded.
    #[serde(serialize_with = "as_hex")]
    pub randomness: Randomness,
}

fn as_hex<S: serde::Serializer>(bytes: &Randomness, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
}

#[derive(Default)]
struct RegistryState {
    tickets: Vec<Ticket>,
    balances: HashMap<Address, u64>,
}

#[derive(Default)]
pub struct TicketRegistry {
    max_supply: Option<u64>,
    state: Mutex<RegistryState>,
}

impl TicketRegistry {
    pub fn new(max_supply: Option<u64>) -> Self {
        Self {
            max_supply,
            state: Mutex::new(RegistryState::default()),
        }
    }

    pub fn get(&self, item_id: u64) -> Option<Ticket> {
        let index = usize::try_from(item_id).ok()?;
        self.state.lock().tickets.get(index).cloned()
    }

    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.state.lock().balances.get(owner).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u64 {
        self.state.lock().tickets.len() as u64
    }
}

impl Minter for TicketRegistry {
    fn mint(&self, owner: &Address, token_uri: &str, randomness: &Randomness) -> Result<u64, MintError> {
        if owner.is_zero() {
            return Err(MintError::Rejected("mint to the zero address".into()));
        }

        let mut state = self.state.lock();
        let item_id = state.tickets.len() as u64;
        if let Some(max_supply) = self.max_supply {
            if item_id >= max_supply {
                return Err(MintError::SupplyExhausted { max_supply });
            }
        }

        state.tickets.push(Ticket {
            item_id,
            owner: *owner,
            token_uri: token_uri.to_string(),
            randomness: *randomness,
        });
        *state.balances.entry(*owner).or_default() += 1;
        Ok(item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mints_sequential_ids_and_tracks_balances() {
        let registry = TicketRegistry::new(None);
        let alice = Address::new([1; 20]);
        let bob = Address::new([2; 20]);

        assert_eq!(registry.mint(&alice, "a", &[1; 32]), Ok(0));
        assert_eq!(registry.mint(&bob, "b", &[2; 32]), Ok(1));
        assert_eq!(registry.mint(&alice, "c", &[3; 32]), Ok(2));

        assert_eq!(registry.balance_of(&alice), 2);
        assert_eq!(registry.balance_of(&bob), 1);
        assert_eq!(registry.total_supply(), 3);

        let ticket = registry.get(1).unwrap();
        assert_eq!(ticket.owner, bob);
        assert_eq!(ticket.token_uri, "b");
        assert_eq!(ticket.randomness, [2; 32]);
        assert!(registry.get(3).is_none());
    }

    #[test]
    fn stops_at_max_supply() {
        let registry = TicketRegistry::new(Some(1));
        let owner = Address::new([1; 20]);

        registry.mint(&owner, "a", &[0; 32]).unwrap();
        assert_eq!(
            registry.mint(&owner, "b", &[0; 32]),
            Err(MintError::SupplyExhausted { max_supply: 1 })
        );
        assert_eq!(registry.total_supply(), 1);
    }

    #[test]
    fn rejects_zero_owner() {
        let registry = TicketRegistry::new(None);
        assert!(matches!(
            registry.mint(&Address::default(), "a", &[0; 32]),
            Err(MintError::Rejected(_))
        ));
    }

    #[test]
    fn serializes_randomness_as_hex() {
        let ticket = Ticket {
            item_id: 0,
            owner: Address::new([0xAB; 20]),
            token_uri: "uri".into(),
            randomness: [0x01; 32],
        };
        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["randomness"], format!("0x{}", "01".repeat(32)));
        assert_eq!(json["owner"], format!("0x{}", "ab".repeat(20)));
    }
}
