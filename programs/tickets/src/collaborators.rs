//! Interfaces to the systems the core talks to but does not own.

use crate::errors::{MintError, OracleError};
use crate::types::{Address, Amount, KeyHash, Randomness, RequestId};

/// The verifiable-randomness oracle (VRF coordinator).
///
/// A successful request returns the id the oracle will echo back when it
/// later delivers randomness through `fulfill_randomness`.
pub trait RandomnessOracle: Send + Sync {
    fn request_randomness(&self, key_hash: &KeyHash, fee: Amount) -> Result<RequestId, OracleError>;
}

/// The registry that issues and tracks ownership of tickets.
pub trait Minter: Send + Sync {
    /// Issue one item to `owner`, returning its id.
    fn mint(&self, owner: &Address, token_uri: &str, randomness: &Randomness) -> Result<u64, MintError>;
}

impl<T: RandomnessOracle + ?Sized> RandomnessOracle for std::sync::Arc<T> {
    fn request_randomness(&self, key_hash: &KeyHash, fee: Amount) -> Result<RequestId, OracleError> {
        (**self).request_randomness(key_hash, fee)
    }
}

impl<T: Minter + ?Sized> Minter for std::sync::Arc<T> {
    fn mint(&self, owner: &Address, token_uri: &str, randomness: &Randomness) -> Result<u64, MintError> {
        (**self).mint(owner, token_uri, randomness)
    }
}
