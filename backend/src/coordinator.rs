//! Local VRF coordinator: the oracle side of the Tickets flow.
//!
//! Charges the Tickets consumer a fee-token amount per request, derives a
//! unique request id, and hands a [`RandomnessRequested`] event to the
//! fulfiller once the claim that placed the request has been recorded.
//!
//! Requests are staged rather than sent immediately. A claim places its
//! request before it records the pending entry, so the event is released
//! with [`LocalCoordinator::publish`] only after `claim_ticket` succeeds.
//! Each staged request holds a reserved slot in the fulfiller channel; when
//! no slot is free the request fails instead of waiting.

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tickets::{Address, Amount, KeyHash, OracleError, RandomnessOracle, RequestId};
use tokio::sync::mpsc::{self, OwnedPermit, error::TrySendError};
use tracing::{debug, info, warn};

/// A randomness request waiting for fulfillment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomnessRequested {
    pub request_id: RequestId,
    pub consumer: Address,
    pub seed: [u8; 32],
    pub request_block: u64,
}

#[derive(Default)]
struct CoordinatorState {
    /// Fee-token balance of the consumer.
    balance: Amount,
    /// Per-consumer request nonce.
    nonce: u64,
    /// Advances once per accepted request.
    block: u64,
    staged: HashMap<RequestId, StagedRequest>,
}

struct StagedRequest {
    event: RandomnessRequested,
    fee: Amount,
    permit: OwnedPermit<RandomnessRequested>,
}

pub struct LocalCoordinator {
    address: Address,
    consumer: Address,
    key_hash: KeyHash,
    state: Mutex<CoordinatorState>,
    tx: mpsc::Sender<RandomnessRequested>,
}

impl LocalCoordinator {
    pub fn new(
        address: Address,
        consumer: Address,
        key_hash: KeyHash,
        tx: mpsc::Sender<RandomnessRequested>,
    ) -> Self {
        Self {
            address,
            consumer,
            key_hash,
            state: Mutex::new(CoordinatorState::default()),
            tx,
        }
    }

    /// The coordinator's own identity, used as the fulfillment caller.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Credit the consumer's fee-token balance. Returns the new balance.
    pub fn fund(&self, amount: Amount) -> Amount {
        let mut state = self.state.lock();
        let old_balance = state.balance;
        state.balance = old_balance.checked_add(amount).unwrap_or(Amount::from_wei(u128::MAX));
        info!(
            consumer = %self.consumer,
            old_balance = %old_balance,
            new_balance = %state.balance,
            "Consumer funded"
        );
        state.balance
    }

    pub fn balance(&self) -> Amount {
        self.state.lock().balance
    }

    /// Requests placed but not yet published.
    pub fn staged_count(&self) -> usize {
        self.state.lock().staged.len()
    }

    /// Release a staged request to the fulfiller.
    ///
    /// Returns `false` if nothing was staged under `request_id`. Never waits
    /// on the channel, since the slot was reserved when the request was placed.
    pub fn publish(&self, request_id: &RequestId) -> bool {
        let Some(staged) = self.state.lock().staged.remove(request_id) else {
            warn!(request_id = %request_id, "No staged request to publish");
            return false;
        };
        debug!(request_id = %request_id, block = staged.event.request_block, "Publishing request");
        staged.permit.send(staged.event);
        true
    }

    /// Withdraw a staged request whose claim was not recorded, refunding its
    /// fee and freeing its channel slot.
    pub fn cancel(&self, request_id: &RequestId) -> bool {
        let mut state = self.state.lock();
        let Some(staged) = state.staged.remove(request_id) else {
            return false;
        };
        state.balance = state
            .balance
            .checked_add(staged.fee)
            .unwrap_or(Amount::from_wei(u128::MAX));
        info!(
            request_id = %request_id,
            refund = %staged.fee,
            balance = %state.balance,
            "Staged request cancelled"
        );
        true
    }
}

/// `request_id = SHA-256(key_hash || consumer || nonce_le)`
fn derive_request_id(key_hash: &KeyHash, consumer: &Address, nonce: u64) -> RequestId {
    let mut hasher = Sha256::new();
    hasher.update(key_hash.as_bytes());
    hasher.update(consumer.as_bytes());
    hasher.update(nonce.to_le_bytes());
    RequestId::new(hasher.finalize().into())
}

/// `seed = SHA-256(request_id || consumer)`
fn derive_seed(request_id: &RequestId, consumer: &Address) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(request_id.as_bytes());
    hasher.update(consumer.as_bytes());
    hasher.finalize().into()
}

impl RandomnessOracle for LocalCoordinator {
    fn request_randomness(&self, key_hash: &KeyHash, fee: Amount) -> Result<RequestId, OracleError> {
        if *key_hash != self.key_hash {
            return Err(OracleError::UnregisteredKeyHash);
        }
        let permit = self.tx.clone().try_reserve_owned().map_err(|e| match e {
            TrySendError::Full(_) => OracleError::Unavailable("fulfiller queue is full".into()),
            TrySendError::Closed(_) => OracleError::Unavailable("fulfiller is not running".into()),
        })?;

        let mut state = self.state.lock();
        let balance = state.balance;
        let remaining = balance
            .checked_sub(fee)
            .ok_or(OracleError::InsufficientBalance { balance, fee })?;

        let request_id = derive_request_id(key_hash, &self.consumer, state.nonce);
        let request_block = state.block;

        state.balance = remaining;
        state.nonce += 1;
        state.block += 1;
        state.staged.insert(
            request_id,
            StagedRequest {
                event: RandomnessRequested {
                    request_id,
                    consumer: self.consumer,
                    seed: derive_seed(&request_id, &self.consumer),
                    request_block,
                },
                fee,
                permit,
            },
        );

        info!(
            request_id = %request_id,
            consumer = %self.consumer,
            fee = %fee,
            block = request_block,
            "RandomnessRequested"
        );
        Ok(request_id)
    }
}
