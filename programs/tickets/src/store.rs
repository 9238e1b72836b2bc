//! Correlation table between oracle request ids and pending claims.
//!
//! Every operation runs under one lock, so a `take` is a single indivisible
//! read-and-remove relative to any other `put` or `take`. Duplicate or
//! concurrent callbacks for the same id therefore see exactly one success.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::errors::TicketsError;
use crate::state::PendingRequest;
use crate::types::RequestId;

#[derive(Debug, Default)]
pub struct PendingRequestStore {
    inner: Mutex<HashMap<RequestId, PendingRequest>>,
}

impl PendingRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pending request. Never overwrites an existing entry.
    pub fn put(&self, request_id: RequestId, context: PendingRequest) -> Result<(), TicketsError> {
        let mut map = self.inner.lock();
        if map.contains_key(&request_id) {
            return Err(TicketsError::DuplicateRequestId(request_id));
        }
        map.insert(request_id, context);
        Ok(())
    }

    /// Remove and return the pending request for `request_id`.
    pub fn take(&self, request_id: &RequestId) -> Result<PendingRequest, TicketsError> {
        self.inner
            .lock()
            .remove(request_id)
            .ok_or(TicketsError::UnknownRequestId(*request_id))
    }

    pub fn contains(&self, request_id: &RequestId) -> bool {
        self.inner.lock().contains_key(request_id)
    }

    /// Read-only copy of one entry.
    pub fn get(&self, request_id: &RequestId) -> Option<PendingRequest> {
        self.inner.lock().get(request_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// All pending requests, oldest first (ties broken by id).
    pub fn snapshot(&self) -> Vec<PendingRequest> {
        let mut all: Vec<PendingRequest> = self.inner.lock().values().cloned().collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.request_id.cmp(&b.request_id))
        });
        all
    }
}
