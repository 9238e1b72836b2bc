//! Fulfillment engine: consumes randomness request events and delivers the
//! VRF output to the Tickets core on behalf of the coordinator.
//!
//! Each delivery:
//! 1. Computes the HMAC-SHA256 randomness for the request.
//! 2. Calls `fulfill_randomness` as the coordinator, which resolves the
//!    pending claim and mints the ticket.
//!
//! Deliveries are never retried. A failed mint has already consumed its
//! claim, so it is counted and logged as terminal.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tickets::{ClaimOutcome, TicketsError};
use tokio::sync::{Semaphore, mpsc};
use tracing::{error, info, instrument, warn};

use crate::TicketsService;
use crate::config::AppConfig;
use crate::coordinator::RandomnessRequested;
use crate::metrics::Metrics;
use crate::vrf::compute_randomness;

/// Main fulfiller loop.
pub async fn run_fulfiller(
    config: AppConfig,
    tickets: Arc<TicketsService>,
    mut rx: mpsc::Receiver<RandomnessRequested>,
    pending_count: Arc<AtomicU64>,
    metrics: Arc<Metrics>,
) {
    let semaphore = Arc::new(Semaphore::new(config.fulfillment_concurrency));
    let delay = Duration::from_millis(config.fulfillment_delay_ms);

    while let Some(event) = rx.recv().await {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => {
                error!("Semaphore closed, stopping fulfiller");
                break;
            }
        };
        pending_count.fetch_add(1, Ordering::Relaxed);
        let tickets = tickets.clone();
        let cfg = config.clone();
        let pending = pending_count.clone();
        let met = metrics.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let start = Instant::now();

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            info!(
                request_id = %event.request_id,
                consumer = %event.consumer,
                block = event.request_block,
                "Fulfilling randomness request"
            );

            match fulfill_request(&tickets, &cfg, &event) {
                Ok(outcome) => {
                    let latency_ms = start.elapsed().as_millis() as u64;
                    met.record_fulfillment(latency_ms);
                    info!(
                        request_id = %event.request_id,
                        claimant = %outcome.claimant,
                        latency_ms,
                        "Fulfilled successfully"
                    );
                }
                Err(e) => handle_fulfillment_error(&event, e, &met),
            }

            pending.fetch_sub(1, Ordering::Relaxed);
        });
    }

    info!("Fulfiller channel closed, shutting down");
}

fn handle_fulfillment_error(event: &RandomnessRequested, error: TicketsError, metrics: &Metrics) {
    match error {
        TicketsError::UnknownRequestId(_) | TicketsError::NotOracle { .. } => {
            metrics.record_rejected_callback();
            warn!(
                request_id = %event.request_id,
                reason = %error,
                "Callback rejected (non-retryable)"
            );
        }
        TicketsError::MintFailed { ref outcome, .. } => {
            metrics.record_failure();
            error!(
                request_id = %event.request_id,
                claimant = %outcome.claimant,
                error = %error,
                "Claim consumed but ticket not minted"
            );
        }
        other => {
            metrics.record_failure();
            error!(
                request_id = %event.request_id,
                error = %other,
                "Failed to fulfill"
            );
        }
    }
}

/// Compute the VRF output and deliver it as the coordinator.
#[instrument(skip_all, fields(request_id = %event.request_id))]
fn fulfill_request(
    tickets: &TicketsService,
    config: &AppConfig,
    event: &RandomnessRequested,
) -> Result<ClaimOutcome, TicketsError> {
    let randomness = compute_randomness(
        &config.hmac_secret,
        &event.seed,
        event.request_block,
        &event.request_id,
    );

    tickets.fulfill_randomness(tickets.oracle().address(), event.request_id, randomness)
}
