//! Tickets Backend
//!
//! Hosts the Tickets claim core together with a local VRF coordinator and
//! ticket registry. Runs two concurrent subsystems:
//!
//! - **Fulfiller**: consumes published randomness requests and delivers the
//!   VRF output back to the core as the coordinator.
//! - **HTTP server**: ticket claims (`POST /tickets/claim`), pending-claim
//!   and ticket lookups, liveness (`/health`), readiness (`/status`) and
//!   `/metrics`.

use actix_web::{App, HttpResponse, HttpServer, web};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tickets::{Address, Amount, Tickets, TicketsError};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod config;
mod coordinator;
mod fulfiller;
mod metrics;
mod registry;
mod vrf;

use config::AppConfig;
use coordinator::{LocalCoordinator, RandomnessRequested};
use metrics::Metrics;
use registry::TicketRegistry;

/// The Tickets core wired to the local coordinator and registry.
pub type TicketsService = Tickets<Arc<LocalCoordinator>, Arc<TicketRegistry>>;

/// Shared application state accessible from HTTP handlers.
struct AppState {
    tickets: Arc<TicketsService>,
    /// Number of fulfillments currently in-flight.
    pending_count: Arc<AtomicU64>,
    metrics: Arc<Metrics>,
}

#[derive(Debug, Deserialize)]
struct ClaimRequest {
    from: Address,
    metadata_uri: String,
    /// Attached payment in wei, as a decimal string.
    value: Amount,
}

/// Liveness probe: returns 200 if the process is running.
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

/// Readiness / status probe.
async fn status(data: web::Data<AppState>) -> HttpResponse {
    let pending = data.pending_count.load(Ordering::Relaxed);
    HttpResponse::Ok().json(serde_json::json!({
        "status": "running",
        "pending_claims": data.tickets.pending_count(),
        "pending_fulfillments": pending,
        "minted": data.tickets.minter().total_supply(),
    }))
}

async fn metrics(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.metrics.to_json())
}

/// Claim a ticket. On success the randomness request is released to the
/// fulfiller and its id returned.
async fn claim_ticket(data: web::Data<AppState>, body: web::Json<ClaimRequest>) -> HttpResponse {
    let ClaimRequest {
        from,
        metadata_uri,
        value,
    } = body.into_inner();

    if from.is_zero() {
        data.metrics.record_rejected_claim();
        warn!("Claim from the zero address rejected");
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "claimant must not be the zero address" }));
    }

    match data.tickets.claim_ticket(from, metadata_uri, value) {
        Ok(request_id) => {
            data.metrics.record_claim();
            if !data.tickets.oracle().publish(&request_id) {
                error!(request_id = %request_id, "Claim recorded but request not delivered to fulfiller");
            }
            HttpResponse::Ok().json(serde_json::json!({ "request_id": request_id }))
        }
        Err(e) => {
            if let TicketsError::DuplicateRequestId(request_id) = &e {
                data.tickets.oracle().cancel(request_id);
            }
            data.metrics.record_rejected_claim();
            warn!(claimant = %from, error = %e, "Claim rejected");
            error_response(&e)
        }
    }
}

async fn pending_claims(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.tickets.pending_requests())
}

async fn ticket(data: web::Data<AppState>, path: web::Path<u64>) -> HttpResponse {
    match data.tickets.minter().get(path.into_inner()) {
        Some(ticket) => HttpResponse::Ok().json(ticket),
        None => HttpResponse::NotFound().json(serde_json::json!({"error": "ticket not found"})),
    }
}

fn error_response(error: &TicketsError) -> HttpResponse {
    let body = serde_json::json!({ "error": error.to_string() });
    match error {
        TicketsError::WrongPrice { .. } => HttpResponse::BadRequest().json(body),
        TicketsError::OracleRequestFailed(_) => HttpResponse::BadGateway().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/status", web::get().to(status))
        .route("/metrics", web::get().to(metrics))
        .route("/tickets/claim", web::post().to(claim_ticket))
        .route("/tickets/pending", web::get().to(pending_claims))
        .route("/tickets/{item_id}", web::get().to(ticket));
}

/// Wire the coordinator, registry and Tickets core from configuration.
fn build_state(config: &AppConfig) -> Result<(AppState, mpsc::Receiver<RandomnessRequested>)> {
    let (tx, rx) = mpsc::channel(config.fulfillment_queue_capacity);

    let coordinator = Arc::new(LocalCoordinator::new(
        config.vrf_coordinator,
        config.tickets_address,
        config.key_hash,
        tx,
    ));
    coordinator.fund(config.link_balance);

    let registry = Arc::new(TicketRegistry::new(config.max_supply));
    let tickets = Arc::new(Tickets::new(config.tickets_config()?, coordinator, registry));

    let state = AppState {
        tickets,
        pending_count: Arc::new(AtomicU64::new(0)),
        metrics: Arc::new(Metrics::new()),
    };
    Ok((state, rx))
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,actix_web=warn,actix_server=warn")),
        )
        .with_target(true)
        .with_ansi(true)
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    info!(
        tickets = %config.tickets_address,
        coordinator = %config.vrf_coordinator,
        link = %config.link_token,
        key_hash = %config.key_hash,
        "Starting Tickets backend"
    );
    info!(
        price = %config.ticket_price,
        fee = %config.vrf_fee,
        base_uri = %config.base_uri,
        "Ticket terms configured"
    );

    let (state, rx) = build_state(&config)?;

    // Background: deliver randomness for published requests.
    tokio::spawn(fulfiller::run_fulfiller(
        config.clone(),
        state.tickets.clone(),
        rx,
        state.pending_count.clone(),
        state.metrics.clone(),
    ));

    let state = web::Data::new(state);
    let addr = ("0.0.0.0", config.http_port);

    info!(port = config.http_port, "Starting HTTP server");

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind(addr)
        .with_context(|| format!("failed to bind port {}", config.http_port))?
        .run()
        .await
        .context("HTTP server failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use tickets::PendingRequest;

    const TICKET_URI: &str = "https://team3d.io/ticket.png";

    fn test_config() -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "HMAC_SECRET" => Some("test-secret".into()),
            _ => None,
        })
        .unwrap()
    }

    fn claim_body(from: &str, value: &str) -> serde_json::Value {
        serde_json::json!({ "from": from, "metadata_uri": TICKET_URI, "value": value })
    }

    #[actix_web::test]
    async fn overpaying_claim_is_rejected() {
        let (state, _rx) = build_state(&test_config()).unwrap();
        let state = web::Data::new(state);
        let app = test::init_service(App::new().app_data(state.clone()).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/tickets/claim")
            .set_json(claim_body(
                "0x0101010101010101010101010101010101010101",
                "1000000000000000000",
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Tickets: Tickets go for 0.1 ETH each.");
        assert_eq!(state.tickets.pending_count(), 0);
    }

    #[actix_web::test]
    async fn exact_price_claims_are_listed_as_pending() {
        // The receiver is held but never drained, so claims stay pending.
        let (state, _rx) = build_state(&test_config()).unwrap();
        let app =
            test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let callers = [
            "0x0101010101010101010101010101010101010101",
            "0x0202020202020202020202020202020202020202",
            "0x0303030303030303030303030303030303030303",
        ];
        for caller in callers {
            let req = test::TestRequest::post()
                .uri("/tickets/claim")
                .set_json(claim_body(caller, "100000000000000000"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get().uri("/tickets/pending").to_request();
        let pending: Vec<PendingRequest> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(pending.len(), 3);
        let mut claimants: Vec<String> = pending.iter().map(|p| p.claimant.to_string()).collect();
        claimants.sort();
        assert_eq!(claimants, callers);
        assert!(pending.iter().all(|p| p.metadata_uri == TICKET_URI));
    }

    #[actix_web::test]
    async fn malformed_claim_is_a_client_error() {
        let (state, _rx) = build_state(&test_config()).unwrap();
        let app =
            test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/tickets/claim")
            .set_json(claim_body("0x1234", "100000000000000000"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn zero_address_claim_is_rejected() {
        let (state, _rx) = build_state(&test_config()).unwrap();
        let state = web::Data::new(state);
        let app = test::init_service(App::new().app_data(state.clone()).configure(routes)).await;
        let balance = state.tickets.oracle().balance();

        let req = test::TestRequest::post()
            .uri("/tickets/claim")
            .set_json(claim_body(
                "0x0000000000000000000000000000000000000000",
                "100000000000000000",
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert_eq!(state.tickets.pending_count(), 0);
        assert_eq!(state.tickets.oracle().balance(), balance);
        assert_eq!(state.metrics.claims_rejected.load(Ordering::Relaxed), 1);
    }

    #[actix_web::test]
    async fn claim_fails_fast_when_fulfiller_is_backed_up() {
        let config = AppConfig::from_lookup(|key| match key {
            "HMAC_SECRET" => Some("test-secret".into()),
            "FULFILLMENT_QUEUE_CAPACITY" => Some("1".into()),
            _ => None,
        })
        .unwrap();
        // The receiver is never drained, so the first claim fills the queue.
        let (state, _rx) = build_state(&config).unwrap();
        let state = web::Data::new(state);
        let app = test::init_service(App::new().app_data(state.clone()).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/tickets/claim")
            .set_json(claim_body(
                "0x0101010101010101010101010101010101010101",
                "100000000000000000",
            ))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let balance = state.tickets.oracle().balance();

        let req = test::TestRequest::post()
            .uri("/tickets/claim")
            .set_json(claim_body(
                "0x0202020202020202020202020202020202020202",
                "100000000000000000",
            ))
            .to_request();
        let resp = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            test::call_service(&app, req),
        )
        .await
        .expect("claim must not wait on the fulfiller");
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        assert_eq!(state.tickets.pending_count(), 1);
        assert_eq!(state.tickets.oracle().balance(), balance);
    }

    #[actix_web::test]
    async fn unknown_ticket_is_not_found() {
        let (state, _rx) = build_state(&test_config()).unwrap();
        let app =
            test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::get().uri("/tickets/7").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn status_reports_counts() {
        let (state, _rx) = build_state(&test_config()).unwrap();
        let app =
            test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::get().uri("/status").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "running");
        assert_eq!(body["pending_claims"], 0);
        assert_eq!(body["minted"], 0);
    }
}
