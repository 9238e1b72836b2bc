//! Application configuration loaded from environment variables.
//!
//! Required: `HMAC_SECRET`
//! Optional: `VRF_COORDINATOR`, `LINK_TOKEN`, `KEY_HASH`, `VRF_FEE`,
//!           `BASE_URI`, `TICKET_PRICE`, `TICKETS_ADDRESS`, `LINK_BALANCE`,
//!           `HTTP_PORT`, `FULFILLMENT_CONCURRENCY`, `FULFILLMENT_DELAY_MS`,
//!           `FULFILLMENT_QUEUE_CAPACITY`, `MAX_SUPPLY`
//!
//! Amounts are decimal base-unit (wei) strings.

use anyhow::{Context, Result};
use std::str::FromStr;
use tickets::{Address, Amount, KeyHash, TicketsConfig, TICKET_PRICE};

const DEFAULT_VRF_COORDINATOR: &str = "0xdD3782915140c8f3b190B5D67eAc6dc5760C46E9";
const DEFAULT_LINK_TOKEN: &str = "0xa36085F69e2889c224210F603D836748e7dC0088";
const DEFAULT_KEY_HASH: &str =
    "0x6c3699283bda56ad74f6b855546325b68d482e983852a7a82979cc4807b641f4";
const DEFAULT_TICKETS_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
/// 0.1 LINK per request.
const DEFAULT_VRF_FEE: Amount = Amount::from_wei(100_000_000_000_000_000);
/// 10 LINK of initial fee-token funding.
const DEFAULT_LINK_BALANCE: Amount = Amount::from_wei(10_000_000_000_000_000_000);

/// Application configuration for the Tickets backend.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Identity of the Tickets contract as a consumer of the coordinator.
    pub tickets_address: Address,
    /// Address of the VRF coordinator; the only trusted fulfillment caller.
    pub vrf_coordinator: Address,
    /// Fee token the coordinator charges in.
    pub link_token: Address,
    /// Key hash registered with the coordinator.
    pub key_hash: KeyHash,
    /// Fee-token amount charged per randomness request.
    pub vrf_fee: Amount,
    /// Exact payment required per claim.
    pub ticket_price: Amount,
    /// Prefix applied to minted token URIs.
    pub base_uri: String,
    /// Fee-token balance credited to the Tickets consumer at startup.
    pub link_balance: Amount,
    /// Secret key for HMAC-SHA256 randomness generation.
    pub hmac_secret: Vec<u8>,
    /// HTTP server port.
    pub http_port: u16,
    /// Maximum concurrent fulfillment tasks.
    pub fulfillment_concurrency: usize,
    /// Artificial delay before each fulfillment, in milliseconds.
    pub fulfillment_delay_ms: u64,
    /// Requests that may wait for the fulfiller before new claims are refused.
    pub fulfillment_queue_capacity: usize,
    /// Cap on minted tickets; `None` is unlimited.
    pub max_supply: Option<u64>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let hmac_secret = var("HMAC_SECRET")
            .context("HMAC_SECRET env var must be set")?
            .into_bytes();

        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let tickets_address: Address =
            parse_hex("TICKETS_ADDRESS", &or_default("TICKETS_ADDRESS", DEFAULT_TICKETS_ADDRESS))?;
        let vrf_coordinator: Address =
            parse_hex("VRF_COORDINATOR", &or_default("VRF_COORDINATOR", DEFAULT_VRF_COORDINATOR))?;
        let link_token: Address = parse_hex("LINK_TOKEN", &or_default("LINK_TOKEN", DEFAULT_LINK_TOKEN))?;
        let key_hash: KeyHash = parse_hex("KEY_HASH", &or_default("KEY_HASH", DEFAULT_KEY_HASH))?;

        let vrf_fee = parse_amount(&var, "VRF_FEE", DEFAULT_VRF_FEE)?;
        let ticket_price = parse_amount(&var, "TICKET_PRICE", TICKET_PRICE)?;
        let link_balance = parse_amount(&var, "LINK_BALANCE", DEFAULT_LINK_BALANCE)?;

        let base_uri = var("BASE_URI").unwrap_or_default();

        let http_port = var("HTTP_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let fulfillment_concurrency = var("FULFILLMENT_CONCURRENCY")
            .and_then(|v| v.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(4);

        let fulfillment_delay_ms = var("FULFILLMENT_DELAY_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let fulfillment_queue_capacity = var("FULFILLMENT_QUEUE_CAPACITY")
            .and_then(|v| v.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(256);

        let max_supply = match var("MAX_SUPPLY") {
            Some(v) => Some(
                v.parse()
                    .with_context(|| format!("invalid MAX_SUPPLY: {v}"))?,
            ),
            None => None,
        };

        Ok(Self {
            tickets_address,
            vrf_coordinator,
            link_token,
            key_hash,
            vrf_fee,
            ticket_price,
            base_uri,
            link_balance,
            hmac_secret,
            http_port,
            fulfillment_concurrency,
            fulfillment_delay_ms,
            fulfillment_queue_capacity,
            max_supply,
        })
    }

    /// Construction parameters for the Tickets core.
    pub fn tickets_config(&self) -> Result<TicketsConfig> {
        let config = TicketsConfig::new(
            self.vrf_coordinator,
            self.link_token,
            self.key_hash,
            self.vrf_fee,
            self.base_uri.clone(),
        )
        .context("invalid Tickets configuration")?;
        Ok(config.with_ticket_price(self.ticket_price))
    }
}

fn parse_hex<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("invalid {key}: {value}"))
}

fn parse_amount(var: &impl Fn(&str) -> Option<String>, key: &str, default: Amount) -> Result<Amount> {
    match var(key) {
        Some(v) => v
            .parse()
            .with_context(|| format!("invalid {key}: {v}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_match_deployment() {
        let config = load(&[("HMAC_SECRET", "s3cret")]).unwrap();
        assert_eq!(
            config.vrf_coordinator.to_string(),
            DEFAULT_VRF_COORDINATOR.to_lowercase()
        );
        assert_eq!(config.vrf_fee, DEFAULT_VRF_FEE);
        assert_eq!(config.ticket_price, TICKET_PRICE);
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.fulfillment_concurrency, 4);
        assert_eq!(config.fulfillment_queue_capacity, 256);
        assert_eq!(config.max_supply, None);
        assert_eq!(config.hmac_secret, b"s3cret");
    }

    #[test]
    fn hmac_secret_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("HMAC_SECRET"));
    }

    #[test]
    fn rejects_malformed_address() {
        let err = load(&[("HMAC_SECRET", "x"), ("VRF_COORDINATOR", "0x1234")]).unwrap_err();
        assert!(err.to_string().contains("VRF_COORDINATOR"));
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("HMAC_SECRET", "x"),
            ("TICKET_PRICE", "5"),
            ("BASE_URI", "ipfs://"),
            ("MAX_SUPPLY", "3"),
            ("FULFILLMENT_CONCURRENCY", "0"),
            ("FULFILLMENT_QUEUE_CAPACITY", "0"),
        ])
        .unwrap();
        assert_eq!(config.ticket_price, Amount::from_wei(5));
        assert_eq!(config.max_supply, Some(3));
        assert_eq!(config.fulfillment_concurrency, 4);
        assert_eq!(config.fulfillment_queue_capacity, 256);

        let tickets = config.tickets_config().unwrap();
        assert_eq!(tickets.ticket_price, Amount::from_wei(5));
        assert_eq!(tickets.base_uri, "ipfs://");
    }
}
