//! Runtime configuration.
//!
//! Read once from `data-*` attributes on the `#app` root element. Missing or
//! unparsable attributes fall back to the defaults below; unparsable ones are
//! reported back so they can be logged once logging is up.

use std::str::FromStr;

use tracing::Level;
use wp_api_types::Address;
use wp_chain_eip1193::DEFAULT_RECEIPT_POLL_MS;
use wp_wave_core::portal::DEFAULT_CONTRACT;

pub const ROOT_ID: &str = "app";
pub const DEFAULT_EVENT_POLL_MS: u32 = 4000;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub contract: Address,
    pub receipt_poll_ms: u32,
    pub event_poll_ms: u32,
    pub log_level: Level,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            contract: default_contract(),
            receipt_poll_ms: DEFAULT_RECEIPT_POLL_MS,
            event_poll_ms: DEFAULT_EVENT_POLL_MS,
            log_level: Level::INFO,
        }
    }
}

fn default_contract() -> Address {
    // Constant is covered by wp-wave-core's tests.
    Address::parse(DEFAULT_CONTRACT).unwrap_or_else(|_| Address::from_bytes([0; 20]))
}

impl AppConfig {
    /// Read from the page. Returns the config plus any rejected attributes.
    pub fn load() -> (Self, Vec<String>) {
        let root = crate::dom::by_id(ROOT_ID);
        Self::from_attrs(|name| root.as_ref().and_then(|el| el.get_attribute(name)))
    }

    pub fn from_attrs(get: impl Fn(&str) -> Option<String>) -> (Self, Vec<String>) {
        let mut cfg = Self::default();
        let mut rejected = Vec::new();

        if let Some(raw) = get("data-contract") {
            match Address::parse(raw.trim()) {
                Ok(addr) => cfg.contract = addr,
                Err(e) => rejected.push(format!("data-contract={raw:?}: {e}")),
            }
        }
        if let Some(ms) = interval(&get, "data-receipt-poll-ms", &mut rejected) {
            cfg.receipt_poll_ms = ms;
        }
        if let Some(ms) = interval(&get, "data-event-poll-ms", &mut rejected) {
            cfg.event_poll_ms = ms;
        }
        if let Some(raw) = get("data-log-level") {
            match Level::from_str(raw.trim()) {
                Ok(level) => cfg.log_level = level,
                Err(_) => rejected.push(format!("data-log-level={raw:?}: unknown level")),
            }
        }
        (cfg, rejected)
    }
}

fn interval(
    get: &impl Fn(&str) -> Option<String>,
    name: &str,
    rejected: &mut Vec<String>,
) -> Option<u32> {
    let raw = get(name)?;
    match raw.trim().parse::<u32>() {
        Ok(0) => {
            rejected.push(format!("{name}={raw:?}: must be positive"));
            None
        }
        Ok(ms) => Some(ms),
        Err(e) => {
            rejected.push(format!("{name}={raw:?}: {e}"));
            None
        }
    }
}
