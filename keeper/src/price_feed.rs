//! File-backed price feed
//!
//! The keeper polls a JSON document once per epoch and forwards it to
//! the engine's settable oracle. A missing or malformed document is
//! reported as an invalid reading, which the regulator treats as a
//! neutral epoch.

use anyhow::{Context, Result};
use dollar_engine::OracleReading;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PriceDocument {
    pub numerator: u64,
    pub denominator: u64,
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

/// Read the current price document from disk
pub fn read_price(path: &str) -> Result<PriceDocument> {
    let raw = std::fs::read_to_string(path)
        .context(format!("Failed to read price feed: {}", path))?;
    let doc: PriceDocument =
        serde_json::from_str(&raw).context("Failed to parse price feed JSON")?;
    Ok(doc)
}

/// Read the feed, degrading to an invalid reading on any failure
pub fn read_or_invalid(path: &str) -> OracleReading {
    match read_price(path) {
        Ok(doc) => OracleReading {
            numerator: doc.numerator as u128,
            denominator: doc.denominator as u128,
            valid: doc.valid && doc.denominator != 0,
        },
        Err(e) => {
            log::warn!("Price feed unavailable, treating epoch as neutral: {:#}", e);
            OracleReading::invalid()
        }
    }
}
