//! Keeper configuration

use anyhow::{Context, Result};
use dollar_engine::{Address, RegulatorParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seconds between epoch steps
    pub epoch_interval_secs: u64,

    /// JSON price feed file polled once per epoch
    pub price_feed_path: String,

    /// JSON snapshot written after every epoch
    pub snapshot_path: String,

    /// Token balance minted to the DAO address at startup when the
    /// engine starts from an empty ledger
    pub bootstrap_supply: u64,

    /// Monetary-policy parameters passed through to the engine
    pub params: RegulatorParams,
}

impl Config {
    /// Load configuration from TOML file
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("KEEPER_CONFIG").unwrap_or_else(|_| "keeper-config.toml".to_string());

        let config_str = std::fs::read_to_string(&config_path)
            .context(format!("Failed to read config file: {}", config_path))?;

        let config: Config = toml::from_str(&config_str).context("Failed to parse config TOML")?;

        Ok(config)
    }

    /// Create default configuration for a local run
    pub fn default_local() -> Self {
        Self {
            epoch_interval_secs: 60,
            price_feed_path: "price-feed.json".to_string(),
            snapshot_path: "engine-snapshot.json".to_string(),
            bootstrap_supply: 1_000_000,
            params: RegulatorParams {
                pool_address: Address::from_seed(1),
                dao_address: Address::from_seed(2),
                ..RegulatorParams::default()
            },
        }
    }

    /// Write default config to file
    pub fn write_default(path: &str) -> Result<()> {
        let config = Self::default_local();
        let toml_str = toml::to_string_pretty(&config).context("Failed to serialize config")?;

        std::fs::write(path, toml_str).context(format!("Failed to write config to {}", path))?;

        log::info!("Created default config at {}", path);
        Ok(())
    }
}
