//! Dollar epoch keeper
//!
//! Off-chain driver that advances the monetary-policy engine once per
//! configured interval: polls the price feed, runs the regulation
//! step, settles any open coupon auction, and writes a JSON snapshot
//! of totals and events.

mod config;
mod price_feed;

use anyhow::{Context, Result};
use config::Config;
use dollar_engine::{Event, InMemoryToken, Regulator, SettableOracle, TokenLedger};
use serde::Serialize;
use std::time::Duration;
use tokio::time;

#[derive(Debug, Serialize)]
struct Snapshot<'a> {
    epoch: u64,
    total_bonded: u64,
    total_staged: u64,
    total_supply: u64,
    total_debt: u64,
    total_coupons: u64,
    total_redeemable: u64,
    token_supply: u64,
    events: &'a [Event],
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Dollar epoch keeper");

    // Load configuration
    let config = Config::load().unwrap_or_else(|_| {
        log::warn!("Failed to load config, using default local config");
        Config::default_local()
    });

    log::info!("Price feed: {}", config.price_feed_path);
    log::info!("Epoch interval: {}s", config.epoch_interval_secs);

    let mut engine = bootstrap_engine(&config)?;

    log::info!("Keeper started. Regulating once per interval...");

    // Main epoch loop
    let mut interval = time::interval(Duration::from_secs(config.epoch_interval_secs));

    loop {
        interval.tick().await;

        if let Err(e) = run_epoch(&mut engine, &config) {
            log::error!("Epoch step failed: {:#}", e);
        }
    }
}

/// Construct the engine and seed the bootstrap supply as bonded
fn bootstrap_engine(config: &Config) -> Result<Regulator<SettableOracle, InMemoryToken>> {
    let mut engine = Regulator::new(
        SettableOracle::new(),
        InMemoryToken::new(),
        config.params.clone(),
    );

    if config.bootstrap_supply > 0 {
        let dao = config.params.dao_address;
        engine
            .token_mut()
            .mint(dao, config.bootstrap_supply)
            .map_err(|e| anyhow::anyhow!("bootstrap mint failed: {}", e))?;
        engine
            .stage(dao, config.bootstrap_supply)
            .and_then(|_| engine.bond(config.bootstrap_supply))
            .map_err(|e| anyhow::anyhow!("bootstrap bonding failed: {}", e))?;
        log::info!("Bootstrapped {} bonded supply", config.bootstrap_supply);
    }

    Ok(engine)
}

/// One keeper iteration: feed the oracle, step, settle, snapshot
fn run_epoch(
    engine: &mut Regulator<SettableOracle, InMemoryToken>,
    config: &Config,
) -> Result<()> {
    let reading = price_feed::read_or_invalid(&config.price_feed_path);
    engine
        .oracle_mut()
        .set(reading.numerator, reading.denominator, reading.valid);

    let event = engine
        .step()
        .map_err(|e| anyhow::anyhow!("regulation step rejected: {}", e))?;

    match &event {
        Event::SupplyIncrease { epoch, new_redeemable, new_bonded, .. } => {
            log::info!(
                "epoch {}: expansion (redeemable +{}, bonded remainder {})",
                epoch, new_redeemable, new_bonded
            );
        }
        Event::SupplyDecrease { epoch, new_debt, .. } => {
            log::info!("epoch {}: contraction (debt +{})", epoch, new_debt);
        }
        Event::SupplyNeutral { epoch } => {
            log::info!("epoch {}: neutral", epoch);
        }
    }

    // Settlement on a terminal auction is a defined no-op
    match engine.settle_coupon_auction() {
        Ok(true) => log::info!("epoch {}: settled coupon auction", engine.epoch()),
        Ok(false) => log::debug!("no open auction to settle"),
        Err(e) => log::error!("auction settlement failed: {}", e),
    }

    write_snapshot(engine, &config.snapshot_path)
}

/// Persist totals and the event log as JSON
fn write_snapshot(
    engine: &Regulator<SettableOracle, InMemoryToken>,
    path: &str,
) -> Result<()> {
    let snapshot = Snapshot {
        epoch: engine.epoch(),
        total_bonded: engine.total_bonded(),
        total_staged: engine.total_staged(),
        total_supply: engine.total_supply(),
        total_debt: engine.total_debt(),
        total_coupons: engine.total_coupons(),
        total_redeemable: engine.total_redeemable(),
        token_supply: engine.token().total_supply(),
        events: engine.events().all(),
    };

    let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
    std::fs::write(path, json).context(format!("Failed to write snapshot to {}", path))?;
    Ok(())
}
