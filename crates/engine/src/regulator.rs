//! Epoch-driven supply regulation
//!
//! The regulator is a pure synchronous state machine driven by an
//! external epoch clock: each `step()` advances the epoch by exactly
//! one, reads the oracle once, and either expands supply, issues debt,
//! or does nothing. Steps are plan-then-commit: all checked arithmetic
//! runs before any state is touched, internal ledger state is updated
//! before any token-ledger call, and a failed plan aborts the step
//! with no partial commit.
//!
//! Invariant at all observable points:
//! `total_supply == total_bonded + total_staged`.

use std::collections::BTreeMap;

use crate::address::Address;
use crate::auction::{AuctionStats, AuctionStatus, Bid, CouponAuction};
use crate::debt::DebtLedger;
use crate::error::EngineError;
use crate::events::{Event, EventLog};
use crate::math;
use crate::oracle::Oracle;
use crate::params::RegulatorParams;
use crate::token::TokenLedger;

/// Discrete regulation period, strictly monotonic
pub type Epoch = u64;

#[derive(Debug)]
pub struct Regulator<O: Oracle, T: TokenLedger> {
    oracle: O,
    token: T,
    params: RegulatorParams,
    epoch: Epoch,
    total_bonded: u64,
    total_staged: u64,
    total_supply: u64,
    debt: DebtLedger,
    auctions: BTreeMap<Epoch, CouponAuction>,
    latest_auction: Option<Epoch>,
    events: EventLog,
}

impl<O: Oracle, T: TokenLedger> Regulator<O, T> {
    pub fn new(oracle: O, token: T, params: RegulatorParams) -> Self {
        Self {
            oracle,
            token,
            params,
            epoch: 0,
            total_bonded: 0,
            total_staged: 0,
            total_supply: 0,
            debt: DebtLedger::new(),
            auctions: BTreeMap::new(),
            latest_auction: None,
            events: EventLog::new(),
        }
    }

    // ------------------------------------------------------------------
    // Query surface
    // ------------------------------------------------------------------

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn total_bonded(&self) -> u64 {
        self.total_bonded
    }

    pub fn total_staged(&self) -> u64 {
        self.total_staged
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn total_debt(&self) -> u64 {
        self.debt.total_debt()
    }

    pub fn total_coupons(&self) -> u64 {
        self.debt.total_coupons()
    }

    pub fn total_redeemable(&self) -> u64 {
        self.debt.total_redeemable()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn params(&self) -> &RegulatorParams {
        &self.params
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    pub fn debt_ledger(&self) -> &DebtLedger {
        &self.debt
    }

    /// Direct ledger access for hosts restoring persisted state and
    /// for test fixtures
    pub fn debt_ledger_mut(&mut self) -> &mut DebtLedger {
        &mut self.debt
    }

    // ------------------------------------------------------------------
    // Epoch step
    // ------------------------------------------------------------------

    /// Run one regulation step. The epoch advances by exactly one
    /// before the oracle is read; an invalid reading or an at-peg
    /// price is a neutral outcome, not an error.
    pub fn step(&mut self) -> Result<Event, EngineError> {
        let epoch = self.epoch.checked_add(1).ok_or(EngineError::ArithmeticFault)?;
        self.epoch = epoch;

        if self.params.coupon_expiry_delay > 0 {
            let purged = self.debt.expire_coupons(epoch, self.params.coupon_expiry_delay);
            if purged > 0 {
                log::debug!("epoch {}: expired {} coupons", epoch, purged);
            }
        }

        let reading = self.oracle.read();
        if !reading.valid {
            return Ok(self.record(Event::SupplyNeutral { epoch }));
        }

        let price = reading.price()?;
        let peg = self.params.peg as u128;
        if price > peg {
            self.expand(epoch, price)
        } else if price < peg {
            self.contract(epoch, price)
        } else {
            Ok(self.record(Event::SupplyNeutral { epoch }))
        }
    }

    /// Expansion path: mint `delta = min(raw, cap)` where `raw` scales
    /// total supply by the peg deviation and `cap` bounds single-epoch
    /// dilution to a fraction of bonded. Allocation order: coupon
    /// refill first, then the remainder split pool/bonded.
    fn expand(&mut self, epoch: Epoch, price: u128) -> Result<Event, EngineError> {
        let peg = self.params.peg as u128;

        let delta = if self.total_supply == 0 {
            0
        } else {
            let raw = math::mul_div(self.total_supply, price - peg, peg)?;
            let cap = math::apply_bps(self.total_bonded, self.params.expansion_cap_bps)?;
            raw.min(cap)
        };

        if delta == 0 {
            // Zero-magnitude directional outcome, no mutation
            return Ok(self.record(Event::SupplyIncrease {
                epoch,
                price,
                new_redeemable: 0,
                less_debt: 0,
                new_bonded: 0,
            }));
        }

        // Plan: every checked computation happens before any mutation
        let shortfall = self.debt.coupon_shortfall();
        let new_redeemable =
            math::apply_bps(delta, self.params.coupon_refill_bps)?.min(shortfall);
        let remainder = delta - new_redeemable;
        let pool_cut = math::apply_bps(remainder, self.params.pool_incentive_bps)?;
        let bonded_cut = remainder - pool_cut;

        let next_bonded = math::add(self.total_bonded, bonded_cut)?;
        let next_supply = math::add(self.total_supply, bonded_cut)?;
        // The collaborator mint must also be representable
        math::add(self.token.total_supply(), delta)?;

        // Commit internal ledger state
        self.debt.refill_redeemable(new_redeemable)?;
        self.total_bonded = next_bonded;
        self.total_supply = next_supply;

        // External token calls strictly after internal state
        self.token.mint(self.params.dao_address, delta - pool_cut)?;
        self.token.mint(self.params.pool_address, pool_cut)?;

        log::debug!(
            "epoch {}: expansion delta {} (redeemable {}, pool {}, bonded {})",
            epoch, delta, new_redeemable, pool_cut, bonded_cut
        );

        Ok(self.record(Event::SupplyIncrease {
            epoch,
            price,
            new_redeemable,
            less_debt: 0,
            new_bonded: remainder,
        }))
    }

    /// Contraction path: issue debt against the contractible base
    /// (bonded minus already-outstanding debt), capped per epoch, and
    /// open a coupon auction when the cooldown window allows one.
    fn contract(&mut self, epoch: Epoch, price: u128) -> Result<Event, EngineError> {
        let peg = self.params.peg as u128;
        let base = self.total_bonded.saturating_sub(self.debt.total_debt());

        let delta = if base == 0 {
            0
        } else {
            let raw = math::mul_div(base, peg - price, peg)?;
            let cap = math::apply_bps(base, self.params.contraction_cap_bps)?;
            raw.min(cap)
        };

        if delta > 0 {
            self.debt.increase_debt(delta)?;
            if !self.auction_within_cooldown(epoch) {
                self.auctions.insert(epoch, CouponAuction::new(epoch, delta));
                self.latest_auction = Some(epoch);
                log::debug!("epoch {}: opened coupon auction, capacity {}", epoch, delta);
            }
        }

        Ok(self.record(Event::SupplyDecrease { epoch, price, new_debt: delta }))
    }

    fn record(&mut self, event: Event) -> Event {
        self.events.record(event.clone());
        event
    }

    /// A non-canceled auction exists within the trailing cooldown
    /// window ending at `epoch`
    fn auction_within_cooldown(&self, epoch: Epoch) -> bool {
        let cooldown = self.params.auction_cooldown_epochs;
        let window_start = epoch.saturating_sub(cooldown.saturating_sub(1));
        self.auctions
            .range(window_start..=epoch)
            .any(|(_, auction)| auction.status() != AuctionStatus::Canceled)
    }

    // ------------------------------------------------------------------
    // Auction surface
    // ------------------------------------------------------------------

    /// Open an auction for the current epoch. A no-op returning `false`
    /// when capacity is zero or a non-canceled auction already exists
    /// in the cooldown window; in particular, re-invoking while the
    /// current epoch's auction is open never discards its accumulated
    /// bids or settlement results.
    pub fn init_coupon_auction(&mut self, capacity: u64) -> bool {
        if capacity == 0 || self.auction_within_cooldown(self.epoch) {
            return false;
        }
        self.auctions.insert(self.epoch, CouponAuction::new(self.epoch, capacity));
        self.latest_auction = Some(self.epoch);
        true
    }

    /// Submit a bid to the most recently opened auction
    pub fn place_coupon_auction_bid(
        &mut self,
        bidder: Address,
        requested_yield: u64,
        dollar_amount: u64,
        expiry_offset: u64,
    ) -> Result<(), EngineError> {
        let epoch = self.latest_auction.ok_or(EngineError::NoAuction)?;
        let auction = self.auctions.get_mut(&epoch).ok_or(EngineError::NoAuction)?;
        auction.place_bid(Bid { bidder, requested_yield, dollar_amount, expiry_offset })
    }

    /// Settle the most recently opened auction, burning each newly
    /// admitted bid's payment from its bidder. `Ok(false)` when no
    /// auction exists or it is already terminal.
    pub fn settle_coupon_auction(&mut self) -> Result<bool, EngineError> {
        let Some(epoch) = self.latest_auction else {
            return Ok(false);
        };
        let auction = self.auctions.get_mut(&epoch).ok_or(EngineError::NoAuction)?;
        auction.settle(&mut self.debt, &mut self.token)
    }

    pub fn finish_coupon_auction_at_epoch(&mut self, epoch: Epoch) -> Result<(), EngineError> {
        self.auctions
            .get_mut(&epoch)
            .ok_or(EngineError::NoAuction)
            .map(CouponAuction::finish)
    }

    pub fn cancel_coupon_auction_at_epoch(&mut self, epoch: Epoch) -> Result<(), EngineError> {
        self.auctions
            .get_mut(&epoch)
            .ok_or(EngineError::NoAuction)
            .map(CouponAuction::cancel)
    }

    pub fn is_coupon_auction_init_at_epoch(&self, epoch: Epoch) -> bool {
        self.auctions.contains_key(&epoch)
    }

    pub fn auction_at_epoch(&self, epoch: Epoch) -> Option<&CouponAuction> {
        self.auctions.get(&epoch)
    }

    /// Settlement statistics for the auction opened at `epoch`
    pub fn auction_stats(&self, epoch: Epoch) -> Option<&AuctionStats> {
        self.auctions.get(&epoch).and_then(CouponAuction::stats)
    }

    pub fn min_expiry_filled(&self, epoch: Epoch) -> Option<u64> {
        self.auction_stats(epoch).map(|s| s.min_expiry)
    }

    pub fn max_expiry_filled(&self, epoch: Epoch) -> Option<u64> {
        self.auction_stats(epoch).map(|s| s.max_expiry)
    }

    pub fn avg_expiry_filled(&self, epoch: Epoch) -> Option<u64> {
        self.auction_stats(epoch).map(|s| s.avg_expiry)
    }

    pub fn min_yield_filled(&self, epoch: Epoch) -> Option<u64> {
        self.auction_stats(epoch).map(|s| s.min_yield)
    }

    pub fn max_yield_filled(&self, epoch: Epoch) -> Option<u64> {
        self.auction_stats(epoch).map(|s| s.max_yield)
    }

    pub fn avg_yield_filled(&self, epoch: Epoch) -> Option<u64> {
        self.auction_stats(epoch).map(|s| s.avg_yield)
    }

    pub fn bid_to_cover(&self, epoch: Epoch) -> Option<u64> {
        self.auction_stats(epoch).map(|s| s.bid_to_cover)
    }

    pub fn total_filled(&self, epoch: Epoch) -> Option<u64> {
        self.auction_stats(epoch).map(|s| s.total_filled)
    }

    // ------------------------------------------------------------------
    // Coupon redemption
    // ------------------------------------------------------------------

    /// Burn matured coupons against the redeemable pool and pay the
    /// holder out of DAO-held supply
    pub fn redeem_coupons(
        &mut self,
        holder: Address,
        epoch: Epoch,
        amount: u64,
    ) -> Result<(), EngineError> {
        if self.token.balance_of(self.params.dao_address) < amount {
            return Err(EngineError::InsufficientBalance);
        }
        self.debt.redeem(holder, epoch, amount, self.epoch)?;
        self.token.transfer(self.params.dao_address, holder, amount)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bonding surface
    // ------------------------------------------------------------------

    /// Deposit holder tokens into the DAO as staged supply
    pub fn stage(&mut self, holder: Address, amount: u64) -> Result<(), EngineError> {
        let next_staged = math::add(self.total_staged, amount)?;
        let next_supply = math::add(self.total_supply, amount)?;
        if self.token.balance_of(holder) < amount {
            return Err(EngineError::InsufficientBalance);
        }

        self.total_staged = next_staged;
        self.total_supply = next_supply;
        self.token.transfer(holder, self.params.dao_address, amount)
    }

    /// Withdraw staged supply back to the holder
    pub fn unstage(&mut self, holder: Address, amount: u64) -> Result<(), EngineError> {
        let next_staged = math::sub(self.total_staged, amount)?;
        let next_supply = math::sub(self.total_supply, amount)?;

        self.total_staged = next_staged;
        self.total_supply = next_supply;
        self.token.transfer(self.params.dao_address, holder, amount)
    }

    /// Commit staged supply to the bonded reserve
    pub fn bond(&mut self, amount: u64) -> Result<(), EngineError> {
        self.total_staged = math::sub(self.total_staged, amount)?;
        self.total_bonded = math::add(self.total_bonded, amount)?;
        Ok(())
    }

    /// Release bonded supply back to staged
    pub fn unbond(&mut self, amount: u64) -> Result<(), EngineError> {
        self.total_bonded = math::sub(self.total_bonded, amount)?;
        self.total_staged = math::add(self.total_staged, amount)?;
        Ok(())
    }
}
