//! Debt and coupon accounting
//!
//! Owns `total_debt`, `total_coupons`, `total_redeemable`, and
//! per-holder coupon balances keyed by maturity epoch. Coupons are
//! redeemable at or after their maturity epoch, first come first
//! served, once the redeemable pool covers them. Invariant:
//! `total_redeemable <= total_coupons` at all observable points.

use std::collections::BTreeMap;

use crate::address::Address;
use crate::error::EngineError;
use crate::math;
use crate::regulator::Epoch;

#[derive(Debug, Clone, Default)]
pub struct DebtLedger {
    total_debt: u64,
    total_coupons: u64,
    total_redeemable: u64,
    /// Coupon balances keyed by (holder, maturity epoch)
    coupons: BTreeMap<(Address, Epoch), u64>,
}

impl DebtLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_debt(&self) -> u64 {
        self.total_debt
    }

    pub fn total_coupons(&self) -> u64 {
        self.total_coupons
    }

    pub fn total_redeemable(&self) -> u64 {
        self.total_redeemable
    }

    /// Outstanding coupon amount not yet covered by the redeemable pool
    pub fn coupon_shortfall(&self) -> u64 {
        self.total_coupons - self.total_redeemable
    }

    pub fn balance_of_coupons(&self, holder: Address, epoch: Epoch) -> u64 {
        self.coupons.get(&(holder, epoch)).copied().unwrap_or(0)
    }

    pub fn increase_debt(&mut self, amount: u64) -> Result<(), EngineError> {
        self.total_debt = math::add(self.total_debt, amount)?;
        Ok(())
    }

    /// Reduce outstanding debt by a financed amount. Clamps at zero:
    /// debt already repaid out of band never drives the total negative.
    pub fn decrease_debt(&mut self, amount: u64) {
        self.total_debt = self.total_debt.saturating_sub(amount);
    }

    /// Record a coupon for `holder` maturing at `epoch`
    pub fn issue_coupon(
        &mut self,
        holder: Address,
        epoch: Epoch,
        amount: u64,
    ) -> Result<(), EngineError> {
        self.total_coupons = math::add(self.total_coupons, amount)?;
        let balance = self.coupons.entry((holder, epoch)).or_insert(0);
        *balance = math::add(*balance, amount)?;
        Ok(())
    }

    /// Fund the redeemable pool, clamped at the outstanding coupon
    /// shortfall. Returns the amount actually applied.
    pub fn refill_redeemable(&mut self, amount: u64) -> Result<u64, EngineError> {
        let applied = amount.min(self.coupon_shortfall());
        self.total_redeemable = math::add(self.total_redeemable, applied)?;
        Ok(applied)
    }

    /// Burn `amount` of the holder's coupons at `epoch` against the
    /// redeemable pool.
    pub fn redeem(
        &mut self,
        holder: Address,
        epoch: Epoch,
        amount: u64,
        current_epoch: Epoch,
    ) -> Result<(), EngineError> {
        if current_epoch < epoch {
            return Err(EngineError::CouponNotMatured);
        }
        if amount > self.total_redeemable {
            return Err(EngineError::InsufficientRedeemable);
        }
        let balance = self
            .coupons
            .get_mut(&(holder, epoch))
            .ok_or(EngineError::InsufficientCoupons)?;
        if *balance < amount {
            return Err(EngineError::InsufficientCoupons);
        }

        *balance -= amount;
        if *balance == 0 {
            self.coupons.remove(&(holder, epoch));
        }
        self.total_redeemable -= amount;
        self.total_coupons -= amount;
        Ok(())
    }

    /// Purge coupons left unredeemed more than `expiry_delay` epochs
    /// past maturity. Disabled when `expiry_delay` is zero. Returns the
    /// purged amount.
    pub fn expire_coupons(&mut self, current_epoch: Epoch, expiry_delay: u64) -> u64 {
        if expiry_delay == 0 {
            return 0;
        }

        let mut purged = 0u64;
        self.coupons.retain(|(_, maturity), amount| {
            let expired = maturity
                .checked_add(expiry_delay)
                .map(|deadline| deadline < current_epoch)
                .unwrap_or(false);
            if expired {
                purged = purged.saturating_add(*amount);
            }
            !expired
        });

        self.total_coupons = self.total_coupons.saturating_sub(purged);
        self.total_redeemable = self.total_redeemable.min(self.total_coupons);
        purged
    }
}
