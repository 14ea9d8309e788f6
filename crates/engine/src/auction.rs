//! Coupon-debt auction matching engine
//!
//! One auction is opened per contraction epoch that needs debt
//! financing. Bidders offer to finance outstanding debt at competitive
//! yields; settlement admits the cheapest bids first until the
//! auction's capacity is exhausted. Settlement folds the bid set by a
//! total order derived from bid content (yield, then admission
//! sequence), never arrival order, so any two observers of the same
//! bid set converge on identical winners and statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::debt::DebtLedger;
use crate::error::EngineError;
use crate::regulator::Epoch;
use crate::token::TokenLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionStatus {
    Open,
    Finished,
    Canceled,
}

/// A single bid, immutable once admitted to the bid list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub bidder: Address,
    /// Requested yield as an integer percentage
    pub requested_yield: u64,
    pub dollar_amount: u64,
    /// Coupon maturity, in epochs from the auction epoch
    pub expiry_offset: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BidEntry {
    bid: Bid,
    /// Coupon already issued by a previous settlement of this auction
    issued: bool,
}

/// Aggregate statistics over the admitted bids of the most recent
/// settlement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionStats {
    pub min_expiry: u64,
    pub max_expiry: u64,
    pub avg_expiry: u64,
    pub min_yield: u64,
    pub max_yield: u64,
    pub avg_yield: u64,
    pub min_dollar_amount: u64,
    pub max_dollar_amount: u64,
    /// Total requested volume across all bids as an integer percentage
    /// of capacity
    pub bid_to_cover: u64,
    pub total_filled: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponAuction {
    epoch: Epoch,
    capacity: u64,
    status: AuctionStatus,
    bids: Vec<BidEntry>,
    stats: Option<AuctionStats>,
}

impl CouponAuction {
    pub fn new(epoch: Epoch, capacity: u64) -> Self {
        Self {
            epoch,
            capacity,
            status: AuctionStatus::Open,
            bids: Vec::new(),
            stats: None,
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn status(&self) -> AuctionStatus {
        self.status
    }

    pub fn bid_count(&self) -> usize {
        self.bids.len()
    }

    /// Statistics from the most recent settlement, if any
    pub fn stats(&self) -> Option<&AuctionStats> {
        self.stats.as_ref()
    }

    /// Append a bid. The same bidder may submit any number of bids;
    /// submission against a terminal auction fails loudly.
    pub fn place_bid(&mut self, bid: Bid) -> Result<(), EngineError> {
        if self.status != AuctionStatus::Open {
            return Err(EngineError::AuctionClosed);
        }
        self.bids.push(BidEntry { bid, issued: false });
        Ok(())
    }

    /// Deterministic fold over all bids submitted so far.
    ///
    /// Sorts ascending by yield (ties broken by admission sequence),
    /// then greedily admits whole bids while cumulative dollar amount
    /// stays within capacity; a bid that would exceed the remaining
    /// capacity, or whose bidder cannot fund the payment at settlement
    /// time, is skipped entirely and the scan continues. For each newly
    /// admitted bid the dollar amount is burned from the bidder, a
    /// coupon is issued at the bid's maturity, and the financed amount
    /// is taken off `total_debt`. Re-settlement recomputes winners and
    /// statistics over the full bid set but never reverses previously
    /// issued coupons or charges a winner twice.
    ///
    /// Returns `Ok(false)` without mutating state when the auction is
    /// already Finished or Canceled.
    pub fn settle<T: TokenLedger>(
        &mut self,
        debt: &mut DebtLedger,
        token: &mut T,
    ) -> Result<bool, EngineError> {
        if self.status != AuctionStatus::Open {
            return Ok(false);
        }

        // Total order from bid content: yield, then admission sequence
        let mut order: Vec<usize> = (0..self.bids.len()).collect();
        order.sort_by_key(|&i| (self.bids[i].bid.requested_yield, i));

        // Planned burns per bidder, so several bids from one bidder
        // are admitted only up to what the bidder can actually pay
        let mut pending: BTreeMap<Address, u64> = BTreeMap::new();
        let mut admitted: Vec<usize> = Vec::new();
        let mut filled = 0u64;
        for &i in &order {
            let bid = self.bids[i].bid;
            let next = match filled.checked_add(bid.dollar_amount) {
                Some(next) if next <= self.capacity => next,
                // No partial fills: skip and keep scanning
                _ => continue,
            };
            if !self.bids[i].issued {
                // Payment due at settlement; already-issued winners
                // paid when their coupon was first financed
                let owed = pending.get(&bid.bidder).copied().unwrap_or(0);
                match owed.checked_add(bid.dollar_amount) {
                    Some(total) if total <= token.balance_of(bid.bidder) => {
                        pending.insert(bid.bidder, total);
                    }
                    _ => continue,
                }
            }
            filled = next;
            admitted.push(i);
        }

        let stats = self.compute_stats(&admitted)?;

        // Delta-only issuance: winners from an earlier settlement keep
        // their coupons and are not re-financed.
        for &i in &admitted {
            if self.bids[i].issued {
                continue;
            }
            let bid = self.bids[i].bid;
            let maturity = self
                .epoch
                .checked_add(bid.expiry_offset)
                .ok_or(EngineError::ArithmeticFault)?;
            debt.issue_coupon(bid.bidder, maturity, bid.dollar_amount)?;
            debt.decrease_debt(bid.dollar_amount);
            self.bids[i].issued = true;
            // Burn validated against the bidder's balance during the
            // admission scan
            token.burn(bid.bidder, bid.dollar_amount)?;
        }

        self.stats = Some(stats);
        Ok(true)
    }

    /// Terminal transition; subsequent settles return `false` and
    /// subsequent bids fail
    pub fn finish(&mut self) {
        if self.status == AuctionStatus::Open {
            self.status = AuctionStatus::Finished;
        }
    }

    /// Terminal transition, identical gating to `finish`
    pub fn cancel(&mut self) {
        if self.status == AuctionStatus::Open {
            self.status = AuctionStatus::Canceled;
        }
    }

    fn compute_stats(&self, admitted: &[usize]) -> Result<AuctionStats, EngineError> {
        let requested: u128 = self.bids.iter().map(|e| e.bid.dollar_amount as u128).sum();
        let bid_to_cover = if self.capacity == 0 {
            0
        } else {
            u64::try_from(requested * 100 / self.capacity as u128)
                .map_err(|_| EngineError::ArithmeticFault)?
        };

        if admitted.is_empty() {
            return Ok(AuctionStats { bid_to_cover, ..AuctionStats::default() });
        }

        let mut stats = AuctionStats {
            min_expiry: u64::MAX,
            max_expiry: 0,
            avg_expiry: 0,
            min_yield: u64::MAX,
            max_yield: 0,
            avg_yield: 0,
            min_dollar_amount: u64::MAX,
            max_dollar_amount: 0,
            bid_to_cover,
            total_filled: admitted.len() as u64,
        };

        let mut expiry_sum = 0u128;
        let mut yield_sum = 0u128;
        for &i in admitted {
            let bid = &self.bids[i].bid;
            let expiry = self
                .epoch
                .checked_add(bid.expiry_offset)
                .ok_or(EngineError::ArithmeticFault)?;

            stats.min_expiry = stats.min_expiry.min(expiry);
            stats.max_expiry = stats.max_expiry.max(expiry);
            stats.min_yield = stats.min_yield.min(bid.requested_yield);
            stats.max_yield = stats.max_yield.max(bid.requested_yield);
            stats.min_dollar_amount = stats.min_dollar_amount.min(bid.dollar_amount);
            stats.max_dollar_amount = stats.max_dollar_amount.max(bid.dollar_amount);
            expiry_sum += expiry as u128;
            yield_sum += bid.requested_yield as u128;
        }

        let count = admitted.len() as u128;
        stats.avg_expiry = (expiry_sum / count) as u64;
        stats.avg_yield = (yield_sum / count) as u64;
        Ok(stats)
    }
}
