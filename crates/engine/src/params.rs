//! Regulator configuration
//!
//! All policy constants are externally supplied. The defaults below
//! reproduce the reference deployment's behavior and are overridable
//! from keeper config; nothing in the step logic hard-codes them.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::math::PRICE_ONE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegulatorParams {
    /// Target price in 1e18 scale (1.0 peg). Kept in u64 so params
    /// stay TOML-representable; the engine widens before arithmetic.
    pub peg: u64,

    /// Max expansion per epoch as bps of total bonded (300 = 3%)
    pub expansion_cap_bps: u16,

    /// Max contraction per epoch as bps of the contractible base
    /// (bonded minus outstanding debt)
    pub contraction_cap_bps: u16,

    /// Share of an expansion delta routed to refill redeemable,
    /// capped at the outstanding coupon shortfall (8000 = 80%)
    pub coupon_refill_bps: u16,

    /// Share of the post-refill remainder minted to the pool address
    /// (4000 = 40%)
    pub pool_incentive_bps: u16,

    /// Minimum spacing between coupon auctions, in epochs
    pub auction_cooldown_epochs: u64,

    /// Epochs past maturity after which an unredeemed coupon expires;
    /// 0 disables expiry
    pub coupon_expiry_delay: u64,

    /// Pool/treasury incentive recipient
    pub pool_address: Address,

    /// Address holding bonded and redeemable supply
    pub dao_address: Address,
}

impl Default for RegulatorParams {
    fn default() -> Self {
        Self {
            peg: PRICE_ONE as u64,
            expansion_cap_bps: 300,
            contraction_cap_bps: 300,
            coupon_refill_bps: 8_000,
            pool_incentive_bps: 4_000,
            auction_cooldown_epochs: 7,
            coupon_expiry_delay: 0,
            pool_address: Address::ZERO,
            dao_address: Address::ZERO,
        }
    }
}
