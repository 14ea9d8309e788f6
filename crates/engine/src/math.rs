//! Checked fixed-point arithmetic helpers
//!
//! All supply accounting uses u64 amounts widened to u128 before
//! multiplication. Prices are u128 ratios scaled by 1e18. Every helper
//! is total: overflow and zero denominators surface as
//! `EngineError::ArithmeticFault` instead of wrapping or panicking.

use crate::error::EngineError;

/// Price scale: 1.0 on the peg axis
pub const PRICE_ONE: u128 = 1_000_000_000_000_000_000;

/// Basis points scale (10,000 bps = 100%)
pub const BPS_SCALE: u128 = 10_000;

/// Checked u64 addition
pub fn add(a: u64, b: u64) -> Result<u64, EngineError> {
    a.checked_add(b).ok_or(EngineError::ArithmeticFault)
}

/// Checked u64 subtraction
pub fn sub(a: u64, b: u64) -> Result<u64, EngineError> {
    a.checked_sub(b).ok_or(EngineError::ArithmeticFault)
}

/// Floor of `amount * numerator / denominator`, computed in u128
pub fn mul_div(amount: u64, numerator: u128, denominator: u128) -> Result<u64, EngineError> {
    if denominator == 0 {
        return Err(EngineError::ArithmeticFault);
    }
    let wide = (amount as u128)
        .checked_mul(numerator)
        .ok_or(EngineError::ArithmeticFault)?;
    u64::try_from(wide / denominator).map_err(|_| EngineError::ArithmeticFault)
}

/// Apply a basis-point ratio to an amount, floor rounding
pub fn apply_bps(amount: u64, bps: u16) -> Result<u64, EngineError> {
    mul_div(amount, bps as u128, BPS_SCALE)
}
