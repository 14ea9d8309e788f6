//! Engine error taxonomy
//!
//! Every failure is a typed, recoverable value returned to the caller.
//! Invalid oracle readings and at-peg prices are *not* errors: the
//! regulator treats them as a defined neutral outcome.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Redemption request exceeds the funded redeemable pool
    #[error("redemption exceeds total redeemable")]
    InsufficientRedeemable,

    /// Holder's coupon balance at the given maturity is too small
    #[error("insufficient coupon balance")]
    InsufficientCoupons,

    /// Coupon maturity epoch has not been reached yet
    #[error("coupon not matured")]
    CouponNotMatured,

    /// Bid placed against a finished or canceled auction
    #[error("auction is closed")]
    AuctionClosed,

    /// No auction has been initialized for the requested epoch
    #[error("no auction at epoch")]
    NoAuction,

    /// Token ledger balance too small for a burn or transfer
    #[error("insufficient token balance")]
    InsufficientBalance,

    /// Overflow, underflow, or division by zero in total accounting.
    /// Structurally prevented by capping deltas before application; if
    /// it occurs anyway the enclosing step aborts with no partial
    /// commit.
    #[error("arithmetic fault")]
    ArithmeticFault,
}
