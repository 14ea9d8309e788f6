//! Price oracle collaborator
//!
//! The oracle is an injected trait so the engine is testable without a
//! live feed. A reading is a ratio against the 1e18 peg scale plus a
//! validity flag; an invalid reading is a defined neutral outcome, not
//! an error.

use crate::error::EngineError;
use crate::math::PRICE_ONE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleReading {
    pub numerator: u128,
    pub denominator: u128,
    pub valid: bool,
}

impl OracleReading {
    pub fn invalid() -> Self {
        Self { numerator: 0, denominator: 0, valid: false }
    }

    /// Scaled price: `numerator * 1e18 / denominator`, floor rounded
    pub fn price(&self) -> Result<u128, EngineError> {
        if self.denominator == 0 {
            return Err(EngineError::ArithmeticFault);
        }
        self.numerator
            .checked_mul(PRICE_ONE)
            .map(|n| n / self.denominator)
            .ok_or(EngineError::ArithmeticFault)
    }
}

/// Read exactly once per regulator step
pub trait Oracle {
    fn read(&mut self) -> OracleReading;
}

/// Manually settable oracle for tests and local keeper runs
#[derive(Debug, Clone)]
pub struct SettableOracle {
    reading: OracleReading,
}

impl SettableOracle {
    pub fn new() -> Self {
        Self { reading: OracleReading::invalid() }
    }

    pub fn set(&mut self, numerator: u128, denominator: u128, valid: bool) {
        self.reading = OracleReading { numerator, denominator, valid };
    }
}

impl Default for SettableOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl Oracle for SettableOracle {
    fn read(&mut self) -> OracleReading {
        self.reading
    }
}
