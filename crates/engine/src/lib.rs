//! Elastic-supply stablecoin monetary-policy engine
//!
//! Each epoch the regulator compares an oracle price reading against a
//! fixed peg and either mints supply, issues debt, or does nothing; a
//! companion coupon auction lets participants finance outstanding debt
//! by bidding competitive yields. The engine is a pure synchronous
//! state machine: the price oracle, the fungible token ledger, and the
//! epoch clock are injected collaborators.

pub mod address;
pub mod auction;
pub mod debt;
pub mod error;
pub mod events;
pub mod math;
pub mod oracle;
pub mod params;
pub mod regulator;
pub mod token;

pub use address::Address;
pub use auction::{AuctionStats, AuctionStatus, Bid, CouponAuction};
pub use debt::DebtLedger;
pub use error::EngineError;
pub use events::{Event, EventLog};
pub use oracle::{Oracle, OracleReading, SettableOracle};
pub use params::RegulatorParams;
pub use regulator::{Epoch, Regulator};
pub use token::{InMemoryToken, TokenLedger};
