//! Fungible token ledger collaborator
//!
//! The engine never holds token balances itself; it calls an injected
//! mint/burn/transfer surface and keeps only accounting totals. The
//! in-memory implementation backs tests and local keeper runs.

use std::collections::BTreeMap;

use crate::address::Address;
use crate::error::EngineError;
use crate::math;

pub trait TokenLedger {
    fn mint(&mut self, to: Address, amount: u64) -> Result<(), EngineError>;
    fn burn(&mut self, from: Address, amount: u64) -> Result<(), EngineError>;
    fn transfer(&mut self, from: Address, to: Address, amount: u64) -> Result<(), EngineError>;
    fn balance_of(&self, addr: Address) -> u64;
    fn total_supply(&self) -> u64;
}

/// In-memory token ledger with deterministic iteration order
#[derive(Debug, Clone, Default)]
pub struct InMemoryToken {
    balances: BTreeMap<Address, u64>,
    total_supply: u64,
}

impl InMemoryToken {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenLedger for InMemoryToken {
    fn mint(&mut self, to: Address, amount: u64) -> Result<(), EngineError> {
        self.total_supply = math::add(self.total_supply, amount)?;
        let balance = self.balances.entry(to).or_insert(0);
        *balance = math::add(*balance, amount)?;
        Ok(())
    }

    fn burn(&mut self, from: Address, amount: u64) -> Result<(), EngineError> {
        let balance = self.balances.get_mut(&from).ok_or(EngineError::InsufficientBalance)?;
        if *balance < amount {
            return Err(EngineError::InsufficientBalance);
        }
        *balance -= amount;
        self.total_supply -= amount;
        Ok(())
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u64) -> Result<(), EngineError> {
        if amount == 0 {
            return Ok(());
        }
        {
            let from_balance =
                self.balances.get_mut(&from).ok_or(EngineError::InsufficientBalance)?;
            if *from_balance < amount {
                return Err(EngineError::InsufficientBalance);
            }
            *from_balance -= amount;
        }
        let to_balance = self.balances.entry(to).or_insert(0);
        *to_balance = math::add(*to_balance, amount)?;
        Ok(())
    }

    fn balance_of(&self, addr: Address) -> u64 {
        self.balances.get(&addr).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> u64 {
        self.total_supply
    }
}
