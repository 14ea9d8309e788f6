//! Supply regulation events
//!
//! Append-only log of per-epoch regulation outcomes, queryable by
//! epoch and serializable for keeper export.

use serde::{Deserialize, Serialize};

use crate::regulator::Epoch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SupplyIncrease {
        epoch: Epoch,
        price: u128,
        new_redeemable: u64,
        less_debt: u64,
        new_bonded: u64,
    },
    SupplyDecrease {
        epoch: Epoch,
        price: u128,
        new_debt: u64,
    },
    SupplyNeutral {
        epoch: Epoch,
    },
}

impl Event {
    pub fn epoch(&self) -> Epoch {
        match self {
            Event::SupplyIncrease { epoch, .. } => *epoch,
            Event::SupplyDecrease { epoch, .. } => *epoch,
            Event::SupplyNeutral { epoch } => *epoch,
        }
    }
}

/// Append-only event log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn all(&self) -> &[Event] {
        &self.events
    }

    pub fn at_epoch(&self, epoch: Epoch) -> Vec<&Event> {
        self.events.iter().filter(|e| e.epoch() == epoch).collect()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
