//! The world's shared resource pool.

use atomic_float::AtomicF64;
use std::sync::atomic::Ordering;

/// Resources hosts draw their task rewards from.
///
/// Unlimited pools pay every request in full. Limited pools pay at most what
/// they hold, and are refilled once per tick by the world.
#[derive(Debug)]
pub struct ResourcePool {
    limited: bool,
    available: AtomicF64,
}

impl ResourcePool {
    pub fn unlimited() -> Self {
        Self {
            limited: false,
            available: AtomicF64::new(0.0),
        }
    }

    pub fn limited(amount: f64) -> Self {
        Self {
            limited: true,
            available: AtomicF64::new(amount.max(0.0)),
        }
    }

    pub fn from_config(amount: Option<f64>) -> Self {
        amount.map_or_else(Self::unlimited, Self::limited)
    }

    pub fn is_limited(&self) -> bool {
        self.limited
    }

    pub fn available(&self) -> f64 {
        self.available.load(Ordering::Relaxed)
    }

    /// Takes up to `amount` from the pool and returns what was granted.
    pub fn pull(&self, amount: f64) -> f64 {
        if !self.limited {
            return amount;
        }
        let previous = self
            .available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |have| {
                Some(have - amount.min(have))
            })
            .unwrap_or(0.0);
        amount.min(previous)
    }

    pub fn inflow(&self, amount: f64) {
        if self.limited && amount > 0.0 {
            self.available.fetch_add(amount, Ordering::AcqRel);
        }
    }
}
