//! Simulation clock. Owns the current simulated day.
//!
//! Every request reads the day exactly once, at its start. A concurrent
//! advance does not change the day an in-flight request stamps on its events.

use crate::{error::EngineResult, store::AdStore, types::Day};
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Mutex,
};

/// The contract every clock must fulfill. Shared between engine instances
/// as `Arc<dyn DayClock>`.
pub trait DayClock: Send + Sync {
    fn current_day(&self) -> EngineResult<Day>;

    fn set_day(&self, day: Day) -> EngineResult<()>;

    /// Move the clock to `target`, or one day forward when no target is
    /// given. Returns the new day.
    fn advance(&self, target: Option<Day>) -> EngineResult<Day> {
        let next = match target {
            Some(day) => day,
            None => self.current_day()? + 1,
        };
        self.set_day(next)?;
        Ok(next)
    }
}

/// In-process clock. Cheap to read from many threads.
#[derive(Debug, Default)]
pub struct SimClock {
    day: AtomicI64,
}

impl SimClock {
    pub fn new(day: Day) -> Self {
        Self { day: AtomicI64::new(day) }
    }
}

impl DayClock for SimClock {
    fn current_day(&self) -> EngineResult<Day> {
        Ok(self.day.load(Ordering::SeqCst))
    }

    fn set_day(&self, day: Day) -> EngineResult<()> {
        self.day.store(day, Ordering::SeqCst);
        Ok(())
    }
}

/// Clock persisted in the `sim_clock` table, so every process attached to
/// the same database agrees on the day.
pub struct StoreClock {
    store: Mutex<AdStore>,
}

impl StoreClock {
    pub fn new(store: AdStore) -> Self {
        Self { store: Mutex::new(store) }
    }

    fn with_store<T>(&self, f: impl FnOnce(&AdStore) -> EngineResult<T>) -> EngineResult<T> {
        let guard = self
            .store
            .lock()
            .map_err(|_| anyhow::anyhow!("clock store mutex poisoned"))?;
        f(&guard)
    }
}

impl DayClock for StoreClock {
    fn current_day(&self) -> EngineResult<Day> {
        self.with_store(|s| s.clock_day())
    }

    fn set_day(&self, day: Day) -> EngineResult<()> {
        self.with_store(|s| s.set_clock_day(day))
    }

    fn advance(&self, target: Option<Day>) -> EngineResult<Day> {
        match target {
            Some(day) => {
                self.set_day(day)?;
                Ok(day)
            }
            None => self.with_store(|s| s.increment_clock_day()),
        }
    }
}
