//! Runtime-mutable global settings.
//!
//! The cast interval and global gate can be changed while the daemon is
//! running (through the HTTP surface) without a restart. The scheduler
//! re-reads them on every tick.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use castkeep_domain::gate::{EntityGate, GlobalGate};
use castkeep_domain::time::TimeWindow;

/// Snapshot of the mutable global settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// How often the scheduler ticks all devices.
    pub cast_interval: Duration,
    /// The global enable/disable gate.
    pub global_gate: GlobalGate,
}

/// Shared, runtime-mutable settings.
pub struct RuntimeSettings {
    inner: RwLock<Settings>,
}

impl RuntimeSettings {
    /// Wrap the startup settings.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    /// Current cast interval.
    #[must_use]
    pub fn cast_interval(&self) -> Duration {
        self.read().cast_interval
    }

    /// Current global gate.
    #[must_use]
    pub fn global_gate(&self) -> GlobalGate {
        self.read().global_gate.clone()
    }

    /// Full snapshot of the current settings.
    #[must_use]
    pub fn snapshot(&self) -> Settings {
        self.read().clone()
    }

    /// Change the cast interval; applies from the next tick.
    pub fn set_cast_interval(&self, interval: Duration) {
        self.write().cast_interval = interval;
    }

    /// Change the global time window.
    pub fn set_global_window(&self, window: TimeWindow) {
        self.write().global_gate.window = window;
    }

    /// Change (or remove) the global gate entity.
    pub fn set_global_gate_entity(&self, gate: Option<EntityGate>) {
        self.write().global_gate.gate = gate;
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Settings> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Settings> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
