//! Dashboard resolver — which dashboard (if any) should show right now.
//!
//! Resolution precedence, per device:
//! 1. an active entity-triggered override (outranks the device gate)
//! 2. nothing, when the device-level gate is unsatisfied
//! 3. the first dashboard window containing the current time whose own
//!    gate passes — later matches are ignored by declaration order
//! 4. nothing
//!
//! Override expiry is wall-clock runtime state and therefore handled by
//! the controller before resolution, not here.

use chrono::NaiveTime;

use castkeep_domain::decision::{Decision, DecisionSource};
use castkeep_domain::device::Device;
use castkeep_domain::gate::{EntityGate, GlobalGate};
use castkeep_domain::trigger::ActiveOverride;

use crate::ports::StateStore;

/// Resolves the active dashboard configuration for a device.
pub struct DashboardResolver<S> {
    states: S,
}

impl<S: StateStore> DashboardResolver<S> {
    /// Create a resolver reading entity states from the given store.
    pub fn new(states: S) -> Self {
        Self { states }
    }

    /// Evaluate an entity gate against the current store contents.
    pub async fn gate_satisfied(&self, gate: &EntityGate) -> bool {
        let observed = self.states.get_state(&gate.entity_id).await;
        gate.is_satisfied(observed.as_deref())
    }

    /// Whether the global gate allows any casting right now.
    pub async fn global_allows(&self, global: &GlobalGate, now: NaiveTime) -> bool {
        if !global.window_allows(now) {
            return false;
        }
        match &global.gate {
            Some(gate) => self.gate_satisfied(gate).await,
            None => true,
        }
    }

    /// Whether an active override's watched entity is still in its target
    /// state. An entity unknown to the store cannot refute the override.
    pub async fn override_live(&self, active: &ActiveOverride) -> bool {
        match self.states.get_state(&active.entity_id).await {
            Some(state) => state == active.to_state,
            None => true,
        }
    }

    /// Resolve the decision for one device at the given local time.
    ///
    /// The caller has already cleared expired overrides and checked the
    /// global gate.
    pub async fn resolve(
        &self,
        device: &Device,
        now: NaiveTime,
        active: Option<&ActiveOverride>,
    ) -> Decision {
        // An override outranks the device-level gate; the gate only
        // suppresses window-based resolution.
        if let Some(active) = active {
            return Decision::CastTo {
                url: active.dashboard_url.clone(),
                volume: device.volume,
                force_cast: active.force_cast,
                source: DecisionSource::Override,
            };
        }

        if let Some(gate) = &device.gate {
            if !self.gate_satisfied(gate).await {
                tracing::debug!(device = %device.name, entity = %gate.entity_id, "device gate unsatisfied");
                return Decision::NoAction;
            }
        }

        let mut matched: Option<(usize, &castkeep_domain::device::DashboardWindow)> = None;
        for (index, window) in device.windows.iter().enumerate() {
            if !window.window.contains(now) {
                continue;
            }
            if let Some((winner, _)) = matched {
                // Overlap is not an error; declaration order breaks the tie.
                tracing::debug!(
                    device = %device.name,
                    window = index,
                    winner,
                    "window also covers the current time, ignored by declaration order"
                );
                continue;
            }
            if let Some(gate) = &window.gate {
                if !self.gate_satisfied(gate).await {
                    tracing::debug!(device = %device.name, window = index, "window gate unsatisfied, skipped");
                    continue;
                }
            }
            matched = Some((index, window));
        }

        match matched {
            Some((index, window)) => Decision::CastTo {
                url: window.dashboard_url.clone(),
                volume: window.volume.or(device.volume),
                force_cast: false,
                source: DecisionSource::Window(index),
            },
            None => Decision::NoAction,
        }
    }
}
