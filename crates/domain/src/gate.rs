//! Gates — entity-state conditions that enable or disable casting.
//!
//! A gate can sit at three levels: globally, per device, or per dashboard
//! window. The gate compares the watched entity's current state against a
//! required state; when the entity is unknown to the state store the gate
//! defaults to satisfied, so a missing helper entity never silently turns
//! the whole system off.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::TimeWindow;

/// Condition on an external entity's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityGate {
    /// Entity to watch, e.g. `input_boolean.cast_enabled`.
    pub entity_id: String,
    /// State the entity must be in for the gate to pass.
    pub required_state: String,
}

impl EntityGate {
    /// Create a gate requiring an explicit state.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyEntityId`] when `entity_id` is empty.
    pub fn new(
        entity_id: impl Into<String>,
        required_state: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let entity_id = entity_id.into();
        if entity_id.is_empty() {
            return Err(ValidationError::EmptyEntityId);
        }
        Ok(Self {
            entity_id,
            required_state: required_state.into(),
        })
    }

    /// Create a gate requiring the conventional `"on"` state.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyEntityId`] when `entity_id` is empty.
    pub fn on(entity_id: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(entity_id, "on")
    }

    /// Evaluate the gate against an observed state.
    ///
    /// `None` (entity unknown to the store) counts as satisfied.
    #[must_use]
    pub fn is_satisfied(&self, observed: Option<&str>) -> bool {
        observed.is_none_or(|state| state == self.required_state)
    }
}

/// The global enable/disable switch: a time window plus an optional
/// entity gate. Evaluated fresh each tick; holds no runtime state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalGate {
    pub window: TimeWindow,
    pub gate: Option<EntityGate>,
}

impl GlobalGate {
    /// Create a global gate from a window and an optional entity gate.
    #[must_use]
    pub fn new(window: TimeWindow, gate: Option<EntityGate>) -> Self {
        Self { window, gate }
    }

    /// Whether the global time window allows casting right now.
    /// The entity part is evaluated by the resolver against the state store.
    #[must_use]
    pub fn window_allows(&self, now: chrono::NaiveTime) -> bool {
        self.window.contains(now)
    }
}
