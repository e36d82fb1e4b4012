//! State-change events delivered from the host automation platform.

use serde::{Deserialize, Serialize};

use crate::id::EventId;
use crate::time::{Timestamp, now};

/// An entity transitioning from one state to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub id: EventId,
    /// Entity that changed, e.g. `binary_sensor.doorbell`.
    pub entity_id: String,
    /// Previous state, when known.
    pub old_state: Option<String>,
    /// New state.
    pub new_state: String,
    /// When the change was observed.
    pub at: Timestamp,
}

impl StateChange {
    /// Record a state change observed right now.
    #[must_use]
    pub fn new(
        entity_id: impl Into<String>,
        old_state: Option<String>,
        new_state: impl Into<String>,
    ) -> Self {
        Self {
            id: EventId::new(),
            entity_id: entity_id.into(),
            old_state,
            new_state: new_state.into(),
            at: now(),
        }
    }
}
