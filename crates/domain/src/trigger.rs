//! State triggers — entity transitions that override window resolution.
//!
//! A trigger watches one entity. When the entity transitions to the
//! trigger's target state, the trigger becomes an *active override* for
//! its device, superseding dashboard-window resolution until it expires
//! or the entity moves away from the target state again. A device holds
//! at most one active override; a newly activated trigger replaces any
//! prior one.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::event::StateChange;
use crate::time::Timestamp;

/// Configuration of one entity-driven override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTrigger {
    /// Device whose resolution this trigger overrides.
    pub device: String,
    /// Entity to watch.
    pub entity_id: String,
    /// State that activates the trigger.
    pub to_state: String,
    /// Dashboard to show while the override is active.
    pub dashboard_url: String,
    /// Seconds after activation at which the override expires on its own.
    pub timeout: Option<u64>,
    /// Whether the override may interrupt other playing media.
    pub force_cast: bool,
}

impl StateTrigger {
    /// Create a trigger with no timeout and no force-cast.
    #[must_use]
    pub fn new(
        device: impl Into<String>,
        entity_id: impl Into<String>,
        to_state: impl Into<String>,
        dashboard_url: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            entity_id: entity_id.into(),
            to_state: to_state.into(),
            dashboard_url: dashboard_url.into(),
            timeout: None,
            force_cast: false,
        }
    }

    /// Expire the override this many seconds after activation.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Allow the override to interrupt other playing media.
    #[must_use]
    pub fn with_force_cast(mut self) -> Self {
        self.force_cast = true;
        self
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the entity id or dashboard URL
    /// is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.entity_id.is_empty() {
            return Err(ValidationError::EmptyEntityId);
        }
        if self.dashboard_url.is_empty() {
            return Err(ValidationError::EmptyDashboardUrl);
        }
        Ok(())
    }

    /// Whether this trigger is activated by the given state change.
    #[must_use]
    pub fn matches(&self, change: &StateChange) -> bool {
        change.entity_id == self.entity_id && change.new_state == self.to_state
    }

    /// Turn the trigger into an active override as of `at`.
    ///
    /// A timeout too large to represent simply never expires.
    #[must_use]
    pub fn activate(&self, at: Timestamp) -> ActiveOverride {
        let expires_at = self.timeout.and_then(|seconds| {
            let delta = chrono::Duration::try_seconds(i64::try_from(seconds).ok()?)?;
            at.checked_add_signed(delta)
        });
        ActiveOverride {
            dashboard_url: self.dashboard_url.clone(),
            entity_id: self.entity_id.clone(),
            to_state: self.to_state.clone(),
            force_cast: self.force_cast,
            activated_at: at,
            expires_at,
        }
    }
}

/// A trigger that has fired and currently supersedes window resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveOverride {
    pub dashboard_url: String,
    /// Entity whose state keeps this override alive.
    pub entity_id: String,
    /// State the entity must stay in.
    pub to_state: String,
    pub force_cast: bool,
    pub activated_at: Timestamp,
    /// Absolute expiry, when the trigger declared a timeout.
    pub expires_at: Option<Timestamp>,
}

impl ActiveOverride {
    /// Whether the timeout has elapsed as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Whether this state change moves the watched entity away from the
    /// target state, releasing the override.
    #[must_use]
    pub fn is_released_by(&self, change: &StateChange) -> bool {
        change.entity_id == self.entity_id && change.new_state != self.to_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;

    fn doorbell_trigger() -> StateTrigger {
        StateTrigger::new(
            "Kitchen display",
            "binary_sensor.doorbell",
            "on",
            "http://hub.local:8123/kiosk/door-camera",
        )
    }

    #[test]
    fn should_match_transition_to_target_state() {
        let trigger = doorbell_trigger();
        let change = StateChange::new("binary_sensor.doorbell", Some("off".to_string()), "on");
        assert!(trigger.matches(&change));
    }

    #[test]
    fn should_not_match_other_entities_or_states() {
        let trigger = doorbell_trigger();
        let wrong_entity = StateChange::new("binary_sensor.backdoor", None, "on");
        let wrong_state = StateChange::new("binary_sensor.doorbell", None, "off");
        assert!(!trigger.matches(&wrong_entity));
        assert!(!trigger.matches(&wrong_state));
    }

    #[test]
    fn should_activate_without_expiry_when_no_timeout() {
        let at = now();
        let active = doorbell_trigger().activate(at);
        assert_eq!(active.activated_at, at);
        assert!(active.expires_at.is_none());
        assert!(!active.is_expired(at + chrono::Duration::days(7)));
    }

    #[test]
    fn should_expire_after_timeout_elapses() {
        let at = now();
        let active = doorbell_trigger().with_timeout(60).activate(at);
        assert!(!active.is_expired(at));
        assert!(!active.is_expired(at + chrono::Duration::seconds(59)));
        assert!(active.is_expired(at + chrono::Duration::seconds(60)));
        assert!(active.is_expired(at + chrono::Duration::seconds(90)));
    }

    #[test]
    fn should_release_when_watched_entity_leaves_target_state() {
        let active = doorbell_trigger().activate(now());
        let leaves = StateChange::new("binary_sensor.doorbell", Some("on".to_string()), "off");
        let stays = StateChange::new("binary_sensor.doorbell", Some("on".to_string()), "on");
        let other = StateChange::new("binary_sensor.backdoor", Some("on".to_string()), "off");
        assert!(active.is_released_by(&leaves));
        assert!(!active.is_released_by(&stays));
        assert!(!active.is_released_by(&other));
    }

    #[test]
    fn should_carry_force_cast_flag_into_override() {
        let active = doorbell_trigger().with_force_cast().activate(now());
        assert!(active.force_cast);
    }

    #[test]
    fn should_reject_empty_entity_id() {
        let trigger = StateTrigger::new("Device", "", "on", "http://hub.local/kiosk");
        assert_eq!(trigger.validate(), Err(ValidationError::EmptyEntityId));
    }

    #[test]
    fn should_reject_empty_dashboard_url() {
        let trigger = StateTrigger::new("Device", "binary_sensor.doorbell", "on", "");
        assert_eq!(trigger.validate(), Err(ValidationError::EmptyDashboardUrl));
    }
}
