//! Device — a cast target and its ordered dashboard plan.
//!
//! A device is identified by its display name for the whole process
//! lifetime; reconfiguration requires a restart. Its dashboard windows are
//! evaluated in declaration order and the first match wins, so overlapping
//! windows are allowed and never a validation error.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::gate::EntityGate;
use crate::time::TimeWindow;

/// Default status-output marker identifying a cast dashboard session.
pub const DEFAULT_STATE_MARKER: &str = "Dummy";

/// One (dashboard URL, time range) pairing in a device's plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardWindow {
    /// URL to cast while this window is active.
    pub dashboard_url: String,
    /// Daily time range during which this window applies.
    pub window: TimeWindow,
    /// Volume (0-100) to set after casting; falls back to the device volume.
    pub volume: Option<u8>,
    /// Optional entity gate that must pass for this window to match.
    pub gate: Option<EntityGate>,
    /// Title marker that identifies this dashboard in raw status output.
    pub state_marker: String,
}

impl DashboardWindow {
    /// Create a window with the default state marker and no overrides.
    #[must_use]
    pub fn new(dashboard_url: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            dashboard_url: dashboard_url.into(),
            window,
            volume: None,
            gate: None,
            state_marker: DEFAULT_STATE_MARKER.to_string(),
        }
    }

    /// Set the post-cast volume for this window.
    #[must_use]
    pub fn with_volume(mut self, volume: u8) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Attach an entity gate to this window.
    #[must_use]
    pub fn with_gate(mut self, gate: EntityGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Override the status-output marker for this dashboard.
    #[must_use]
    pub fn with_state_marker(mut self, marker: impl Into<String>) -> Self {
        self.state_marker = marker.into();
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.dashboard_url.is_empty() {
            return Err(ValidationError::EmptyDashboardUrl);
        }
        if let Some(volume) = self.volume {
            if volume > 100 {
                return Err(ValidationError::VolumeOutOfRange(volume));
            }
        }
        Ok(())
    }
}

/// A cast-capable display device and its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Display name — the unique key for this device.
    pub name: String,
    /// Dashboard windows in declaration (= precedence) order.
    pub windows: Vec<DashboardWindow>,
    /// Device-wide volume fallback (0-100).
    pub volume: Option<u8>,
    /// Device-level gate; suppresses window resolution when unsatisfied.
    pub gate: Option<EntityGate>,
    /// Speaker groups this device belongs to. A group counts as busy as a
    /// whole when any member plays other media.
    pub speaker_groups: Vec<String>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `windows` is empty ([`ValidationError::NoWindows`])
    /// - any window has an empty URL or an out-of-range volume
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.windows.is_empty() {
            return Err(ValidationError::NoWindows);
        }
        for window in &self.windows {
            window.validate()?;
        }
        if let Some(volume) = self.volume {
            if volume > 100 {
                return Err(ValidationError::VolumeOutOfRange(volume));
            }
        }
        Ok(())
    }

    /// All distinct status markers this device's dashboards may show.
    #[must_use]
    pub fn state_markers(&self) -> Vec<&str> {
        let mut markers: Vec<&str> = self
            .windows
            .iter()
            .map(|window| window.state_marker.as_str())
            .collect();
        markers.sort_unstable();
        markers.dedup();
        markers
    }

    /// Whether this device shares at least one speaker group with `other`.
    #[must_use]
    pub fn shares_group_with(&self, other: &Device) -> bool {
        self.speaker_groups
            .iter()
            .any(|group| other.speaker_groups.contains(group))
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    name: Option<String>,
    windows: Vec<DashboardWindow>,
    volume: Option<u8>,
    gate: Option<EntityGate>,
    speaker_groups: Vec<String>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn window(mut self, window: DashboardWindow) -> Self {
        self.windows.push(window);
        self
    }

    #[must_use]
    pub fn volume(mut self, volume: u8) -> Self {
        self.volume = Some(volume);
        self
    }

    #[must_use]
    pub fn gate(mut self, gate: EntityGate) -> Self {
        self.gate = Some(gate);
        self
    }

    #[must_use]
    pub fn speaker_group(mut self, group: impl Into<String>) -> Self {
        self.speaker_groups.push(group.into());
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if required fields are missing or
    /// invalid.
    pub fn build(self) -> Result<Device, ValidationError> {
        let device = Device {
            name: self.name.unwrap_or_default(),
            windows: self.windows,
            volume: self.volume,
            gate: self.gate,
            speaker_groups: self.speaker_groups,
        };
        device.validate()?;
        Ok(device)
    }
}
