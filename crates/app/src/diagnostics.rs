//! Diagnostic snapshots of per-device runtime state.
//!
//! These are read-only views for the HTTP surface and logs; the
//! authoritative state lives inside the controller.

use serde::{Deserialize, Serialize};

use castkeep_domain::status::PlaybackState;
use castkeep_domain::time::Timestamp;

/// Coarse health of a device, derived from its runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceHealth {
    /// Showing one of our dashboards.
    Connected,
    /// Reachable but showing nothing.
    Idle,
    /// Playing other media.
    Busy,
    /// The last transport call failed.
    Unreachable,
    /// Not probed yet.
    Unknown,
}

/// A currently active override, as reported to diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideReport {
    pub dashboard_url: String,
    pub entity_id: String,
    pub expires_at: Option<Timestamp>,
}

/// Per-device diagnostic snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceReport {
    pub name: String,
    pub health: DeviceHealth,
    pub last_observed: Option<PlaybackState>,
    pub last_cast_url: Option<String>,
    pub last_cast_at: Option<Timestamp>,
    /// Consecutive transport failures.
    pub failures: u32,
    pub last_error: Option<String>,
    pub active_override: Option<OverrideReport>,
}
