//! Device state probe — what is a device currently showing?
//!
//! The probe queries raw status text through the transport, classifies it,
//! and keeps the last classification per device on an observation board.
//! The board is what makes speaker groups work: a device is skipped when
//! any groupmate was last seen playing other media, even if the device
//! itself is idle.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use castkeep_domain::device::Device;
use castkeep_domain::error::TransportError;
use castkeep_domain::status::{PlaybackState, classify_status};

use crate::ports::CastTransport;

/// Probes devices and remembers the last observed classification.
pub struct DeviceProbe<T> {
    transport: T,
    observed: RwLock<HashMap<String, PlaybackState>>,
}

impl<T: CastTransport> DeviceProbe<T> {
    /// Create a probe over the given transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            observed: RwLock::new(HashMap::new()),
        }
    }

    /// Query and classify the device's current playback state.
    ///
    /// On success the classification is recorded on the observation board;
    /// on failure the device's entry is cleared, since its state is
    /// unknown.
    ///
    /// # Errors
    ///
    /// Propagates the [`TransportError`] from the status query.
    pub async fn probe(&self, device: &Device) -> Result<PlaybackState, TransportError> {
        match self.transport.query_status(&device.name).await {
            Ok(raw) => {
                let playback = classify_status(&raw, &device.state_markers());
                self.record(&device.name, playback);
                Ok(playback)
            }
            Err(err) => {
                self.clear(&device.name);
                Err(err)
            }
        }
    }

    /// Record a classification for a device.
    pub fn record(&self, device: &str, playback: PlaybackState) {
        self.observed
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(device.to_string(), playback);
    }

    /// Forget a device's classification (state unknown).
    pub fn clear(&self, device: &str) {
        self.observed
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(device);
    }

    /// Last observed classification of a device, if any.
    #[must_use]
    pub fn observed(&self, device: &str) -> Option<PlaybackState> {
        self.observed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(device)
            .copied()
    }

    /// Whether any groupmate of `device` (in `roster`) was last seen
    /// playing other media. The whole group is then treated as busy and
    /// no member is cast to.
    #[must_use]
    pub fn group_busy(&self, device: &Device, roster: &[Device]) -> bool {
        if device.speaker_groups.is_empty() {
            return false;
        }
        roster
            .iter()
            .filter(|other| other.name != device.name && device.shares_group_with(other))
            .any(|other| self.observed(&other.name) == Some(PlaybackState::OtherMedia))
    }
}
