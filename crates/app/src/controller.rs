//! Cast action controller — the per-device casting state machine.
//!
//! For every device, every tick: clear stale overrides, resolve the
//! active configuration, probe the device, and issue at most one casting
//! action. The controller never pre-emptively stops a dashboard — when
//! resolution yields no action the device is left alone.
//!
//! All per-device runtime state lives here, behind one async mutex per
//! device. That mutex is the serialization point: a tick and an incoming
//! state change can never mutate the same device concurrently, while
//! distinct devices proceed in parallel.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveTime;
use tokio::sync::Mutex;

use castkeep_domain::decision::Decision;
use castkeep_domain::device::Device;
use castkeep_domain::error::TransportError;
use castkeep_domain::event::StateChange;
use castkeep_domain::status::{PlaybackState, parse_volume};
use castkeep_domain::time::Timestamp;
use castkeep_domain::trigger::{ActiveOverride, StateTrigger};

use crate::diagnostics::{DeviceHealth, DeviceReport, OverrideReport};
use crate::ports::{CastTransport, StateStore};
use crate::probe::DeviceProbe;
use crate::resolver::DashboardResolver;
use crate::settings::RuntimeSettings;

/// Volume applied after a cast when neither the configuration nor the
/// device's own status reported one.
const DEFAULT_VOLUME: u8 = 50;

/// Failure streak length at which log severity escalates to error.
const FAILURE_ESCALATION_THRESHOLD: u32 = 5;

/// How long an idle device that previously showed our dashboard is left
/// alone before re-casting. Gives voice-assistant interactions and app
/// launches time to settle instead of steamrolling them.
const RECONNECT_DELAY_SECS: i64 = 30;

/// Mutable per-device runtime state. Discarded on shutdown; after a
/// restart the system re-probes and may re-cast even if nothing changed
/// on the device.
#[derive(Debug, Default)]
pub struct DeviceRuntimeState {
    /// Dashboard URL last successfully cast to this device.
    pub last_cast_url: Option<String>,
    pub last_cast_at: Option<Timestamp>,
    /// Consecutive transport failures; reset on any success.
    pub failures: u32,
    pub last_error: Option<TransportError>,
    pub active_override: Option<ActiveOverride>,
    pub last_observed: Option<PlaybackState>,
    /// When the device was first seen idle after having shown a dashboard.
    idle_since: Option<Timestamp>,
}

/// The per-device casting state machine over all configured devices.
pub struct CastController<T, S> {
    transport: T,
    probe: DeviceProbe<T>,
    resolver: DashboardResolver<S>,
    settings: Arc<RuntimeSettings>,
    devices: Vec<Device>,
    triggers: Vec<StateTrigger>,
    states: HashMap<String, Mutex<DeviceRuntimeState>>,
    reconnect_delay: chrono::Duration,
}

impl<T, S> CastController<T, S>
where
    T: CastTransport + Clone,
    S: StateStore,
{
    /// Create a controller over validated devices and triggers.
    pub fn new(
        transport: T,
        store: S,
        devices: Vec<Device>,
        triggers: Vec<StateTrigger>,
        settings: Arc<RuntimeSettings>,
    ) -> Self {
        let states = devices
            .iter()
            .map(|device| (device.name.clone(), Mutex::new(DeviceRuntimeState::default())))
            .collect();
        Self {
            probe: DeviceProbe::new(transport.clone()),
            transport,
            resolver: DashboardResolver::new(store),
            settings,
            devices,
            triggers,
            states,
            reconnect_delay: chrono::Duration::seconds(RECONNECT_DELAY_SECS),
        }
    }

    /// Override the idle stabilization delay.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: chrono::Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// The configured devices, in declaration order.
    #[must_use]
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Names of all configured devices, in declaration order.
    #[must_use]
    pub fn device_names(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.name.clone()).collect()
    }

    /// Whether the global gate allows any casting right now.
    pub async fn global_allows(&self, now: NaiveTime) -> bool {
        let gate = self.settings.global_gate();
        self.resolver.global_allows(&gate, now).await
    }

    /// Run one full tick for a single device: maintain overrides,
    /// resolve, probe, and act.
    ///
    /// The caller has already checked the global gate.
    pub async fn tick_device(&self, device_name: &str, now: Timestamp, local: NaiveTime) {
        let Some(device) = self.devices.iter().find(|d| d.name == device_name) else {
            tracing::warn!(device = device_name, "tick requested for unknown device");
            return;
        };
        let Some(lock) = self.states.get(device_name) else {
            return;
        };
        let mut state = lock.lock().await;

        self.expire_override(device, &mut state, now).await;

        let decision = self
            .resolver
            .resolve(device, local, state.active_override.as_ref())
            .await;
        let Decision::CastTo {
            url, volume, force_cast, ..
        } = decision
        else {
            tracing::debug!(device = %device.name, "no dashboard scheduled, leaving device alone");
            return;
        };

        match self.probe.probe(device).await {
            Err(err) => self.record_failure(&device.name, &mut state, err),
            Ok(playback) => {
                state.last_observed = Some(playback);
                if playback != PlaybackState::Idle {
                    state.idle_since = None;
                }
                match playback {
                    PlaybackState::OtherMedia if !force_cast => {
                        tracing::info!(device = %device.name, "other media playing, skipping cast");
                    }
                    PlaybackState::ShowingDashboard
                        if state.last_cast_url.as_deref() == Some(url.as_str()) =>
                    {
                        tracing::debug!(device = %device.name, "target dashboard already showing");
                        state.failures = 0;
                        state.last_error = None;
                    }
                    playback => {
                        if !force_cast && self.probe.group_busy(device, &self.devices) {
                            tracing::info!(device = %device.name, "speaker group busy, skipping cast");
                            return;
                        }
                        if playback == PlaybackState::Idle
                            && self.waiting_for_stabilization(device, &mut state, now)
                        {
                            return;
                        }
                        self.cast(device, &url, volume, &mut state, now).await;
                    }
                }
            }
        }
    }

    /// Apply a state change: release overrides whose watched entity moved
    /// away, then activate the first matching trigger per device.
    ///
    /// Returns the devices whose resolution changed, so the scheduler can
    /// give them an immediate off-cycle tick.
    pub async fn handle_state_change(&self, change: &StateChange, now: Timestamp) -> Vec<String> {
        let mut affected = Vec::new();

        for device in &self.devices {
            let Some(lock) = self.states.get(&device.name) else {
                continue;
            };
            let mut state = lock.lock().await;
            let released = state
                .active_override
                .as_ref()
                .is_some_and(|active| active.is_released_by(change));
            if released {
                tracing::info!(
                    device = %device.name,
                    entity = %change.entity_id,
                    "watched entity left trigger state, override released"
                );
                state.active_override = None;
                affected.push(device.name.clone());
            }
        }

        let mut activated: HashSet<&str> = HashSet::new();
        for trigger in &self.triggers {
            if !trigger.matches(change) || activated.contains(trigger.device.as_str()) {
                continue;
            }
            let Some(lock) = self.states.get(&trigger.device) else {
                tracing::debug!(device = %trigger.device, "trigger for unknown device ignored");
                continue;
            };
            let mut state = lock.lock().await;
            tracing::info!(
                device = %trigger.device,
                entity = %trigger.entity_id,
                to_state = %trigger.to_state,
                "trigger fired, activating override"
            );
            state.active_override = Some(trigger.activate(now));
            activated.insert(trigger.device.as_str());
            if !affected.contains(&trigger.device) {
                affected.push(trigger.device.clone());
            }
        }

        affected
    }

    /// Count a tick that was abandoned because it exceeded its deadline.
    pub async fn record_abandoned(&self, device_name: &str, deadline: std::time::Duration) {
        if let Some(lock) = self.states.get(device_name) {
            let mut state = lock.lock().await;
            self.record_failure(device_name, &mut state, TransportError::Timeout(deadline));
        }
    }

    /// Diagnostic snapshots of all devices, in declaration order.
    pub async fn snapshot(&self) -> Vec<DeviceReport> {
        let mut reports = Vec::with_capacity(self.devices.len());
        for device in &self.devices {
            if let Some(report) = self.device_report(&device.name).await {
                reports.push(report);
            }
        }
        reports
    }

    /// Diagnostic snapshot of one device, if configured.
    pub async fn device_report(&self, device_name: &str) -> Option<DeviceReport> {
        let lock = self.states.get(device_name)?;
        let state = lock.lock().await;
        Some(build_report(device_name, &state))
    }

    async fn expire_override(
        &self,
        device: &Device,
        state: &mut DeviceRuntimeState,
        now: Timestamp,
    ) {
        let Some(active) = &state.active_override else {
            return;
        };
        if active.is_expired(now) {
            tracing::info!(device = %device.name, "override expired, resuming window resolution");
            state.active_override = None;
        } else if !self.resolver.override_live(active).await {
            tracing::info!(
                device = %device.name,
                entity = %active.entity_id,
                "watched entity no longer in trigger state, clearing override"
            );
            state.active_override = None;
        }
    }

    /// An idle device that previously showed a dashboard is given a grace
    /// period before re-casting.
    fn waiting_for_stabilization(
        &self,
        device: &Device,
        state: &mut DeviceRuntimeState,
        now: Timestamp,
    ) -> bool {
        if state.last_cast_url.is_none() {
            return false;
        }
        match state.idle_since {
            None => {
                state.idle_since = Some(now);
                tracing::debug!(device = %device.name, "device went idle, waiting before re-casting");
                true
            }
            Some(since) => {
                let waiting = now - since < self.reconnect_delay;
                if waiting {
                    tracing::debug!(device = %device.name, "still inside idle stabilization period");
                }
                waiting
            }
        }
    }

    /// Issue the actual cast sequence: stop, mute, cast, restore volume.
    async fn cast(
        &self,
        device: &Device,
        url: &str,
        volume: Option<u8>,
        state: &mut DeviceRuntimeState,
        now: Timestamp,
    ) {
        tracing::info!(device = %device.name, url, "casting dashboard");

        // When no volume is configured, restore whatever the device was at.
        let observed_volume = if volume.is_none() {
            match self.transport.query_status(&device.name).await {
                Ok(raw) => parse_volume(&raw),
                Err(_) => None,
            }
        } else {
            None
        };

        if let Err(err) = self.transport.stop(&device.name).await {
            tracing::debug!(device = %device.name, error = %err, "pre-cast stop failed");
        }
        if let Err(err) = self.transport.set_volume(&device.name, 0).await {
            tracing::debug!(device = %device.name, error = %err, "muting before cast failed");
        }

        if let Err(err) = self.transport.cast(&device.name, url).await {
            self.record_failure(&device.name, state, err);
            return;
        }

        let final_volume = volume.or(observed_volume).unwrap_or(DEFAULT_VOLUME);
        if let Err(err) = self.transport.set_volume(&device.name, final_volume).await {
            tracing::warn!(device = %device.name, error = %err, "setting post-cast volume failed");
        }

        state.last_cast_url = Some(url.to_string());
        state.last_cast_at = Some(now);
        state.failures = 0;
        state.last_error = None;
        state.idle_since = None;
        state.last_observed = Some(PlaybackState::ShowingDashboard);
        self.probe.record(&device.name, PlaybackState::ShowingDashboard);
    }

    fn record_failure(&self, device_name: &str, state: &mut DeviceRuntimeState, err: TransportError) {
        state.failures += 1;
        state.last_error = Some(err.clone());
        state.last_observed = None;
        self.probe.clear(device_name);
        if state.failures >= FAILURE_ESCALATION_THRESHOLD {
            tracing::error!(
                device = device_name,
                failures = state.failures,
                error = %err,
                "device still unreachable, will keep retrying every tick"
            );
        } else {
            tracing::warn!(
                device = device_name,
                failures = state.failures,
                error = %err,
                "transport call failed, retrying next tick"
            );
        }
    }
}

fn build_report(name: &str, state: &DeviceRuntimeState) -> DeviceReport {
    let health = if state.failures > 0 {
        DeviceHealth::Unreachable
    } else {
        match state.last_observed {
            Some(PlaybackState::ShowingDashboard) => DeviceHealth::Connected,
            Some(PlaybackState::Idle) => DeviceHealth::Idle,
            Some(PlaybackState::OtherMedia) => DeviceHealth::Busy,
            None => DeviceHealth::Unknown,
        }
    };
    DeviceReport {
        name: name.to_string(),
        health,
        last_observed: state.last_observed,
        last_cast_url: state.last_cast_url.clone(),
        last_cast_at: state.last_cast_at,
        failures: state.failures,
        last_error: state.last_error.as_ref().map(ToString::to_string),
        active_override: state.active_override.as_ref().map(|active| OverrideReport {
            dashboard_url: active.dashboard_url.clone(),
            entity_id: active.entity_id.clone(),
            expires_at: active.expires_at,
        }),
    }
}
