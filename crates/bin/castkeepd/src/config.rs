//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `castkeep.toml` in the working directory. Every ambient field
//! has a sensible default so a minimal file only declares devices. The
//! loosely-shaped tables are converted eagerly into validated domain
//! structures at startup; anything malformed is a fatal
//! [`ConfigurationError`], never a lazy failure during scheduling.

use serde::Deserialize;

use castkeep_adapter_mqtt::MqttConfig;
use castkeep_domain::device::{DashboardWindow, Device};
use castkeep_domain::error::{ConfigurationError, ValidationError};
use castkeep_domain::gate::{EntityGate, GlobalGate};
use castkeep_domain::time::TimeWindow;
use castkeep_domain::trigger::StateTrigger;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Scheduler and global-gate settings.
    pub casting: CastingConfig,
    /// Cast transport settings.
    pub catt: CattConfig,
    /// Statestream bridge settings.
    pub mqtt: MqttSectionConfig,
    /// Devices to keep casting.
    pub devices: Vec<DeviceConfig>,
    /// Entity-triggered overrides.
    pub triggers: Vec<TriggerConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Scheduler cadence and the global casting window.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CastingConfig {
    /// Seconds between full device sweeps.
    pub interval_secs: u64,
    /// Maximum devices processed concurrently within one sweep.
    pub worker_limit: usize,
    /// Deadline in seconds for one device's probe-decide-act sequence.
    pub device_timeout_secs: u64,
    /// Global window start, `HH:MM`. Also the default for device windows.
    pub start_time: String,
    /// Global window end, `HH:MM`. May wrap past midnight.
    pub end_time: String,
    /// Optional global switch entity; empty means always enabled.
    pub switch_entity: String,
    /// State the switch entity must be in.
    pub switch_state: String,
}

/// Cast transport configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CattConfig {
    /// Binary to invoke; resolved through `PATH` unless absolute.
    pub binary: String,
    /// Per-command deadline in seconds.
    pub timeout_secs: u64,
}

/// Statestream bridge configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MqttSectionConfig {
    /// Whether to connect to a broker at all.
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub base_topic: String,
    /// Optional broker credentials; empty means anonymous.
    pub username: String,
    pub password: String,
}

/// One device table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub name: String,
    /// Dashboard windows in declaration (= precedence) order.
    pub dashboards: Vec<DashboardConfig>,
    /// Device-wide volume (0-100).
    pub volume: Option<u8>,
    /// Optional device gate; empty means ungated.
    pub switch_entity: String,
    pub switch_state: String,
    pub speaker_groups: Vec<String>,
}

/// One dashboard window table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub url: String,
    /// `HH:MM`; defaults to the global casting window.
    pub start_time: String,
    pub end_time: String,
    pub volume: Option<u8>,
    /// Title marker identifying this dashboard in status output.
    pub state_marker: String,
    /// Optional per-window gate; empty means ungated.
    pub switch_entity: String,
    pub switch_state: String,
}

/// One trigger table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub device: String,
    pub entity: String,
    pub to_state: String,
    pub url: String,
    pub timeout_secs: Option<u64>,
    pub force_cast: bool,
}

/// The validated, domain-level casting plan.
#[derive(Debug, Clone)]
pub struct CastingPlan {
    pub devices: Vec<Device>,
    pub triggers: Vec<StateTrigger>,
    pub global_gate: GlobalGate,
}

impl Config {
    /// Load configuration from `castkeep.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("castkeep.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CASTKEEP_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("CASTKEEP_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("CASTKEEP_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("CASTKEEP_MQTT_HOST") {
            self.mqtt.host = val;
        }
        if let Ok(val) = std::env::var("CASTKEEP_CATT_BIN") {
            self.catt.binary = val;
        }
        if let Ok(val) = std::env::var("CASTKEEP_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.casting.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "casting.interval_secs must be non-zero".to_string(),
            ));
        }
        if self.casting.worker_limit == 0 {
            return Err(ConfigError::Validation(
                "casting.worker_limit must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Broker settings for the statestream bridge.
    #[must_use]
    pub fn mqtt_config(&self) -> MqttConfig {
        let credentials = if self.mqtt.username.is_empty() {
            None
        } else {
            Some((self.mqtt.username.clone(), self.mqtt.password.clone()))
        };
        MqttConfig {
            host: self.mqtt.host.clone(),
            port: self.mqtt.port,
            client_id: self.mqtt.client_id.clone(),
            base_topic: self.mqtt.base_topic.clone(),
            credentials,
        }
    }

    /// Convert the loose TOML tables into the validated domain plan.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] naming the offending device or
    /// trigger for any malformed window, volume, URL, or reference.
    pub fn casting_plan(&self) -> Result<CastingPlan, ConfigurationError> {
        let global_window = TimeWindow::parse(&self.casting.start_time, &self.casting.end_time)
            .map_err(|source| ConfigurationError::Global { source })?;
        let global_entity_gate = optional_gate(
            &self.casting.switch_entity,
            &self.casting.switch_state,
        )
        .map_err(|source| ConfigurationError::Global { source })?;
        let global_gate = GlobalGate::new(global_window, global_entity_gate);

        let mut devices = Vec::with_capacity(self.devices.len());
        for device_config in &self.devices {
            devices.push(self.device_from(device_config)?);
        }

        let mut triggers = Vec::with_capacity(self.triggers.len());
        for trigger_config in &self.triggers {
            let trigger = trigger_from(trigger_config)?;
            if !devices.iter().any(|device| device.name == trigger.device) {
                return Err(ConfigurationError::Trigger {
                    device: trigger.device.clone(),
                    reason: "references an undeclared device".to_string(),
                });
            }
            triggers.push(trigger);
        }

        Ok(CastingPlan {
            devices,
            triggers,
            global_gate,
        })
    }

    fn device_from(&self, config: &DeviceConfig) -> Result<Device, ConfigurationError> {
        let wrap = |source: ValidationError| ConfigurationError::Device {
            device: config.name.clone(),
            source,
        };

        let mut builder = Device::builder().name(&config.name);
        for dashboard in &config.dashboards {
            // device windows inherit the global casting window by default
            let start = non_empty_or(&dashboard.start_time, &self.casting.start_time);
            let end = non_empty_or(&dashboard.end_time, &self.casting.end_time);
            let window = TimeWindow::parse(start, end).map_err(wrap)?;

            let mut entry = DashboardWindow::new(&dashboard.url, window);
            if let Some(volume) = dashboard.volume {
                entry = entry.with_volume(volume);
            }
            if !dashboard.state_marker.is_empty() {
                entry = entry.with_state_marker(&dashboard.state_marker);
            }
            if let Some(gate) =
                optional_gate(&dashboard.switch_entity, &dashboard.switch_state).map_err(wrap)?
            {
                entry = entry.with_gate(gate);
            }
            builder = builder.window(entry);
        }

        if let Some(volume) = config.volume {
            builder = builder.volume(volume);
        }
        if let Some(gate) =
            optional_gate(&config.switch_entity, &config.switch_state).map_err(wrap)?
        {
            builder = builder.gate(gate);
        }
        for group in &config.speaker_groups {
            builder = builder.speaker_group(group);
        }

        builder.build().map_err(wrap)
    }
}

fn trigger_from(config: &TriggerConfig) -> Result<StateTrigger, ConfigurationError> {
    let mut trigger = StateTrigger::new(
        &config.device,
        &config.entity,
        &config.to_state,
        &config.url,
    );
    if let Some(seconds) = config.timeout_secs {
        trigger = trigger.with_timeout(seconds);
    }
    if config.force_cast {
        trigger = trigger.with_force_cast();
    }
    trigger
        .validate()
        .map_err(|source| ConfigurationError::Trigger {
            device: config.device.clone(),
            reason: source.to_string(),
        })?;
    Ok(trigger)
}

fn optional_gate(entity: &str, state: &str) -> Result<Option<EntityGate>, ValidationError> {
    if entity.is_empty() {
        return Ok(None);
    }
    let required = if state.is_empty() { "on" } else { state };
    EntityGate::new(entity, required).map(Some)
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "castkeepd=info,castkeep=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for CastingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            worker_limit: 4,
            device_timeout_secs: 20,
            start_time: "07:00".to_string(),
            end_time: "01:00".to_string(),
            switch_entity: String::new(),
            switch_state: "on".to_string(),
        }
    }
}

impl Default for CattConfig {
    fn default() -> Self {
        Self {
            binary: "catt".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for MqttSectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 1883,
            client_id: "castkeep".to_string(),
            base_topic: "homeassistant/statestream".to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_TOML: &str = r#"
        [server]
        host = '127.0.0.1'
        port = 9090

        [logging]
        filter = 'debug'

        [casting]
        interval_secs = 45
        start_time = '06:30'
        end_time = '23:00'
        switch_entity = 'input_boolean.casting'

        [catt]
        binary = '/usr/local/bin/catt'
        timeout_secs = 15

        [mqtt]
        enabled = true
        host = 'broker.local'
        username = 'castkeep'
        password = 'secret'

        [[devices]]
        name = 'Kitchen display'
        volume = 40
        speaker_groups = ['downstairs']

        [[devices.dashboards]]
        url = 'http://hub.local:8123/kiosk/morning'
        start_time = '07:00'
        end_time = '12:00'

        [[devices.dashboards]]
        url = 'http://hub.local:8123/kiosk/evening'
        state_marker = 'Evening Board'

        [[triggers]]
        device = 'Kitchen display'
        entity = 'binary_sensor.doorbell'
        to_state = 'on'
        url = 'http://hub.local:8123/kiosk/door-camera'
        timeout_secs = 60
        force_cast = true
    "#;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.casting.interval_secs, 30);
        assert_eq!(config.casting.start_time, "07:00");
        assert_eq!(config.casting.end_time, "01:00");
        assert_eq!(config.catt.binary, "catt");
        assert!(!config.mqtt.enabled);
        assert!(config.devices.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.devices.is_empty());
    }

    #[test]
    fn should_parse_full_toml() {
        let config: Config = toml::from_str(FULL_TOML).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.casting.interval_secs, 45);
        assert_eq!(config.catt.binary, "/usr/local/bin/catt");
        assert!(config.mqtt.enabled);
        assert_eq!(config.devices.len(), 1);
        assert_eq!(config.devices[0].dashboards.len(), 2);
        assert_eq!(config.triggers.len(), 1);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_interval() {
        let mut config = Config::default();
        config.casting.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_format_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    // ── Domain conversion ──────────────────────────────────────────

    #[test]
    fn should_convert_full_toml_into_casting_plan() {
        let config: Config = toml::from_str(FULL_TOML).unwrap();
        let plan = config.casting_plan().unwrap();

        assert_eq!(plan.devices.len(), 1);
        let kitchen = &plan.devices[0];
        assert_eq!(kitchen.name, "Kitchen display");
        assert_eq!(kitchen.volume, Some(40));
        assert_eq!(kitchen.speaker_groups, vec!["downstairs".to_string()]);
        assert_eq!(kitchen.windows.len(), 2);
        assert_eq!(kitchen.windows[1].state_marker, "Evening Board");

        assert_eq!(plan.triggers.len(), 1);
        assert_eq!(plan.triggers[0].timeout, Some(60));
        assert!(plan.triggers[0].force_cast);

        assert_eq!(
            plan.global_gate.gate.as_ref().unwrap().entity_id,
            "input_boolean.casting"
        );
    }

    #[test]
    fn should_default_dashboard_window_to_global_casting_window() {
        let config: Config = toml::from_str(FULL_TOML).unwrap();
        let plan = config.casting_plan().unwrap();
        let evening = &plan.devices[0].windows[1];
        assert_eq!(evening.window, TimeWindow::parse("06:30", "23:00").unwrap());
    }

    #[test]
    fn should_reject_malformed_device_window() {
        let toml = r#"
            [[devices]]
            name = 'Kitchen display'

            [[devices.dashboards]]
            url = 'http://hub.local:8123/kiosk'
            start_time = 'sunrise'
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.casting_plan().unwrap_err();
        assert!(matches!(err, ConfigurationError::Device { .. }));
        assert!(err.to_string().contains("Kitchen display"));
    }

    #[test]
    fn should_reject_device_without_dashboards() {
        let toml = r"
            [[devices]]
            name = 'Bare device'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(
            config.casting_plan().unwrap_err(),
            ConfigurationError::Device { .. }
        ));
    }

    #[test]
    fn should_reject_trigger_for_undeclared_device() {
        let toml = r#"
            [[triggers]]
            device = 'Ghost device'
            entity = 'binary_sensor.doorbell'
            to_state = 'on'
            url = 'http://hub.local:8123/kiosk'
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.casting_plan().unwrap_err();
        assert!(matches!(err, ConfigurationError::Trigger { .. }));
        assert!(err.to_string().contains("Ghost device"));
    }

    #[test]
    fn should_build_mqtt_config_with_credentials() {
        let config: Config = toml::from_str(FULL_TOML).unwrap();
        let mqtt = config.mqtt_config();
        assert_eq!(mqtt.host, "broker.local");
        assert_eq!(
            mqtt.credentials,
            Some(("castkeep".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn should_build_anonymous_mqtt_config_without_username() {
        let config = Config::default();
        assert!(config.mqtt_config().credentials.is_none());
    }
}
