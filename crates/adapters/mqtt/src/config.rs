//! MQTT connection settings for the statestream bridge.

/// Connection and topic settings.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker hostname or IP.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Client identifier presented to the broker.
    pub client_id: String,
    /// Root of the statestream topic tree.
    pub base_topic: String,
    /// Optional broker credentials.
    pub credentials: Option<(String, String)>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "castkeep".to_string(),
            base_topic: "homeassistant/statestream".to_string(),
            credentials: None,
        }
    }
}
