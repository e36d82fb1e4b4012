//! Errors raised while setting up the MQTT bridge.

/// Bridge setup failure. Connection drops after setup are retried
/// internally and never surface as errors.
#[derive(Debug, thiserror::Error)]
pub enum MqttBridgeError {
    /// Subscribing to the statestream topics failed.
    #[error("failed to subscribe to statestream topics")]
    Subscribe(#[from] rumqttc::ClientError),
}
