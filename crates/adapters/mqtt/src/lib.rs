//! # castkeep-adapter-mqtt
//!
//! Entity-state adapter backed by the automation platform's statestream
//! over MQTT.
//!
//! Platforms such as Home Assistant can mirror every entity state onto
//! retained MQTT topics (`<base>/<domain>/<object_id>/state`). This
//! adapter subscribes to that tree, keeps the latest payload per entity
//! in an in-memory store (the [`StateStore`] the resolver reads), and
//! publishes a [`StateChange`] onto the in-process bus whenever a payload
//! differs from the previous one — which is how triggers fire.
//!
//! ## Dependency rule
//! Depends on `castkeep-app` (port traits) and `castkeep-domain` only.

mod config;
mod error;

pub use config::MqttConfig;
pub use error::MqttBridgeError;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};

use castkeep_app::ports::{StateChangePublisher, StateStore};
use castkeep_domain::event::StateChange;

/// How long to wait before polling the connection again after an error.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// In-memory mirror of the statestream. Cheap to clone; all clones share
/// the same map.
#[derive(Debug, Clone, Default)]
pub struct StatestreamStore {
    states: Arc<RwLock<HashMap<String, String>>>,
}

impl StatestreamStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a state, returning the previous one.
    fn insert(&self, entity_id: &str, state: String) -> Option<String> {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity_id.to_string(), state)
    }
}

impl StateStore for StatestreamStore {
    async fn get_state(&self, entity_id: &str) -> Option<String> {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_id)
            .cloned()
    }
}

/// Long-running bridge task: broker connection, subscription, and the
/// receive loop.
pub struct StatestreamBridge<P> {
    config: MqttConfig,
    store: StatestreamStore,
    publisher: P,
}

impl<P: StateChangePublisher> StatestreamBridge<P> {
    /// Create a bridge that fills `store` and publishes changes through
    /// `publisher`.
    pub fn new(config: MqttConfig, store: StatestreamStore, publisher: P) -> Self {
        Self {
            config,
            store,
            publisher,
        }
    }

    /// Connect, subscribe, and pump the statestream forever.
    ///
    /// Connection drops are logged and retried; the loop never gives up.
    ///
    /// # Errors
    ///
    /// Returns [`MqttBridgeError::Subscribe`] only when the initial
    /// subscription cannot even be queued.
    pub async fn run(self) -> Result<(), MqttBridgeError> {
        let mut options =
            MqttOptions::new(&self.config.client_id, &self.config.host, self.config.port);
        options.set_keep_alive(Duration::from_secs(30));
        if let Some((username, password)) = &self.config.credentials {
            options.set_credentials(username, password);
        }

        let (client, mut event_loop) = AsyncClient::new(options, 64);
        let filter = format!("{}/#", self.config.base_topic.trim_end_matches('/'));
        client.subscribe(&filter, QoS::AtLeastOnce).await?;
        tracing::info!(topic = %filter, host = %self.config.host, "subscribed to statestream");

        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.apply(&publish.topic, &publish.payload).await;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "mqtt connection error, retrying");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    /// Apply one statestream message to the store and bus.
    async fn apply(&self, topic: &str, payload: &[u8]) {
        let Some(entity_id) = entity_id_from_topic(&self.config.base_topic, topic) else {
            return;
        };
        let Ok(raw) = std::str::from_utf8(payload) else {
            tracing::debug!(topic, "ignoring non-utf8 statestream payload");
            return;
        };
        let new_state = unquote(raw.trim()).to_string();

        let old_state = self.store.insert(&entity_id, new_state.clone());
        if old_state.as_deref() == Some(new_state.as_str()) {
            return;
        }

        tracing::debug!(entity = %entity_id, from = ?old_state, to = %new_state, "entity state changed");
        let change = StateChange::new(entity_id, old_state, new_state);
        if let Err(err) = self.publisher.publish(change).await {
            tracing::warn!(error = %err, "failed to publish state change");
        }
    }
}

/// Extract an entity id from a statestream topic.
///
/// `<base>/<domain>/<object_id>/state` becomes `<domain>.<object_id>`;
/// attribute topics and anything not under `base` yield `None`.
#[must_use]
pub fn entity_id_from_topic(base: &str, topic: &str) -> Option<String> {
    let rest = topic
        .strip_prefix(base.trim_end_matches('/'))?
        .strip_prefix('/')?;
    let mut parts = rest.split('/');
    let domain = parts.next()?;
    let object_id = parts.next()?;
    let leaf = parts.next()?;
    if leaf != "state" || parts.next().is_some() || domain.is_empty() || object_id.is_empty() {
        return None;
    }
    Some(format!("{domain}.{object_id}"))
}

/// Statestream payloads may carry JSON-quoted strings; strip one layer.
fn unquote(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use castkeep_domain::error::CastKeepError;

    const BASE: &str = "homeassistant/statestream";

    // ── Spy publisher ──────────────────────────────────────────────

    #[derive(Clone, Default)]
    struct SpyPublisher {
        changes: Arc<Mutex<Vec<StateChange>>>,
    }

    impl StateChangePublisher for SpyPublisher {
        async fn publish(&self, change: StateChange) -> Result<(), CastKeepError> {
            self.changes.lock().unwrap().push(change);
            Ok(())
        }
    }

    fn bridge(publisher: &SpyPublisher) -> (StatestreamBridge<SpyPublisher>, StatestreamStore) {
        let store = StatestreamStore::new();
        let bridge = StatestreamBridge::new(MqttConfig::default(), store.clone(), publisher.clone());
        (bridge, store)
    }

    // ── Topic parsing ──────────────────────────────────────────────

    #[test]
    fn should_extract_entity_id_from_state_topic() {
        assert_eq!(
            entity_id_from_topic(BASE, "homeassistant/statestream/binary_sensor/doorbell/state"),
            Some("binary_sensor.doorbell".to_string())
        );
    }

    #[test]
    fn should_ignore_attribute_topics() {
        assert_eq!(
            entity_id_from_topic(
                BASE,
                "homeassistant/statestream/light/kitchen/brightness"
            ),
            None
        );
        assert_eq!(
            entity_id_from_topic(
                BASE,
                "homeassistant/statestream/light/kitchen/attributes/friendly_name"
            ),
            None
        );
    }

    #[test]
    fn should_ignore_topics_outside_the_base() {
        assert_eq!(entity_id_from_topic(BASE, "zigbee2mqtt/kitchen/state"), None);
        assert_eq!(entity_id_from_topic(BASE, "homeassistant/statestream"), None);
    }

    #[test]
    fn should_accept_base_with_trailing_slash() {
        assert_eq!(
            entity_id_from_topic(
                "homeassistant/statestream/",
                "homeassistant/statestream/switch/heater/state"
            ),
            Some("switch.heater".to_string())
        );
    }

    // ── Store & change publication ─────────────────────────────────

    #[tokio::test]
    async fn should_store_state_and_publish_change() {
        let publisher = SpyPublisher::default();
        let (bridge, store) = bridge(&publisher);

        bridge
            .apply("homeassistant/statestream/binary_sensor/doorbell/state", b"on")
            .await;

        assert_eq!(
            store.get_state("binary_sensor.doorbell").await,
            Some("on".to_string())
        );
        let changes = publisher.changes.lock().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].entity_id, "binary_sensor.doorbell");
        assert_eq!(changes[0].old_state, None);
        assert_eq!(changes[0].new_state, "on");
    }

    #[tokio::test]
    async fn should_not_publish_when_state_unchanged() {
        let publisher = SpyPublisher::default();
        let (bridge, _store) = bridge(&publisher);

        let topic = "homeassistant/statestream/binary_sensor/doorbell/state";
        bridge.apply(topic, b"on").await;
        bridge.apply(topic, b"on").await;

        assert_eq!(publisher.changes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_publish_transition_with_old_state() {
        let publisher = SpyPublisher::default();
        let (bridge, _store) = bridge(&publisher);

        let topic = "homeassistant/statestream/binary_sensor/doorbell/state";
        bridge.apply(topic, b"off").await;
        bridge.apply(topic, b"on").await;

        let changes = publisher.changes.lock().unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].old_state.as_deref(), Some("off"));
        assert_eq!(changes[1].new_state, "on");
    }

    #[tokio::test]
    async fn should_strip_json_quotes_from_payload() {
        let publisher = SpyPublisher::default();
        let (bridge, store) = bridge(&publisher);

        bridge
            .apply("homeassistant/statestream/sensor/house_mode/state", b"\"guests\"")
            .await;

        assert_eq!(
            store.get_state("sensor.house_mode").await,
            Some("guests".to_string())
        );
    }

    #[tokio::test]
    async fn should_ignore_non_state_topics_entirely() {
        let publisher = SpyPublisher::default();
        let (bridge, store) = bridge(&publisher);

        bridge
            .apply("homeassistant/statestream/light/kitchen/brightness", b"128")
            .await;

        assert_eq!(store.get_state("light.kitchen").await, None);
        assert!(publisher.changes.lock().unwrap().is_empty());
    }
}
