//! Home Assistant MQTT auto-discovery.
//!
//! Home Assistant configures entities from retained JSON payloads
//! published under `<prefix>/<domain>/<entity>/config`; publishing `{}`
//! to the same topic retracts the entity. Topic names, payload key
//! order and the publish sequence of [`update_container_sensors`] are
//! external contracts consumed by running Home Assistant installations
//! and must stay byte-stable.
//!
//! [`update_container_sensors`]: HassDiscovery::update_container_sensors

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::adapter::mqtt::{container_state_topic, normalize_segment, MqttConfiguration};
use crate::domain::{Container, Watcher};
use crate::error::Result;
use crate::port::{ContainerStore, MqttPublisher};

const DEFAULT_ICON: &str = "mdi:docker";
const ENTITY_PICTURE: &str =
    "https://github.com/getwud/wud/raw/main/docs/assets/wud-logo-256.png";
const SW_VERSION: &str = "unknown";

const VALUE_TEMPLATE: &str = "{{ value_json.image_tag_value }}";
const LATEST_VERSION_TEMPLATE: &str = "{% if value_json.update_kind_kind == \"digest\" %}\
{{ value_json.result_digest[:15] }}{% else %}{{ value_json.result_tag }}{% endif %}";

/// Home Assistant entity domain an entity is discovered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityDomain {
    Sensor,
    BinarySensor,
    Update,
}

impl EntityDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
            Self::BinarySensor => "binary_sensor",
            Self::Update => "update",
        }
    }
}

/// A discovery publish before serialization.
///
/// `unique_id`/`object_id` are not settable: they derive from the state
/// topic so that entity identity stays a pure function of the topic
/// namespace.
pub struct DiscoveryMessage<'a> {
    pub discovery_topic: String,
    pub state_topic: &'a str,
    /// Display name of the entity.
    pub name: &'a str,
    /// Material Design icon; defaults to the docker icon.
    pub icon: Option<&'a str>,
    /// Variant-specific payload fields, appended in insertion order.
    pub options: Map<String, Value>,
}

#[derive(Serialize)]
struct DeviceBlock {
    identifiers: [&'static str; 1],
    manufacturer: &'static str,
    model: &'static str,
    name: &'static str,
    sw_version: &'static str,
}

impl DeviceBlock {
    fn wud() -> Self {
        Self {
            identifiers: ["wud"],
            manufacturer: "wud",
            model: "wud",
            name: "wud",
            sw_version: SW_VERSION,
        }
    }
}

/// Field order here is the serialized key order Home Assistant sees; it
/// is part of the retained-payload contract. Options flatten last, in
/// their insertion order.
#[derive(Serialize)]
struct DiscoveryPayload<'a> {
    unique_id: &'a str,
    object_id: &'a str,
    name: &'a str,
    device: DeviceBlock,
    icon: &'a str,
    entity_picture: &'static str,
    state_topic: &'a str,
    #[serde(flatten)]
    options: &'a Map<String, Value>,
}

/// Entity id for a state topic: lowercased, `/` and whitespace → `_`.
fn hass_entity_id(state_topic: &str) -> String {
    state_topic
        .to_lowercase()
        .chars()
        .map(|c| if c == '/' || c.is_whitespace() { '_' } else { c })
        .collect()
}

fn binary_sensor_options() -> Map<String, Value> {
    let mut options = Map::new();
    options.insert("payload_on".into(), "true".into());
    options.insert("payload_off".into(), "false".into());
    options
}

/// Publishes and retracts the virtual wud entities (per-container update
/// sensors, per-watcher and global aggregates) through retained MQTT
/// discovery messages.
///
/// Stateless: everything is recomputed from the configuration, the
/// container/watcher at hand and the [`ContainerStore`] snapshot.
pub struct HassDiscovery {
    configuration: MqttConfiguration,
    client: Arc<dyn MqttPublisher>,
    store: Arc<dyn ContainerStore>,
}

impl HassDiscovery {
    pub fn new(
        configuration: MqttConfiguration,
        client: Arc<dyn MqttPublisher>,
        store: Arc<dyn ContainerStore>,
    ) -> Self {
        Self {
            configuration,
            client,
            store,
        }
    }

    /// Serialize and publish a discovery message, retained.
    pub async fn publish_discovery_message(&self, message: DiscoveryMessage<'_>) -> Result<()> {
        let payload =
            discovery_payload(message.state_topic, message.name, message.icon, &message.options)?;
        debug!(topic = %message.discovery_topic, "publishing discovery message");
        self.client
            .publish(&message.discovery_topic, payload, true)
            .await
    }

    /// Register the container's update entity (`update` domain).
    pub async fn add_container_sensor(&self, container: &Container) -> Result<()> {
        let state_topic = container_state_topic(&self.configuration.topic, container);
        let entity_id = hass_entity_id(&state_topic);
        let mut options = Map::new();
        options.insert("force_update".into(), Value::Bool(true));
        options.insert("value_template".into(), VALUE_TEMPLATE.into());
        options.insert("latest_version_topic".into(), state_topic.clone().into());
        options.insert("latest_version_template".into(), LATEST_VERSION_TEMPLATE.into());
        options.insert("json_attributes_topic".into(), state_topic.clone().into());
        self.publish_discovery_message(DiscoveryMessage {
            discovery_topic: self.discovery_topic(EntityDomain::Update, &state_topic),
            state_topic: &state_topic,
            name: &entity_id,
            icon: Some(&container.display_icon),
            options,
        })
        .await
    }

    /// Retract the container's update entity by publishing a retained
    /// empty object to its discovery topic.
    pub async fn remove_container_sensor(&self, container: &Container) -> Result<()> {
        let state_topic = container_state_topic(&self.configuration.topic, container);
        let discovery_topic = self.discovery_topic(EntityDomain::Update, &state_topic);
        debug!(topic = %discovery_topic, "removing container sensor");
        self.client
            .publish(&discovery_topic, "{}".to_string(), true)
            .await
    }

    /// Refresh the aggregate sensors after a container changed.
    ///
    /// The publish sequence is a fixed contract (Home Assistant replays
    /// retained messages in delivery order): discovery for the three
    /// global aggregates, discovery for the three per-watcher
    /// aggregates, the six state values in the same order, then the
    /// per-watcher discovery retractions when the watcher no longer has
    /// containers. The full ordered list is built up front and published
    /// strictly sequentially so refactors cannot reorder it.
    pub async fn update_container_sensors(&self, container: &Container) -> Result<()> {
        let root = &self.configuration.topic;
        let watcher = normalize_segment(&container.watcher);
        let total_count_topic = format!("{root}/total_count");
        let update_count_topic = format!("{root}/update_count");
        let update_status_topic = format!("{root}/update_status");
        let watcher_total_count_topic = format!("{root}/{watcher}/total_count");
        let watcher_update_count_topic = format!("{root}/{watcher}/update_count");
        let watcher_update_status_topic = format!("{root}/{watcher}/update_status");

        let containers = self.store.containers();
        let update_count = containers.iter().filter(|c| c.update_available).count();
        let watcher_containers: Vec<&Container> = containers
            .iter()
            .filter(|c| c.watcher == container.watcher)
            .collect();
        let watcher_update_count = watcher_containers
            .iter()
            .filter(|c| c.update_available)
            .count();

        let mut messages: Vec<(String, String)> = vec![
            (
                self.discovery_topic(EntityDomain::Sensor, &total_count_topic),
                discovery_payload(&total_count_topic, "Total container count", None, &Map::new())?,
            ),
            (
                self.discovery_topic(EntityDomain::Sensor, &update_count_topic),
                discovery_payload(
                    &update_count_topic,
                    "Total container update count",
                    None,
                    &Map::new(),
                )?,
            ),
            (
                self.discovery_topic(EntityDomain::BinarySensor, &update_status_topic),
                discovery_payload(
                    &update_status_topic,
                    "Total container update status",
                    None,
                    &binary_sensor_options(),
                )?,
            ),
            (
                self.discovery_topic(EntityDomain::Sensor, &watcher_total_count_topic),
                discovery_payload(
                    &watcher_total_count_topic,
                    &format!("Watcher {} container count", container.watcher),
                    None,
                    &Map::new(),
                )?,
            ),
            (
                self.discovery_topic(EntityDomain::Sensor, &watcher_update_count_topic),
                discovery_payload(
                    &watcher_update_count_topic,
                    &format!("Watcher {} container update count", container.watcher),
                    None,
                    &Map::new(),
                )?,
            ),
            (
                self.discovery_topic(EntityDomain::BinarySensor, &watcher_update_status_topic),
                discovery_payload(
                    &watcher_update_status_topic,
                    &format!("Watcher {} container update status", container.watcher),
                    None,
                    &binary_sensor_options(),
                )?,
            ),
            (total_count_topic, containers.len().to_string()),
            (update_count_topic, update_count.to_string()),
            (update_status_topic, (update_count > 0).to_string()),
            (
                watcher_total_count_topic.clone(),
                watcher_containers.len().to_string(),
            ),
            (
                watcher_update_count_topic.clone(),
                watcher_update_count.to_string(),
            ),
            (
                watcher_update_status_topic.clone(),
                (watcher_update_count > 0).to_string(),
            ),
        ];

        if watcher_containers.is_empty() {
            messages.push((
                self.discovery_topic(EntityDomain::Sensor, &watcher_total_count_topic),
                "{}".to_string(),
            ));
            messages.push((
                self.discovery_topic(EntityDomain::Sensor, &watcher_update_count_topic),
                "{}".to_string(),
            ));
            messages.push((
                self.discovery_topic(EntityDomain::BinarySensor, &watcher_update_status_topic),
                "{}".to_string(),
            ));
        }

        for (topic, payload) in messages {
            self.client.publish(&topic, payload, true).await?;
        }
        Ok(())
    }

    /// Publish the watcher's running entity and its current state.
    pub async fn update_watcher_sensors(&self, watcher: &Watcher) -> Result<()> {
        let state_topic = format!(
            "{}/{}/running",
            self.configuration.topic,
            normalize_segment(&watcher.name)
        );
        self.publish_discovery_message(DiscoveryMessage {
            discovery_topic: self.discovery_topic(EntityDomain::BinarySensor, &state_topic),
            state_topic: &state_topic,
            name: &format!("Watcher {} running status", watcher.name),
            icon: None,
            options: binary_sensor_options(),
        })
        .await?;
        self.client
            .publish(&state_topic, watcher.running.to_string(), true)
            .await
    }

    /// `<prefix>/<domain>/<entityId>/config`
    fn discovery_topic(&self, domain: EntityDomain, state_topic: &str) -> String {
        format!(
            "{}/{}/{}/config",
            self.configuration.hass.prefix,
            domain.as_str(),
            hass_entity_id(state_topic)
        )
    }
}

fn discovery_payload(
    state_topic: &str,
    name: &str,
    icon: Option<&str>,
    options: &Map<String, Value>,
) -> Result<String> {
    let entity_id = hass_entity_id(state_topic);
    Ok(serde_json::to_string(&DiscoveryPayload {
        unique_id: &entity_id,
        object_id: &entity_id,
        name,
        device: DeviceBlock::wud(),
        icon: icon.unwrap_or(DEFAULT_ICON),
        entity_picture: ENTITY_PICTURE,
        state_topic,
        options,
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_replaces_separators_with_underscores() {
        assert_eq!(hass_entity_id("my/state"), "my_state");
        assert_eq!(
            hass_entity_id("topic/watcher-name/container-1-name"),
            "topic_watcher-name_container-1-name"
        );
        assert_eq!(hass_entity_id("My State"), "my_state");
    }

    #[test]
    fn entity_domains_map_to_ha_names() {
        assert_eq!(EntityDomain::Sensor.as_str(), "sensor");
        assert_eq!(EntityDomain::BinarySensor.as_str(), "binary_sensor");
        assert_eq!(EntityDomain::Update.as_str(), "update");
    }

    #[test]
    fn payload_keys_keep_contract_order() {
        let payload = discovery_payload("my/state", "My state", None, &Map::new()).unwrap();
        assert!(payload.starts_with(
            "{\"unique_id\":\"my_state\",\"object_id\":\"my_state\",\"name\":\"My state\",\"device\":"
        ));
        assert!(payload.ends_with("\"state_topic\":\"my/state\"}"));
    }
}
