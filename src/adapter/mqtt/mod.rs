//! MQTT trigger: retained container state plus Home Assistant discovery.
//!
//! Container updates are published as retained JSON to a per-container
//! state topic (`<root>/<watcher>/<container>`). The payload is the
//! serialized container with its keys flattened (`_`-joined, snake_case
//! segments) so Home Assistant value templates can address them as
//! `value_json.image_tag_value`, `value_json.update_kind_kind`, …
//! When discovery is enabled, [`HassDiscovery`] keeps the matching
//! entities registered.

use std::env;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::Url;

use crate::adapter::mask;
use crate::domain::Container;
use crate::error::{Result, ValidationError, Violation};
use crate::port::{ContainerStore, MqttPublisher};

mod hass;

pub use hass::{DiscoveryMessage, EntityDomain, HassDiscovery};

fn default_topic() -> String {
    "wud".to_string()
}

fn default_prefix() -> String {
    "homeassistant".to_string()
}

/// MQTT trigger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfiguration {
    /// Broker URL (`mqtt://` or `mqtts://`).
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Root of the state topic namespace.
    pub topic: String,
    pub hass: HassConfiguration,
}

impl Default for MqttConfiguration {
    fn default() -> Self {
        Self {
            url: String::new(),
            user: None,
            password: None,
            topic: default_topic(),
            hass: HassConfiguration::default(),
        }
    }
}

/// Home Assistant auto-discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HassConfiguration {
    pub enabled: bool,
    /// Discovery topic prefix Home Assistant subscribes to.
    pub prefix: String,
}

impl Default for HassConfiguration {
    fn default() -> Self {
        Self {
            enabled: false,
            prefix: default_prefix(),
        }
    }
}

impl MqttConfiguration {
    /// Check every constraint, collecting all failures.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut violations = Vec::new();
        if self.url.is_empty() {
            violations.push(Violation::required("url"));
        } else {
            match Url::parse(&self.url) {
                Ok(url) if matches!(url.scheme(), "mqtt" | "mqtts") => {}
                Ok(url) => violations.push(Violation::new(
                    "url",
                    format!("scheme must be mqtt or mqtts (got `{}`)", url.scheme()),
                )),
                Err(e) => violations.push(Violation::new("url", e.to_string())),
            }
        }
        if self.topic.is_empty() {
            violations.push(Violation::required("topic"));
        }
        if self.hass.prefix.is_empty() {
            violations.push(Violation::required("hass.prefix"));
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations))
        }
    }

    /// Copy of the configuration safe for logging: password redacted.
    pub fn masked(&self) -> Self {
        Self {
            password: self.password.as_deref().map(mask),
            ..self.clone()
        }
    }

    /// Build a configuration from `WUD_TRIGGER_MQTT_*` environment
    /// variables; unset variables keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env::var("WUD_TRIGGER_MQTT_URL").unwrap_or(defaults.url),
            user: env::var("WUD_TRIGGER_MQTT_USER").ok(),
            password: env::var("WUD_TRIGGER_MQTT_PASSWORD").ok(),
            topic: env::var("WUD_TRIGGER_MQTT_TOPIC").unwrap_or(defaults.topic),
            hass: HassConfiguration {
                enabled: env::var("WUD_TRIGGER_MQTT_HASS_ENABLED")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(defaults.hass.enabled),
                prefix: env::var("WUD_TRIGGER_MQTT_HASS_PREFIX").unwrap_or(defaults.hass.prefix),
            },
        }
    }
}

/// Lowercase a topic segment and turn `.`/whitespace into `-`.
pub(crate) fn normalize_segment(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c == '.' || c.is_whitespace() { '-' } else { c })
        .collect()
}

/// State topic for a container: `<root>/<watcher>/<container>`.
pub(crate) fn container_state_topic(root: &str, container: &Container) -> String {
    format!(
        "{root}/{}/{}",
        normalize_segment(&container.watcher),
        normalize_segment(&container.name)
    )
}

/// Flatten a JSON object into `_`-joined snake_case keys
/// (`image.tag.value` → `image_tag_value`). Arrays are kept as values.
pub(crate) fn flatten(value: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    if let Value::Object(map) = value {
        for (key, nested) in map {
            flatten_into(&mut out, &snake_case(key), nested);
        }
    }
    out
}

fn flatten_into(out: &mut Map<String, Value>, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(out, &format!("{prefix}_{}", snake_case(key)), nested);
            }
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        if c.is_uppercase() {
            out.push('_');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Publishes container update state over MQTT and, when enabled, keeps
/// the Home Assistant discovery entities in sync.
pub struct MqttTrigger {
    configuration: MqttConfiguration,
    client: Arc<dyn MqttPublisher>,
    hass: Option<HassDiscovery>,
}

impl std::fmt::Debug for MqttTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttTrigger")
            .field("configuration", &self.configuration)
            .field("discovery", &self.hass.is_some())
            .finish()
    }
}

impl MqttTrigger {
    /// Validate the configuration and assemble the trigger around an
    /// already-connected publish client.
    pub fn new(
        configuration: MqttConfiguration,
        client: Arc<dyn MqttPublisher>,
        store: Arc<dyn ContainerStore>,
    ) -> Result<Self> {
        configuration.validate()?;
        let hass = configuration.hass.enabled.then(|| {
            HassDiscovery::new(configuration.clone(), Arc::clone(&client), Arc::clone(&store))
        });
        info!(
            topic = %configuration.topic,
            discovery = configuration.hass.enabled,
            "mqtt trigger initialized"
        );
        Ok(Self {
            configuration,
            client,
            hass,
        })
    }

    pub fn configuration(&self) -> &MqttConfiguration {
        &self.configuration
    }

    pub fn masked_configuration(&self) -> MqttConfiguration {
        self.configuration.masked()
    }

    /// The discovery adapter, when `hass.enabled` is set.
    pub fn hass(&self) -> Option<&HassDiscovery> {
        self.hass.as_ref()
    }

    /// Publish the container's flattened state, retained, then refresh
    /// its discovery entities.
    pub async fn trigger(&self, container: &Container) -> Result<()> {
        let topic = container_state_topic(&self.configuration.topic, container);
        let state = flatten(&serde_json::to_value(container)?);
        let payload = serde_json::to_string(&Value::Object(state))?;
        debug!(topic = %topic, "publishing container state");
        self.client.publish(&topic, payload, true).await?;
        if let Some(hass) = &self.hass {
            hass.add_container_sensor(container).await?;
            hass.update_container_sensors(container).await?;
        }
        Ok(())
    }

    /// Sequentially publish a batch of container updates.
    pub async fn trigger_batch(&self, containers: &[Container]) -> Result<()> {
        for container in containers {
            self.trigger(container).await?;
        }
        Ok(())
    }
}
