//! MQTT trigger behavior: retained state publishing and discovery wiring.

use std::sync::Arc;

use serde_json::Value;
use wud_triggers::adapter::mqtt::{HassConfiguration, MqttConfiguration, MqttTrigger};
use wud_triggers::testkit::domain::container_with_tag_update;
use wud_triggers::testkit::mqtt::RecordingPublisher;
use wud_triggers::testkit::store::StaticContainerStore;

fn configuration(discovery: bool) -> MqttConfiguration {
    MqttConfiguration {
        url: "mqtt://localhost:1883".into(),
        topic: "wud".into(),
        hass: HassConfiguration {
            enabled: discovery,
            ..HassConfiguration::default()
        },
        ..MqttConfiguration::default()
    }
}

fn trigger_with(
    discovery: bool,
) -> (Arc<RecordingPublisher>, MqttTrigger) {
    let client = Arc::new(RecordingPublisher::new());
    let trigger = MqttTrigger::new(
        configuration(discovery),
        client.clone(),
        Arc::new(StaticContainerStore::empty()),
    )
    .unwrap();
    (client, trigger)
}

#[tokio::test]
async fn trigger_publishes_flattened_retained_state() {
    let (client, trigger) = trigger_with(false);
    trigger
        .trigger(&container_with_tag_update("homeassistant", "local"))
        .await
        .unwrap();

    let published = client.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, "wud/local/homeassistant");
    assert!(published[0].retain);

    let state: Value = serde_json::from_str(&published[0].payload).unwrap();
    assert_eq!(state["name"], "homeassistant");
    assert_eq!(state["watcher"], "local");
    assert_eq!(state["image_tag_value"], "2021.6.4");
    assert_eq!(state["update_kind_kind"], "tag");
    assert_eq!(state["update_kind_local_value"], "1.0.0");
    assert_eq!(state["update_kind_remote_value"], "2.0.0");
    assert_eq!(state["result_tag"], "2.0.0");
    assert_eq!(state["result_link"], "https://test-2.0.0/changelog");
    assert_eq!(state["update_available"], true);
    // Flattening leaves no nested objects behind.
    assert!(state.as_object().unwrap().values().all(|v| !v.is_object()));
}

#[tokio::test]
async fn trigger_with_discovery_registers_and_refreshes_entities() {
    let (client, trigger) = trigger_with(true);
    trigger
        .trigger(&container_with_tag_update("homeassistant", "local"))
        .await
        .unwrap();

    let published = client.published();
    // state + container discovery + 15-message aggregate refresh
    // (the empty store snapshot retracts the per-watcher sensors)
    assert_eq!(published.len(), 17);
    assert_eq!(published[0].topic, "wud/local/homeassistant");
    assert_eq!(
        published[1].topic,
        "homeassistant/update/wud_local_homeassistant/config"
    );
    assert_eq!(
        published[2].topic,
        "homeassistant/sensor/wud_total_count/config"
    );
}

#[tokio::test]
async fn dotted_container_names_are_sanitized_in_the_state_topic() {
    let (client, trigger) = trigger_with(false);
    trigger
        .trigger(&container_with_tag_update("container-1.name", "local"))
        .await
        .unwrap();
    assert_eq!(client.published()[0].topic, "wud/local/container-1-name");
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let err = MqttTrigger::new(
        MqttConfiguration::default(),
        Arc::new(RecordingPublisher::new()),
        Arc::new(StaticContainerStore::empty()),
    )
    .unwrap_err();
    assert!(err.to_string().contains("url is required"));
}

#[test]
fn masked_configuration_redacts_the_password() {
    let client = Arc::new(RecordingPublisher::new());
    let trigger = MqttTrigger::new(
        MqttConfiguration {
            password: Some("password".into()),
            ..configuration(false)
        },
        client,
        Arc::new(StaticContainerStore::empty()),
    )
    .unwrap();
    assert_eq!(
        trigger.masked_configuration().password.as_deref(),
        Some("p******d")
    );
    assert_eq!(trigger.configuration().password.as_deref(), Some("password"));
}
