use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS};

use crate::error::{Result, TriggerError};

/// Minimal publish surface of an MQTT connection.
///
/// The triggers only ever publish; subscriptions, reconnects and the
/// event loop belong to the embedding application. Implemented for
/// [`rumqttc::AsyncClient`] so a connected client slots straight in.
#[async_trait]
pub trait MqttPublisher: Send + Sync {
    /// Publish `payload` to `topic`, retained when `retain` is set.
    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<()>;
}

#[async_trait]
impl MqttPublisher for AsyncClient {
    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<()> {
        AsyncClient::publish(self, topic, QoS::AtLeastOnce, retain, payload)
            .await
            .map_err(|e| TriggerError::Publish(e.to_string()))
    }
}
