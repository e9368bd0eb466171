use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, TriggerError};
use crate::port::MqttPublisher;

/// One captured publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

/// Records every publish, in order, for later assertions.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<PublishedMessage>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in publish order.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl MqttPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<()> {
        self.published.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            payload,
            retain,
        });
        Ok(())
    }
}

/// Fails every publish, for error-propagation tests.
#[derive(Default)]
pub struct FailingPublisher;

#[async_trait]
impl MqttPublisher for FailingPublisher {
    async fn publish(&self, _topic: &str, _payload: String, _retain: bool) -> Result<()> {
        Err(TriggerError::Publish("broker unavailable".to_string()))
    }
}
