//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the seams between the triggers and the transports they
//! publish through. Adapters receive them as injected `Arc<dyn …>`
//! handles; connection lifecycle (MQTT event loop, HTTP pooling) stays
//! with the implementation behind the trait.
//!
//! # Available ports
//!
//! - [`MqttPublisher`] — retained/plain publishes to an MQTT broker
//! - [`ChatClient`] — chat-API message posting (Slack)
//! - [`ContainerStore`] — snapshot of the watched containers, feeding
//!   the aggregate discovery sensors

mod chat;
mod mqtt;
mod store;

pub use chat::{ChatClient, PostedMessage};
pub use mqtt::MqttPublisher;
pub use store::ContainerStore;
