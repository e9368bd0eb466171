//! wud-triggers - Notification triggers for the wud container update
//! watcher.
//!
//! Triggers turn "this container has an update" events into publishes on
//! external channels. Two adapters are provided:
//!
//! - **MQTT** ([`adapter::mqtt::MqttTrigger`]) - retained container
//!   state on a deterministic topic namespace, with optional Home
//!   Assistant auto-discovery ([`adapter::mqtt::HassDiscovery`]) keeping
//!   per-container, per-watcher and global virtual entities registered.
//! - **Slack** ([`adapter::slack::SlackTrigger`]) - title/body templates
//!   rendered through the [`template`] expression evaluator and posted
//!   via `chat.postMessage`.
//!
//! # Architecture
//!
//! Hexagonal: adapters depend on [`port`] traits only, and transports
//! are injected. The [`port::MqttPublisher`] port is implemented for
//! `rumqttc::AsyncClient`; connection lifecycle (event loop, reconnects)
//! stays with the embedding application. Both adapters are stateless
//! beyond their validated configuration and injected handles, so
//! concurrent calls are safe; `update_container_sensors` awaits its
//! publishes sequentially to keep the retained-message order Home
//! Assistant depends on.
//!
//! # Modules
//!
//! - [`domain`] - container/watcher value types (camelCase serialization
//!   is the template-context surface)
//! - [`port`] - outbound traits: MQTT publish, chat API, container store
//! - [`adapter`] - the MQTT and Slack triggers and their configurations
//! - [`template`] - the narrow `${…}` expression evaluator
//! - [`error`] - `TriggerError`, `ValidationError`, `Result`
//!
//! # Example
//!
//! ```no_run
//! use wud_triggers::adapter::slack::{SlackConfiguration, SlackTrigger};
//!
//! # async fn example(container: &wud_triggers::domain::Container) -> wud_triggers::error::Result<()> {
//! let trigger = SlackTrigger::new(SlackConfiguration {
//!     token: "xoxb-…".into(),
//!     channel: "#updates".into(),
//!     ..SlackConfiguration::default()
//! })?;
//! let posted = trigger.trigger(container).await?;
//! println!("{}", posted.text);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod domain;
pub mod error;
pub mod port;
pub mod template;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use error::{Result, TriggerError, ValidationError, Violation};
