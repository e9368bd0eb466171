//! Slack trigger: renders title/body templates and posts to a channel.

use std::env;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapter::{mask, TriggerMode, UpdateThreshold};
use crate::domain::Container;
use crate::error::{Result, ValidationError, Violation};
use crate::port::{ChatClient, PostedMessage};
use crate::template;

mod client;

pub use client::SlackWebClient;

fn default_simpletitle() -> String {
    "New ${container.updateKind.kind} found for container ${container.name}".to_string()
}

fn default_simplebody() -> String {
    "Container ${container.name} running with ${container.updateKind.kind} ${container.updateKind.localValue} can be updated to ${container.updateKind.kind} ${container.updateKind.remoteValue}${container.result && container.result.link ? \"\\n\" + container.result.link : \"\"}".to_string()
}

fn default_batchtitle() -> String {
    "${containers.length} updates available".to_string()
}

const fn default_true() -> bool {
    true
}

/// Slack trigger configuration.
///
/// Field names match the flat lowercase keys of the configuration
/// surface (`simpletitle`, `disabletitle`, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfiguration {
    /// Bot token used for `chat.postMessage`.
    pub token: String,
    /// Channel the messages are posted to.
    pub channel: String,
    /// Smallest update kind worth notifying.
    pub threshold: UpdateThreshold,
    pub mode: TriggerMode,
    /// Notify only once per update.
    pub once: bool,
    pub auto: bool,
    /// Title template, rendered against `{container}`.
    pub simpletitle: String,
    /// Body template, rendered against `{container}`.
    pub simplebody: String,
    /// Batch title template, rendered against `{containers}`.
    pub batchtitle: String,
    /// Skip the bold title line entirely.
    pub disabletitle: bool,
}

impl Default for SlackConfiguration {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel: String::new(),
            threshold: UpdateThreshold::default(),
            mode: TriggerMode::default(),
            once: default_true(),
            auto: default_true(),
            simpletitle: default_simpletitle(),
            simplebody: default_simplebody(),
            batchtitle: default_batchtitle(),
            disabletitle: false,
        }
    }
}

impl SlackConfiguration {
    /// Check every constraint, collecting all failures. A valid
    /// configuration passes through unchanged — there is no
    /// normalization beyond the serde defaults.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut violations = Vec::new();
        if self.token.is_empty() {
            violations.push(Violation::required("token"));
        }
        if self.channel.is_empty() {
            violations.push(Violation::required("channel"));
        }
        for (field, template) in [
            ("simpletitle", &self.simpletitle),
            ("simplebody", &self.simplebody),
            ("batchtitle", &self.batchtitle),
        ] {
            if let Err(e) = template::validate(template) {
                violations.push(Violation::new(field, e.to_string()));
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations))
        }
    }

    /// Copy of the configuration safe for logging: token redacted.
    pub fn masked(&self) -> Self {
        Self {
            token: mask(&self.token),
            ..self.clone()
        }
    }

    /// Build a configuration from `WUD_TRIGGER_SLACK_*` environment
    /// variables; unset variables keep their defaults.
    pub fn from_env() -> std::result::Result<Self, ValidationError> {
        let defaults = Self::default();
        let mut violations = Vec::new();
        let threshold = match env::var("WUD_TRIGGER_SLACK_THRESHOLD").ok() {
            Some(raw) => match raw.parse() {
                Ok(value) => value,
                Err(reason) => {
                    violations.push(Violation::new("threshold", reason));
                    defaults.threshold
                }
            },
            None => defaults.threshold,
        };
        let mode = match env::var("WUD_TRIGGER_SLACK_MODE").ok() {
            Some(raw) => match raw.parse() {
                Ok(value) => value,
                Err(reason) => {
                    violations.push(Violation::new("mode", reason));
                    defaults.mode
                }
            },
            None => defaults.mode,
        };
        let flag = |name: &str, fallback: bool| {
            env::var(name)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(fallback)
        };
        let configuration = Self {
            token: env::var("WUD_TRIGGER_SLACK_TOKEN").unwrap_or(defaults.token),
            channel: env::var("WUD_TRIGGER_SLACK_CHANNEL").unwrap_or(defaults.channel),
            threshold,
            mode,
            once: flag("WUD_TRIGGER_SLACK_ONCE", defaults.once),
            auto: flag("WUD_TRIGGER_SLACK_AUTO", defaults.auto),
            simpletitle: env::var("WUD_TRIGGER_SLACK_SIMPLETITLE").unwrap_or(defaults.simpletitle),
            simplebody: env::var("WUD_TRIGGER_SLACK_SIMPLEBODY").unwrap_or(defaults.simplebody),
            batchtitle: env::var("WUD_TRIGGER_SLACK_BATCHTITLE").unwrap_or(defaults.batchtitle),
            disabletitle: flag("WUD_TRIGGER_SLACK_DISABLETITLE", defaults.disabletitle),
        };
        if violations.is_empty() {
            Ok(configuration)
        } else {
            Err(ValidationError::new(violations))
        }
    }
}

/// Posts rendered container update notifications to a Slack channel.
pub struct SlackTrigger {
    configuration: SlackConfiguration,
    client: Arc<dyn ChatClient>,
}

impl std::fmt::Debug for SlackTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackTrigger")
            .field("configuration", &self.configuration)
            .finish()
    }
}

impl SlackTrigger {
    /// Validate the configuration and build the web client from the
    /// configured token.
    pub fn new(configuration: SlackConfiguration) -> Result<Self> {
        configuration.validate()?;
        let client = Arc::new(SlackWebClient::new(configuration.token.clone()));
        info!(channel = %configuration.channel, "slack trigger initialized");
        Ok(Self {
            configuration,
            client,
        })
    }

    /// Assemble the trigger around an injected chat client.
    pub fn with_client(
        configuration: SlackConfiguration,
        client: Arc<dyn ChatClient>,
    ) -> Result<Self> {
        configuration.validate()?;
        Ok(Self {
            configuration,
            client,
        })
    }

    pub fn configuration(&self) -> &SlackConfiguration {
        &self.configuration
    }

    pub fn masked_configuration(&self) -> SlackConfiguration {
        self.configuration.masked()
    }

    /// Render and post the notification for a single container update.
    pub async fn trigger(&self, container: &Container) -> Result<PostedMessage> {
        let context = serde_json::json!({ "container": container });
        let title = template::render(&self.configuration.simpletitle, &context)?;
        let body = template::render(&self.configuration.simplebody, &context)?;
        self.send_message(&self.compose(&title, &body)).await
    }

    /// Render and post one notification covering a batch of updates.
    pub async fn trigger_batch(&self, containers: &[Container]) -> Result<PostedMessage> {
        let context = serde_json::json!({ "containers": containers });
        let title = template::render(&self.configuration.batchtitle, &context)?;
        let mut lines = Vec::with_capacity(containers.len());
        for container in containers {
            let container_context = serde_json::json!({ "container": container });
            lines.push(format!(
                "- {}\n",
                template::render(&self.configuration.simplebody, &container_context)?
            ));
        }
        let body = lines.join("\n");
        self.send_message(&self.compose(&title, &body)).await
    }

    /// Post `text` to the configured channel.
    pub async fn send_message(&self, text: &str) -> Result<PostedMessage> {
        debug!(channel = %self.configuration.channel, "posting message");
        self.client
            .post_message(&self.configuration.channel, text)
            .await
    }

    fn compose(&self, title: &str, body: &str) -> String {
        if self.configuration.disabletitle {
            body.to_string()
        } else {
            format!("*{title}*\n\n{body}")
        }
    }
}
