use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TriggerError};
use crate::port::{ChatClient, PostedMessage};

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Thin `chat.postMessage` client.
///
/// Timeouts, proxies and retry policy stay with the embedding
/// application; this only shapes the request and surfaces Slack's
/// `{ok, error}` envelope.
pub struct SlackWebClient {
    token: String,
    http: reqwest::Client,
}

impl SlackWebClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl ChatClient for SlackWebClient {
    async fn post_message(&self, channel: &str, text: &str) -> Result<PostedMessage> {
        debug!(channel = %channel, "calling chat.postMessage");
        let response: PostMessageResponse = self
            .http
            .post(POST_MESSAGE_URL)
            .bearer_auth(&self.token)
            .json(&PostMessageRequest { channel, text })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !response.ok {
            return Err(TriggerError::Chat(
                response.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(PostedMessage {
            text: text.to_string(),
        })
    }
}
