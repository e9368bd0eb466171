use async_trait::async_trait;

use crate::error::Result;

/// Response returned by the chat API after a successful post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    /// The message text as accepted by the API.
    pub text: String,
}

/// Outbound chat-API port (Slack `chat.postMessage` shape).
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Post `text` to `channel` and return the API response.
    async fn post_message(&self, channel: &str, text: &str) -> Result<PostedMessage>;
}
