use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, TriggerError};
use crate::port::{ChatClient, PostedMessage};

/// One captured `post_message` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedCall {
    pub channel: String,
    pub text: String,
}

/// Records every post and echoes the text back, like the live API does.
#[derive(Default)]
pub struct RecordingChatClient {
    posts: Mutex<Vec<PostedCall>>,
}

impl RecordingChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Vec<PostedCall> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for RecordingChatClient {
    async fn post_message(&self, channel: &str, text: &str) -> Result<PostedMessage> {
        self.posts.lock().unwrap().push(PostedCall {
            channel: channel.to_string(),
            text: text.to_string(),
        });
        Ok(PostedMessage {
            text: text.to_string(),
        })
    }
}

/// Fails every post, for error-propagation tests.
#[derive(Default)]
pub struct FailingChatClient;

#[async_trait]
impl ChatClient for FailingChatClient {
    async fn post_message(&self, _channel: &str, _text: &str) -> Result<PostedMessage> {
        Err(TriggerError::Chat("channel_not_found".to_string()))
    }
}
