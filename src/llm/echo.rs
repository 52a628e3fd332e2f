//! Offline provider that streams the user's last message back

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use super::{ProviderError, ReplyProvider, ReplyStream};
use crate::chat::Message;
use crate::config::EchoConfig;

#[derive(Debug, Clone)]
pub struct EchoProvider {
    chunk_delay: Duration,
}

impl EchoProvider {
    pub fn new(chunk_delay: Duration) -> Self {
        Self { chunk_delay }
    }

    pub fn from_config(config: &EchoConfig) -> Self {
        Self::new(Duration::from_millis(config.chunk_delay_ms))
    }

    /// Full text the echo reply will stream
    pub fn reply_text(messages: &[Message]) -> String {
        match messages.iter().rev().find(|m| m.is_user_message) {
            Some(message) => format!("You said: {}", message.text),
            None => "Say something and I will repeat it.".to_string(),
        }
    }
}

impl Default for EchoProvider {
    fn default() -> Self {
        Self::from_config(&EchoConfig::default())
    }
}

#[async_trait]
impl ReplyProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn stream_reply(&self, messages: &[Message]) -> Result<ReplyStream, ProviderError> {
        let words: Vec<String> = Self::reply_text(messages)
            .split_inclusive(' ')
            .map(str::to_string)
            .collect();
        let delay = self.chunk_delay;

        let stream = futures::stream::iter(words).then(move |word| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok::<_, ProviderError>(word)
        });
        Ok(Box::pin(stream))
    }
}
