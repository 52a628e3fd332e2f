//! Reply providers: where the server gets assistant text from

mod echo;
mod error;
mod openai;
pub mod streaming;

pub use echo::EchoProvider;
pub use error::ProviderError;
pub use openai::OpenAiProvider;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;

use crate::chat::Message;
use crate::config::LlmConfig;

/// Assistant reply as it is produced, one text fragment at a time
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

#[async_trait]
pub trait ReplyProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Start a reply to `messages`
    ///
    /// Errors returned here happen before any text was produced; errors
    /// inside the stream happen after.
    async fn stream_reply(&self, messages: &[Message]) -> Result<ReplyStream, ProviderError>;
}

/// Create the provider named in config
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn ReplyProvider>, ProviderError> {
    match config.provider.as_str() {
        "echo" => Ok(Arc::new(EchoProvider::from_config(&config.echo))),
        "openai" => Ok(Arc::new(OpenAiProvider::from_config(config)?)),
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_echo_provider() {
        let provider = create_provider(&LlmConfig::default()).unwrap();
        assert_eq!(provider.name(), "echo");
    }

    #[test]
    fn test_unknown_provider() {
        let config = LlmConfig {
            provider: "bard".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(
            create_provider(&config),
            Err(ProviderError::UnknownProvider(name)) if name == "bard"
        ));
    }
}
