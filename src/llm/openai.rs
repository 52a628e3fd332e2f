//! OpenAI-compatible chat completions provider
//!
//! Streams `choices[0].delta.content` from `/chat/completions` with
//! `stream: true`. Any server speaking the same protocol works through
//! `llm.openai.base_url`.

use std::env;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::streaming::SseDecoder;
use super::{ProviderError, ReplyProvider, ReplyStream};
use crate::chat::Message;
use crate::config::LlmConfig;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    stream: bool,
}

#[derive(Debug, Serialize, PartialEq)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: usize,
    system_prompt: String,
}

impl OpenAiProvider {
    pub fn from_config(config: &LlmConfig) -> Result<Self, ProviderError> {
        let api_key = env::var(API_KEY_ENV).map_err(|_| ProviderError::MissingApiKey(API_KEY_ENV))?;
        Ok(Self::new(api_key, config))
    }

    pub fn new(api_key: impl Into<String>, config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: config.openai.base_url.trim_end_matches('/').to_string(),
            model: config.openai.model.clone(),
            max_tokens: config.openai.max_tokens,
            system_prompt: config.system_prompt.clone(),
        }
    }

    fn build_request(&self, messages: &[Message]) -> ChatRequest {
        let mut chat = Vec::with_capacity(messages.len() + 1);
        if !self.system_prompt.is_empty() {
            chat.push(ChatMessage {
                role: "system",
                content: self.system_prompt.clone(),
            });
        }
        chat.extend(messages.iter().map(|m| ChatMessage {
            role: if m.is_user_message { "user" } else { "assistant" },
            content: m.text.clone(),
        }));

        ChatRequest {
            model: self.model.clone(),
            messages: chat,
            max_tokens: self.max_tokens,
            stream: true,
        }
    }
}

/// Text carried by one streamed chunk, if any
fn delta_text(payload: &str) -> Option<String> {
    let chunk: ChunkResponse = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::debug!("Skipping unparseable stream payload: {}", e);
            return None;
        }
    };
    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|text| !text.is_empty())
}

#[async_trait]
impl ReplyProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn stream_reply(&self, messages: &[Message]) -> Result<ReplyStream, ProviderError> {
        let request = self.build_request(messages);
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(ProviderError::from_network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_http_status(status, error_text));
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(Err(ProviderError::Stream(e.to_string()))).await;
                        return;
                    }
                };
                for payload in decoder.push(&chunk) {
                    if payload == "[DONE]" {
                        return;
                    }
                    if let Some(text) = delta_text(&payload) {
                        if tx.send(Ok(text)).await.is_err() {
                            // Receiver dropped: the client went away
                            return;
                        }
                    }
                }
            }

            for payload in decoder.finish() {
                if payload == "[DONE]" {
                    break;
                }
                if let Some(text) = delta_text(&payload) {
                    let _ = tx.send(Ok(text)).await;
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Router};

    fn config_for(base_url: &str) -> LlmConfig {
        let mut config = LlmConfig::default();
        config.openai.base_url = base_url.to_string();
        config
    }

    #[test]
    fn test_delta_text() {
        assert_eq!(
            delta_text(r#"{"choices":[{"delta":{"content":"Hi"}}]}"#),
            Some("Hi".to_string())
        );
        assert_eq!(delta_text(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#), None);
        assert_eq!(delta_text(r#"{"choices":[{"delta":{"content":""}}]}"#), None);
        assert_eq!(delta_text("not json"), None);
    }

    #[test]
    fn test_build_request_maps_roles() {
        let provider = OpenAiProvider::new("key", &config_for("http://localhost/v1/"));
        let request = provider.build_request(&[Message::user("q"), Message::assistant("a")]);

        assert!(request.stream);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(
            request.messages[1],
            ChatMessage {
                role: "user",
                content: "q".to_string()
            }
        );
        assert_eq!(request.messages[2].role, "assistant");
        assert_eq!(provider.base_url, "http://localhost/v1");
    }

    async fn spawn_upstream(body: &'static str) -> String {
        let app = Router::new().route("/v1/chat/completions", post(move || async move { body }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    #[tokio::test]
    async fn test_streams_deltas_until_done() {
        let base = spawn_upstream(concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        ))
        .await;

        let provider = OpenAiProvider::new("key", &config_for(&base));
        let stream = provider
            .stream_reply(&[Message::user("hi")])
            .await
            .unwrap();
        let text: Vec<String> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(text.concat(), "Hello");
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (axum::http::StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let provider = OpenAiProvider::new("key", &config_for(&format!("http://{}/v1", addr)));
        let result = provider.stream_reply(&[Message::user("hi")]).await;
        assert!(matches!(result, Err(ProviderError::Unauthorized(_))));
    }
}
