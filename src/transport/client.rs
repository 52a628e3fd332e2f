//! HTTP implementation of [`MessageTransport`]

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;

use crate::chat::{ByteStream, MessageRequest, MessageTransport, TransportError};

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Network(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            TransportError::Network(format!("Connection failed: {}", e))
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// Posts `{messages: [...]}` as JSON and hands back the response body
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl MessageTransport for HttpTransport {
    async fn send(&self, request: &MessageRequest) -> Result<Option<ByteStream>, TransportError> {
        tracing::debug!(endpoint = %self.endpoint, "POST message");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if status == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            return Ok(None);
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Stream(e.to_string())));
        Ok(Some(Box::pin(stream)))
    }
}
