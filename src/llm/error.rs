//! Typed errors for reply providers

use thiserror::Error;

/// Reply provider errors with typed variants
///
/// Callers can tell failure modes apart without string matching:
/// - `Unauthorized` (401) - key missing, expired or invalid
/// - `RateLimited` (429) - upstream quota exceeded
/// - `BadRequest` (400) - malformed request
/// - `ServiceError` (5xx) - upstream server issue
/// - `Network` - connection/timeout
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The upstream stream broke after the reply started
    #[error("Stream error: {0}")]
    Stream(String),

    #[error("{0} environment variable not set")]
    MissingApiKey(&'static str),

    #[error("Unknown provider '{0}' (expected 'echo' or 'openai')")]
    UnknownProvider(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ProviderError {
    /// Convert HTTP status code and error text into a typed error
    pub fn from_http_status(status: reqwest::StatusCode, error_text: String) -> Self {
        match status.as_u16() {
            401 => ProviderError::Unauthorized(error_text),
            429 => ProviderError::RateLimited(error_text),
            400 => ProviderError::BadRequest(error_text),
            500..=599 => ProviderError::ServiceError(error_text),
            _ => ProviderError::Other(anyhow::anyhow!("HTTP {}: {}", status, error_text)),
        }
    }

    /// Convert network/connection errors into a typed error
    pub fn from_network_error(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Network(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            ProviderError::Network(format!("Connection failed: {}", e))
        } else if let Some(status) = e.status() {
            let error_text = e.to_string();
            Self::from_http_status(status, error_text)
        } else {
            ProviderError::Other(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        let err = ProviderError::from_http_status(
            reqwest::StatusCode::UNAUTHORIZED,
            "Invalid token".to_string(),
        );
        assert!(matches!(err, ProviderError::Unauthorized(_)));

        let err = ProviderError::from_http_status(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded".to_string(),
        );
        assert!(matches!(err, ProviderError::RateLimited(_)));

        let err = ProviderError::from_http_status(
            reqwest::StatusCode::BAD_GATEWAY,
            "upstream".to_string(),
        );
        assert!(matches!(err, ProviderError::ServiceError(_)));

        let err =
            ProviderError::from_http_status(reqwest::StatusCode::NOT_FOUND, "gone".to_string());
        assert!(matches!(err, ProviderError::Other(_)));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ProviderError::MissingApiKey("OPENAI_API_KEY").to_string(),
            "OPENAI_API_KEY environment variable not set"
        );
        assert_eq!(
            ProviderError::UnknownProvider("bard".into()).to_string(),
            "Unknown provider 'bard' (expected 'echo' or 'openai')"
        );
    }
}
