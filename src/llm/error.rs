use std::time::Duration;

use thiserror::Error;

/// Errors that can occur talking to the LLM service.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    Setup(String),

    /// Failed to connect to LLM service
    #[error("Connection error: {0}")]
    Connection(String),

    /// No response within the configured timeout
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Service answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body was not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Response was valid JSON but not in the dialect's shape
    #[error("Unexpected response shape: {0}")]
    Shape(String),
}

impl LlmError {
    /// Whether resending the identical request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Connection(_) | LlmError::Timeout(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Setup(_) | LlmError::Parse(_) | LlmError::Shape(_) => false,
        }
    }

    /// Classify a body deserialization failure.
    pub(crate) fn from_serde(err: serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Data => LlmError::Shape(err.to_string()),
            _ => LlmError::Parse(err.to_string()),
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(timeout)
        } else {
            LlmError::Connection(err.to_string())
        }
    }
}
