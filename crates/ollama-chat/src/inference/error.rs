//! Inference error types.

use thiserror::Error;

/// Errors that can occur when calling the inference server.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The inference server could not be reached.
    #[error("cannot connect to inference server at {base_url}: {source}")]
    Connect {
        base_url: String,
        #[source]
        source: reqwest::Error,
    },

    /// No response within the configured bound.
    #[error("inference server timed out after {timeout_secs}s; the model may still be loading")]
    Timeout { timeout_secs: u64 },

    /// Any other transport failure.
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx status from the inference server.
    #[error("Ollama API error: {status_text}")]
    Api { status: u16, status_text: String },

    /// Body did not match the documented shape.
    #[error("malformed response from inference server: {0}")]
    Malformed(String),

    /// The model answered with no text.
    #[error("empty response from model")]
    EmptyResponse,
}

impl InferenceError {
    /// Classify a transport error from a call against `base_url`.
    pub fn from_transport(err: reqwest::Error, base_url: &str, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            InferenceError::Timeout { timeout_secs }
        } else if err.is_connect() {
            InferenceError::Connect {
                base_url: base_url.to_string(),
                source: err,
            }
        } else {
            InferenceError::Request(err)
        }
    }

    /// Build an `Api` error carrying the canonical reason phrase of `status`.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        InferenceError::Api {
            status: status.as_u16(),
            status_text: status
                .canonical_reason()
                .map(String::from)
                .unwrap_or_else(|| status.as_str().to_string()),
        }
    }
}
