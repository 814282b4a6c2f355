//! HTTP client for the gateway's own `/api` surface.

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ChatReply, ChatRequest, ChatTurn, FailureReply, ModelsReply};
use crate::conversation::{ChatOutcome, PendingChat};

/// Errors from gateway calls that have no structured outcome.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("unexpected gateway response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for a running gateway.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    #[must_use]
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a pending chat turn. Never fails: every fault maps to an outcome.
    pub async fn chat(&self, pending: &PendingChat) -> ChatOutcome {
        let body = ChatRequest {
            message: pending.message.clone(),
            model: Some(pending.model.clone()),
            history: pending.history.iter().cloned().map(ChatTurn::from).collect(),
        };

        match self.post_chat(&body).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Chat request did not produce a result");
                ChatOutcome::ConnectionFailed
            }
        }
    }

    async fn post_chat(&self, body: &ChatRequest) -> Result<ChatOutcome, ClientError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(url = %url, model = ?body.model, "Posting chat turn");

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        // Success is decided by the body, not the status code.
        if let Ok(reply) = serde_json::from_str::<ChatReply>(&text)
            && reply.success
        {
            return Ok(ChatOutcome::Reply(reply.message));
        }
        match serde_json::from_str::<FailureReply>(&text) {
            Ok(failure) => Ok(ChatOutcome::Failed(failure.error)),
            Err(e) if status.is_success() => Err(e.into()),
            Err(_) => Err(ClientError::Gateway(status.to_string())),
        }
    }

    /// Fetch installed model names through the gateway.
    pub async fn list_models(&self) -> Result<Vec<String>, ClientError> {
        let url = format!("{}/api/models", self.base_url);
        let text = self.client.get(&url).send().await?.text().await?;

        if let Ok(reply) = serde_json::from_str::<ModelsReply>(&text)
            && reply.success
        {
            return Ok(reply.models);
        }
        let failure: FailureReply = serde_json::from_str(&text)?;
        Err(ClientError::Gateway(failure.error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = GatewayClient::new(Client::new(), "http://127.0.0.1:8080/");
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
    }

    #[tokio::test]
    async fn unreachable_gateway_is_connection_failed() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = GatewayClient::new(Client::new(), &format!("http://127.0.0.1:{port}"));
        let pending = PendingChat {
            message: "hi".to_string(),
            model: "m".to_string(),
            history: vec![],
        };

        assert_eq!(client.chat(&pending).await, ChatOutcome::ConnectionFailed);
        assert!(client.list_models().await.is_err());
    }
}
