//! Inference client trait and the Ollama implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::InferenceError;
use super::types::{ChatResponse, InferenceRequest, TagsResponse};
use crate::config::InferenceConfig;

/// The two operations the gateway needs from an inference server.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send one chat turn and return the assistant's reply text.
    async fn chat(&self, request: InferenceRequest) -> Result<String, InferenceError>;

    /// List installed model identifiers in catalog order.
    async fn list_models(&self) -> Result<Vec<String>, InferenceError>;
}

/// Client for an Ollama server.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    chat_timeout: Duration,
    catalog_timeout: Duration,
}

impl OllamaClient {
    #[must_use]
    pub fn new(client: Client, config: &InferenceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_timeout: Duration::from_secs(config.chat_timeout_seconds),
            catalog_timeout: Duration::from_secs(config.catalog_timeout_seconds),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a prepared request and decode a 2xx JSON body into `T`.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<T, InferenceError> {
        let timeout_secs = timeout.as_secs();
        let transport =
            |e: reqwest::Error| InferenceError::from_transport(e, &self.base_url, timeout_secs);

        let response = request.timeout(timeout).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::from_status(status));
        }

        let body = response.text().await.map_err(transport)?;
        serde_json::from_str(&body).map_err(|e| InferenceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl InferenceClient for OllamaClient {
    async fn chat(&self, request: InferenceRequest) -> Result<String, InferenceError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(
            url = %url,
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat request"
        );

        let builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request);
        let response: ChatResponse = self.execute(builder, self.chat_timeout).await?;

        if response.message.content.is_empty() {
            return Err(InferenceError::EmptyResponse);
        }
        Ok(response.message.content)
    }

    async fn list_models(&self) -> Result<Vec<String>, InferenceError> {
        let url = format!("{}/api/tags", self.base_url);
        debug!(url = %url, "Listing models");

        let builder = self.client.get(&url);
        let response: TagsResponse = self.execute(builder, self.catalog_timeout).await?;

        Ok(response.models.into_iter().map(|m| m.name).collect())
    }
}
