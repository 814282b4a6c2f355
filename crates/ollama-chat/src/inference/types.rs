//! Wire types for the Ollama chat and catalog endpoints.

use serde::{Deserialize, Serialize};

/// A non-streaming chat request (`POST {base}/api/chat`).
#[derive(Debug, Serialize)]
pub struct InferenceRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
}

impl InferenceRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
        }
    }
}

/// A message forwarded to the inference server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Roles the inference server understands.
///
/// No error variant: UI-local error annotations cannot be represented in an
/// outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Response body of `POST {base}/api/chat` with `stream: false`.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: String,
}

/// Response body of `GET {base}/api/tags`.
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

/// One installed model. Size, digest and the rest are ignored.
#[derive(Debug, Deserialize)]
pub struct ModelTag {
    pub name: String,
}
