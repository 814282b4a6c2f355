//! Request and response bodies of the gateway's own HTTP surface.
//!
//! Shared by the axum handlers and by [`crate::client::GatewayClient`].

use serde::{Deserialize, Serialize};

use crate::inference::{Message, Role};

/// Role of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    /// UI-local annotation; never forwarded to the inference server.
    Error,
}

/// One entry of a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    role: TurnRole,
    content: String,
}

impl ChatTurn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Error, content)
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// The message to forward upstream, or `None` for error turns.
    pub fn to_message(&self) -> Option<Message> {
        let role = match self.role {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Assistant,
            TurnRole::Error => return None,
        };
        Some(Message {
            role,
            content: self.content.clone(),
        })
    }
}

impl From<Message> for ChatTurn {
    fn from(message: Message) -> Self {
        let role = match message.role {
            Role::User => TurnRole::User,
            Role::Assistant => TurnRole::Assistant,
        };
        Self::new(role, message.content)
    }
}

/// Strip error turns and convert the rest to outgoing messages, keeping order.
pub fn forwardable_history<'a, I>(turns: I) -> Vec<Message>
where
    I: IntoIterator<Item = &'a ChatTurn>,
{
    turns.into_iter().filter_map(ChatTurn::to_message).collect()
}

/// `POST /api/chat` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// `POST /api/chat` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    pub success: bool,
}

/// `GET /api/models` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsReply {
    pub models: Vec<String>,
    pub success: bool,
}

/// Structured failure body returned by every gateway route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReply {
    pub error: String,
    pub success: bool,
}

impl FailureReply {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            success: false,
        }
    }
}

/// `GET /health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReply {
    pub status: String,
}
