//! Conversation state machine behind the chat front end.
//!
//! A [`Conversation`] is either idle or awaiting exactly one response. Every
//! submission cycle appends one user turn immediately and one assistant or
//! error turn once the request settles. Rendering reads an immutable
//! [`ConversationView`].

use crate::api::{ChatTurn, forwardable_history};
use crate::inference::Message;

/// Text shown when the gateway call faulted before producing a result.
pub const CONNECTION_FAILED: &str = "Connection failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResponse,
}

/// A chat request ready to be sent, captured at submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChat {
    pub message: String,
    pub model: String,
    /// Prior turns, error turns already removed.
    pub history: Vec<Message>,
}

/// How a chat request settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Reply(String),
    /// Structured failure reported by the gateway.
    Failed(String),
    /// No structured result at all.
    ConnectionFailed,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<ChatTurn>,
    input: String,
    model: String,
    state: SessionState,
}

/// Borrowed snapshot of a conversation for one render.
#[derive(Debug, Clone, Copy)]
pub struct ConversationView<'a> {
    pub turns: &'a [ChatTurn],
    pub input: &'a str,
    pub model: &'a str,
    pub busy: bool,
}

impl Conversation {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            turns: Vec::new(),
            input: String::new(),
            model: model.into(),
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state == SessionState::AwaitingResponse
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Switch model for subsequent requests. Ignored while awaiting.
    pub fn select_model(&mut self, model: impl Into<String>) -> bool {
        if self.is_busy() {
            return false;
        }
        self.model = model.into();
        true
    }

    /// Drop the transcript. Ignored while awaiting.
    pub fn clear(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        self.turns.clear();
        true
    }

    /// Start a submission cycle.
    ///
    /// Returns `None` without touching any state when the input is blank or
    /// a response is already pending.
    pub fn submit(&mut self) -> Option<PendingChat> {
        if self.is_busy() || self.input.trim().is_empty() {
            return None;
        }

        let message = std::mem::take(&mut self.input);
        let pending = PendingChat {
            history: forwardable_history(&self.turns),
            model: self.model.clone(),
            message: message.clone(),
        };

        self.turns.push(ChatTurn::user(message));
        self.state = SessionState::AwaitingResponse;
        Some(pending)
    }

    /// Finish the pending cycle with exactly one more turn.
    ///
    /// Returns `false` (and changes nothing) when no request was pending.
    pub fn settle(&mut self, outcome: ChatOutcome) -> bool {
        if !self.is_busy() {
            return false;
        }

        let turn = match outcome {
            ChatOutcome::Reply(text) => ChatTurn::assistant(text),
            ChatOutcome::Failed(error) => ChatTurn::error(error),
            ChatOutcome::ConnectionFailed => ChatTurn::error(CONNECTION_FAILED),
        };
        self.turns.push(turn);
        self.state = SessionState::Idle;
        true
    }

    pub fn view(&self) -> ConversationView<'_> {
        ConversationView {
            turns: &self.turns,
            input: &self.input,
            model: &self.model,
            busy: self.is_busy(),
        }
    }
}
