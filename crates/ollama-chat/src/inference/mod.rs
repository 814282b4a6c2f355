//! Inference server client for chat turns and the model catalog.

mod client;
mod error;
mod types;

pub use client::{InferenceClient, OllamaClient};
pub use error::InferenceError;
pub use types::{
    ChatResponse, InferenceRequest, Message, ModelTag, ResponseMessage, Role, TagsResponse,
};
