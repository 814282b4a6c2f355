//! Ollama Chat - a chat gateway and terminal client for a locally hosted Ollama server.

pub mod api;
pub mod client;
pub mod config;
pub mod conversation;
pub mod handlers;
pub mod inference;
pub mod response;
pub mod server;
pub mod tui;
