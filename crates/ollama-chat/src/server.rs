use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use crate::config::ServerConfig;
use crate::handlers;
use crate::inference::InferenceClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub inference: Arc<dyn InferenceClient>,
    pub default_model: String,
}

impl AppState {
    pub fn new(inference: Arc<dyn InferenceClient>, default_model: impl Into<String>) -> Self {
        Self {
            inference,
            default_model: default_model.into(),
        }
    }
}

pub fn build_app(state: AppState, config: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/models", get(handlers::list_models))
        .with_state(state.clone());

    let router = Router::new()
        .route("/health", get(handlers::health))
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .with_state(state)
        .nest("/api", api)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_seconds),
        ));

    if config.cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
