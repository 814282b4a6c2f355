use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::api::HealthReply;
use crate::response;
use crate::server::AppState;

pub async fn health() -> Json<HealthReply> {
    Json(HealthReply {
        status: "healthy".to_string(),
    })
}

pub async fn livez() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Ready once the inference server answers a catalog request.
pub async fn readyz(State(state): State<AppState>) -> Response {
    match state.inference.list_models().await {
        Ok(_) => (StatusCode::OK, "ok").into_response(),
        Err(e) => response::service_unavailable(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::handlers::test_support::{FakeInference, app, get, send};
    use crate::inference::InferenceError;

    #[tokio::test]
    async fn health_reports_healthy() {
        let fake = Arc::new(FakeInference::replying("ok"));
        let (status, body) = send(app(fake), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn readyz_fails_when_upstream_down() {
        let fake = Arc::new(FakeInference::failing(|| InferenceError::Timeout {
            timeout_secs: 10,
        }));
        let (status, body) = send(app(fake), get("/readyz")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn readyz_ok_when_upstream_answers() {
        let fake = Arc::new(FakeInference::with_models(&[]));
        let (status, _) = send(app(fake), get("/readyz")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
