use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::api::ModelsReply;
use crate::response;
use crate::server::AppState;

/// GET /api/models
pub async fn list_models(State(state): State<AppState>) -> Response {
    match state.inference.list_models().await {
        Ok(models) => {
            debug!(count = models.len(), "Listed models");
            let reply = ModelsReply {
                models,
                success: true,
            };
            (StatusCode::OK, Json(reply)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Listing models failed");
            response::internal_error(e.to_string())
        }
    }
}
