//! Chat turn forwarding.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use crate::api::{ChatReply, ChatRequest, forwardable_history};
use crate::inference::{InferenceRequest, Message};
use crate::response;
use crate::server::AppState;

/// POST /api/chat
///
/// Forwards `history` (error turns removed) plus the new user message to the
/// inference server and returns the assistant's reply.
///
/// Besides the documented 200 and 500 outcomes, an unparseable body or a
/// whitespace-only `message` is answered with 400 instead of being forwarded.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected chat request body");
            return response::bad_request(rejection.body_text());
        }
    };

    if req.message.trim().is_empty() {
        return response::bad_request("message must not be empty");
    }

    let request = build_inference_request(&state.default_model, req);
    let model = request.model.clone();
    let history_len = request.messages.len() - 1;

    match state.inference.chat(request).await {
        Ok(message) => {
            info!(model = %model, history_len, reply_len = message.len(), "Chat turn completed");
            let reply = ChatReply {
                message,
                success: true,
            };
            (StatusCode::OK, Json(reply)).into_response()
        }
        Err(e) => {
            warn!(model = %model, history_len, error = %e, "Chat turn failed");
            response::internal_error(e.to_string())
        }
    }
}

/// Resolve the model and append the new user turn to the forwardable history.
fn build_inference_request(default_model: &str, req: ChatRequest) -> InferenceRequest {
    let model = req
        .model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| default_model.to_string());

    let mut messages = forwardable_history(&req.history);
    messages.push(Message::user(req.message));

    InferenceRequest::new(model, messages)
}
