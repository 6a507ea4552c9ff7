//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{ConversationRequest, ErrorResponse, SuggestionsResponse};
use super::AppState;
use crate::chat::start_chat;
use crate::llm::ChatMessage;
use crate::suggestions::generate_suggestions;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tokio::sync::mpsc;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/suggestions", post(suggestions))
        .with_state(state)
}

// ============================================================
// Streaming chat
// ============================================================

/// Stream a support-chat reply as server-sent events.
///
/// The body must carry a non-empty `messages` array; that is checked (and
/// the first provider call made) before the response commits to an event
/// stream, so both validation and provider failures still get proper HTTP
/// error statuses.
async fn chat(
    State(state): State<AppState>,
    body: Option<Json<ConversationRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let messages = extract_messages(body)
        .ok_or_else(|| AppError::BadRequest("messages array is required".to_string()))?;

    let turn = start_chat(state.llm, state.factsheet, messages)
        .await
        .map_err(|e| {
            tracing::error!(error = %e.message, "Failed to start chat turn");
            AppError::Internal("Internal Server Error".to_string())
        })?;

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        // The response is streaming by now; a failure here can only be
        // logged and the stream left to end.
        if let Err(e) = turn.relay(tx).await {
            tracing::error!(error = %e.message, "Chat stream failed mid-turn");
        }
    });

    Ok(sse_stream(rx))
}

// ============================================================
// Follow-up suggestions
// ============================================================

async fn suggestions(
    State(state): State<AppState>,
    body: Option<Json<ConversationRequest>>,
) -> Result<Json<SuggestionsResponse>, AppError> {
    let messages = extract_messages(body)
        .ok_or_else(|| AppError::BadRequest("Invalid or missing messages array".to_string()))?;

    match generate_suggestions(&state.llm, &messages).await {
        Ok(suggestions) => Ok(Json(SuggestionsResponse { suggestions })),
        Err(e) => {
            tracing::error!(error = %e.message, "Error generating suggestions");
            Err(AppError::Internal(
                "Failed to generate suggestions".to_string(),
            ))
        }
    }
}

/// A usable transcript: present, well-formed and non-empty
fn extract_messages(body: Option<Json<ConversationRequest>>) -> Option<Vec<ChatMessage>> {
    body.and_then(|Json(request)| request.messages)
        .filter(|messages| !messages.is_empty())
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
