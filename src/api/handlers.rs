//! HTTP request handlers

use super::types::{
    ChatRequest, ChatResponse, CreateSessionResponse, ErrorResponse, SessionResponse,
};
use super::AppState;
use crate::session::SessionError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Sessions
// ============================================================

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let id = state.sessions.create();
    let snapshot = state.sessions.snapshot(&id)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: snapshot.id,
            turns: snapshot.turns,
        }),
    ))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let snapshot = state.sessions.snapshot(&id)?;

    Ok(Json(SessionResponse {
        session_id: snapshot.id,
        created_at: snapshot.created_at,
        turns: snapshot.turns,
        requests: snapshot.requests,
    }))
}

// ============================================================
// Chat
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("Message is empty".to_string()));
    }

    let sent = state.sessions.send(&id, message).await?;

    Ok(Json(ChatResponse {
        html: sent.reply.html().to_string(),
        fallback: sent.reply.is_fallback(),
        seq: sent.seq,
    }))
}

async fn get_version() -> &'static str {
    concat!("dept-chatbot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => AppError::NotFound(err.to_string()),
            SessionError::Busy => AppError::Conflict(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
