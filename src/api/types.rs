//! API request and response types

use crate::conversation::Turn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response for a created session
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
}

/// Response with a session's conversation
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub turns: Vec<Turn>,
    pub requests: u64,
}

/// Response for a chat message
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Markup to insert into the message list
    pub html: String,
    /// True when `html` is the fixed fallback text
    pub fallback: bool,
    pub seq: u64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
