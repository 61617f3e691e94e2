//! LLM error types

use thiserror::Error;

/// LLM error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
    /// HTTP status of the failed response, when there was one
    pub status: Option<u16>,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidRequest, message)
    }

    pub fn http_status(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::HttpStatus, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Parse, message)
    }

    /// Classify a non-2xx response by status code
    pub fn from_status(status: u16, detail: &str) -> Self {
        let err = match status {
            400 => Self::invalid_request(format!("Invalid request: {detail}")),
            401 | 403 => Self::auth(format!("Authentication failed: {detail}")),
            429 => Self::rate_limit(format!("Rate limit exceeded: {detail}")),
            500..=599 => Self::server_error(format!("Server error: {detail}")),
            _ => Self::http_status(format!("HTTP {status}: {detail}")),
        };
        err.with_status(status)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// DNS, connection, timeout, or a body that could not be read
    Network,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Authentication failed (401, 403)
    Auth,
    /// Bad request (400)
    InvalidRequest,
    /// Any other non-2xx status
    HttpStatus,
    /// 2xx response whose body is not the expected JSON
    Parse,
}

impl LlmErrorKind {
    /// Whether the error came from a non-2xx status
    pub fn is_http_status(self) -> bool {
        matches!(
            self,
            Self::RateLimit
                | Self::ServerError
                | Self::Auth
                | Self::InvalidRequest
                | Self::HttpStatus
        )
    }

    /// Stable name used in structured logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::RateLimit => "rate_limit",
            Self::ServerError => "server_error",
            Self::Auth => "auth",
            Self::InvalidRequest => "invalid_request",
            Self::HttpStatus => "http_status",
            Self::Parse => "parse",
        }
    }
}
