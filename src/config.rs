//! Service configuration from environment variables

use crate::conversation::InputCase;
use crate::llm::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::session::DEFAULT_IDLE_TIMEOUT;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Everything the service reads at startup
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub gemini: GeminiConfig,
    pub port: u16,
    pub input_case: InputCase,
    pub record_replies: bool,
    /// Sessions untouched for this long are evicted
    pub session_idle: Duration,
    /// Seed turns file; the built-in department context when unset
    pub context_file: Option<PathBuf>,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from any variable source. Empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("GEMINI_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let timeout = get("CHATBOT_REQUEST_TIMEOUT_SECS")
            .map(|v| {
                v.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| invalid("CHATBOT_REQUEST_TIMEOUT_SECS", e))
            })
            .transpose()?;

        let port = get("CHATBOT_PORT")
            .map(|v| v.parse::<u16>().map_err(|e| invalid("CHATBOT_PORT", e)))
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        let input_case = get("CHATBOT_INPUT_CASE")
            .map(|v| v.parse::<InputCase>().map_err(|e| invalid("CHATBOT_INPUT_CASE", e)))
            .transpose()?
            .unwrap_or_default();

        let record_replies = get("CHATBOT_RECORD_REPLIES")
            .map(|v| {
                parse_bool(&v).ok_or_else(|| {
                    invalid("CHATBOT_RECORD_REPLIES", format!("expected a boolean, got {v}"))
                })
            })
            .transpose()?
            .unwrap_or(false);

        let session_idle = get("CHATBOT_SESSION_IDLE_SECS")
            .map(|v| match v.parse::<u64>() {
                Ok(0) => Err(invalid("CHATBOT_SESSION_IDLE_SECS", "must be at least 1")),
                Ok(secs) => Ok(Duration::from_secs(secs)),
                Err(e) => Err(invalid("CHATBOT_SESSION_IDLE_SECS", e)),
            })
            .transpose()?
            .unwrap_or(DEFAULT_IDLE_TIMEOUT);

        Ok(Self {
            gemini: GeminiConfig {
                base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout,
                ..GeminiConfig::new(api_key)
            },
            port,
            input_case,
            record_replies,
            session_idle,
            context_file: get("CHATBOT_CONTEXT_FILE").map(PathBuf::from),
        })
    }
}

fn invalid(var: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
