//! Common types for LLM interactions

use crate::conversation::Turn;

/// LLM request: the full conversation, oldest turn first
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub turns: Vec<Turn>,
}

impl LlmRequest {
    pub fn new(turns: &[Turn]) -> Self {
        Self {
            turns: turns.to_vec(),
        }
    }
}

/// LLM response
///
/// `text` is the first candidate's first text part. It is `None` whenever
/// any link of that chain is absent, which is not an error.
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub text: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Usage,
}

#[cfg(test)]
impl LlmResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            finish_reason: Some("STOP".to_string()),
            usage: Usage::default(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Usage statistics
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
