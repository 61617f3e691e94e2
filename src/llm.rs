//! LLM provider abstraction
//!
//! The chat pipeline talks to the inference endpoint through [`LlmService`]
//! so tests can substitute a scripted client.

mod error;
mod gemini;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use gemini::{GeminiConfig, GeminiService, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    turns = request.turns.len(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    finish_reason = response.finish_reason.as_deref().unwrap_or("none"),
                    has_text = response.text.is_some(),
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    turns = request.turns.len(),
                    error_kind = e.kind.as_str(),
                    status = ?e.status,
                    error = %e.message,
                    "LLM request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MockLlmClient;
    use super::*;

    #[tokio::test]
    async fn test_logging_service_passes_through() {
        let mock = Arc::new(MockLlmClient::new("mock-model"));
        mock.queue_response(LlmResponse::text("hello"));
        mock.queue_error(LlmError::parse("bad body"));

        let service = LoggingService::new(mock.clone());
        assert_eq!(service.model_id(), "mock-model");

        let request = LlmRequest { turns: vec![] };
        let ok = service.complete(&request).await.unwrap();
        assert_eq!(ok.text.as_deref(), Some("hello"));

        let err = service.complete(&request).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Parse);
        assert_eq!(mock.recorded_requests().len(), 2);
    }
}
