//! Reply pipeline: user message → conversation → inference → rendered reply
//!
//! Every outcome that is not a rendered reply collapses to the same fallback
//! text for the widget, but each cause is logged with its own kind.

use crate::conversation::Conversation;
use crate::llm::{LlmErrorKind, LlmRequest, LlmService};
use crate::markdown::MarkdownRenderer;
use std::sync::Arc;

/// Text shown when no reply could be produced
pub const FALLBACK_REPLY: &str = "Unable to get response from AI!";

/// Why a request ended with the fallback text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The request failed before or while talking to the endpoint
    Llm(LlmErrorKind),
    /// The response had no first candidate text, or it rendered to nothing
    NoText,
}

impl FallbackReason {
    /// Stable name used in structured logs
    pub fn as_str(self) -> &'static str {
        match self {
            FallbackReason::Llm(kind) => kind.as_str(),
            FallbackReason::NoText => "no_text",
        }
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Rendered {
        /// Display HTML
        html: String,
        /// Markdown as returned by the model
        text: String,
    },
    Fallback(FallbackReason),
}

impl Reply {
    /// Markup for the widget
    pub fn html(&self) -> &str {
        match self {
            Reply::Rendered { html, .. } => html,
            Reply::Fallback(_) => FALLBACK_REPLY,
        }
    }

    /// Model text behind a rendered reply
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Rendered { text, .. } => Some(text),
            Reply::Fallback(_) => None,
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            Reply::Rendered { .. } => None,
            Reply::Fallback(reason) => Some(*reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Reply::Fallback(_))
    }
}

/// Produces rendered replies for messages in a caller-owned conversation
pub struct ReplyFetcher {
    llm: Arc<dyn LlmService>,
    renderer: Arc<MarkdownRenderer>,
    record_replies: bool,
}

impl ReplyFetcher {
    pub fn new(llm: Arc<dyn LlmService>, renderer: Arc<MarkdownRenderer>) -> Self {
        Self {
            llm,
            renderer,
            record_replies: false,
        }
    }

    /// Also append each rendered reply to the conversation as a model turn
    #[must_use]
    pub fn with_recorded_replies(mut self, record: bool) -> Self {
        self.record_replies = record;
        self
    }

    /// Append `message` as a user turn, send the whole conversation, and
    /// render the first candidate's text.
    ///
    /// The caller is expected to reject empty messages beforehand. The user
    /// turn stays in the conversation whatever the outcome.
    pub async fn fetch_reply(&self, conversation: &mut Conversation, message: &str) -> Reply {
        conversation.append_user_turn(message);
        let request = LlmRequest::new(conversation.turns());

        let response = match self.llm.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                if e.kind.is_http_status() {
                    tracing::warn!(
                        error_kind = e.kind.as_str(),
                        status = ?e.status,
                        error = %e.message,
                        "Endpoint returned an error status, replying with fallback"
                    );
                } else if e.kind == LlmErrorKind::Parse {
                    tracing::warn!(
                        error = %e.message,
                        "Endpoint response was not valid JSON, replying with fallback"
                    );
                } else {
                    tracing::warn!(
                        error = %e.message,
                        "Endpoint unreachable, replying with fallback"
                    );
                }
                return Reply::Fallback(FallbackReason::Llm(e.kind));
            }
        };

        let Some(text) = response.text else {
            tracing::warn!(
                finish_reason = response.finish_reason.as_deref().unwrap_or("none"),
                "Response had no candidate text, replying with fallback"
            );
            return Reply::Fallback(FallbackReason::NoText);
        };

        let html = self.renderer.render(&text);
        if html.trim().is_empty() {
            tracing::warn!("Candidate text rendered to nothing, replying with fallback");
            return Reply::Fallback(FallbackReason::NoText);
        }

        if self.record_replies {
            conversation.append_model_turn(&text);
        }

        Reply::Rendered { html, text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{InputCase, Role};
    use crate::llm::testing::MockLlmClient;
    use crate::llm::{LlmError, LlmResponse};

    fn fetcher(mock: &Arc<MockLlmClient>) -> ReplyFetcher {
        ReplyFetcher::new(mock.clone(), Arc::new(MarkdownRenderer::new()))
    }

    #[tokio::test]
    async fn test_rendered_reply() {
        let mock = Arc::new(MockLlmClient::new("mock"));
        mock.queue_response(LlmResponse::text("**hi**"));
        let mut conv = Conversation::with_default_context();

        let reply = fetcher(&mock).fetch_reply(&mut conv, "Hello").await;

        assert_eq!(reply.html(), "<p><strong>hi</strong></p>\n");
        assert!(!reply.is_fallback());
        assert_eq!(conv.len(), 3);
    }

    #[tokio::test]
    async fn test_request_carries_whole_conversation() {
        let mock = Arc::new(MockLlmClient::new("mock"));
        mock.queue_response(LlmResponse::text("ok"));
        let context = vec!["SYSTEM: a".to_string(), "SYSTEM: b".to_string()];
        let mut conv = Conversation::new(context, InputCase::Lowercase);

        fetcher(&mock).fetch_reply(&mut conv, "Question").await;

        let requests = mock.recorded_requests();
        assert_eq!(requests.len(), 1);
        let turns = &requests[0].turns;
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].text(), "SYSTEM: a");
        assert_eq!(turns[2].text(), "question");
        assert_eq!(turns[2].role, Role::User);
    }

    #[tokio::test]
    async fn test_missing_text_falls_back() {
        let mock = Arc::new(MockLlmClient::new("mock"));
        mock.queue_response(LlmResponse::empty());
        let mut conv = Conversation::with_default_context();

        let reply = fetcher(&mock).fetch_reply(&mut conv, "Hello").await;

        assert_eq!(reply, Reply::Fallback(FallbackReason::NoText));
        assert_eq!(reply.html(), "Unable to get response from AI!");
    }

    #[tokio::test]
    async fn test_blank_text_falls_back() {
        let mock = Arc::new(MockLlmClient::new("mock"));
        mock.queue_response(LlmResponse::text("   \n"));
        let mut conv = Conversation::with_default_context();

        let reply = fetcher(&mock).fetch_reply(&mut conv, "Hello").await;
        assert_eq!(reply.html(), FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_errors_fall_back_with_kind() {
        let mock = Arc::new(MockLlmClient::new("mock"));
        mock.queue_error(LlmError::network("connection refused"));
        mock.queue_error(LlmError::from_status(500, "boom"));
        mock.queue_error(LlmError::parse("expected value at line 1"));
        let fetcher = fetcher(&mock);
        let mut conv = Conversation::with_default_context();

        let network = fetcher.fetch_reply(&mut conv, "a").await;
        let status = fetcher.fetch_reply(&mut conv, "b").await;
        let parse = fetcher.fetch_reply(&mut conv, "c").await;

        assert_eq!(network, Reply::Fallback(FallbackReason::Llm(LlmErrorKind::Network)));
        assert_eq!(status, Reply::Fallback(FallbackReason::Llm(LlmErrorKind::ServerError)));
        assert_eq!(parse, Reply::Fallback(FallbackReason::Llm(LlmErrorKind::Parse)));
        for reply in [network, status, parse] {
            assert_eq!(reply.html(), FALLBACK_REPLY);
        }
        // User turns are kept even when the request fails
        assert_eq!(conv.exchanged().len(), 3);
    }

    #[tokio::test]
    async fn test_sequential_calls_append_in_order() {
        let mock = Arc::new(MockLlmClient::new("mock"));
        mock.queue_response(LlmResponse::text("one"));
        mock.queue_response(LlmResponse::text("two"));
        let fetcher = fetcher(&mock);
        let mut conv = Conversation::with_default_context();
        let initial = conv.len();

        fetcher.fetch_reply(&mut conv, "First").await;
        fetcher.fetch_reply(&mut conv, "Second").await;

        assert_eq!(conv.len(), initial + 2);
        let texts: Vec<String> = conv
            .exchanged()
            .iter()
            .map(crate::conversation::Turn::text)
            .collect();
        assert_eq!(texts, vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn test_recorded_replies_become_model_turns() {
        let mock = Arc::new(MockLlmClient::new("mock"));
        mock.queue_response(LlmResponse::text("Use `cargo`"));
        mock.queue_response(LlmResponse::empty());
        let fetcher = fetcher(&mock).with_recorded_replies(true);
        let mut conv = Conversation::with_default_context();

        fetcher.fetch_reply(&mut conv, "How do I build?").await;
        fetcher.fetch_reply(&mut conv, "And test?").await;

        let exchanged = conv.exchanged();
        // The fallback is not recorded
        assert_eq!(exchanged.len(), 3);
        assert_eq!(exchanged[1].role, Role::Model);
        assert_eq!(exchanged[1].text(), "Use `cargo`");
        assert_eq!(exchanged[2].text(), "and test?");
    }
}
