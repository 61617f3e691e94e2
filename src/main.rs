//! Department website chatbot service
//!
//! Holds the chat widget's conversations and relays them to the Gemini
//! `generateContent` endpoint, returning each reply as display HTML.

mod api;
mod config;
mod conversation;
mod fetcher;
mod llm;
mod markdown;
mod session;
mod system_prompt;

use api::{create_router, AppState};
use config::ChatConfig;
use fetcher::ReplyFetcher;
use llm::{GeminiService, LoggingService};
use markdown::MarkdownRenderer;
use session::{SessionManager, SessionTemplate};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dept_chatbot=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ChatConfig::from_env()?;

    let context = match &config.context_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading conversation context");
            system_prompt::load_context(path)?
        }
        None => system_prompt::default_context(),
    };

    let gemini = GeminiService::new(config.gemini.clone())?;
    tracing::info!(
        model = %config.gemini.model,
        timeout_secs = ?config.gemini.timeout.map(|t| t.as_secs()),
        context_turns = context.len(),
        input_case = ?config.input_case,
        record_replies = config.record_replies,
        session_idle_secs = config.session_idle.as_secs(),
        "Gemini client initialized"
    );

    let llm = Arc::new(LoggingService::new(Arc::new(gemini)));
    let fetcher = ReplyFetcher::new(llm, Arc::new(MarkdownRenderer::new()))
        .with_recorded_replies(config.record_replies);
    let sessions = Arc::new(
        SessionManager::new(
            fetcher,
            SessionTemplate {
                context,
                input_case: config.input_case,
            },
        )
        .with_idle_timeout(config.session_idle),
    );
    let _idle_sweep = SessionManager::spawn_idle_sweep(&sessions);

    // The widget is served from the static site, not from here
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(sessions))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Chatbot server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
