mod config;
mod errors;
mod llm_client;
mod models;
mod quiz;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::time::Duration;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::quiz::source::{LlmQuestionSource, OfflineQuestionSource, QuestionSource};
use crate::quiz::store::SessionStore;
use crate::routes::build_router;
use crate::state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Quizsmith API v{}", env!("CARGO_PKG_VERSION"));

    // Question source: LLM when a key is configured, fallback templates otherwise
    let source: Arc<dyn QuestionSource> = match config.anthropic_api_key.clone() {
        Some(key) => {
            let mut llm = LlmClient::new(key, config.question_source_timeout)?;
            if let Some(url) = config.anthropic_api_url.clone() {
                info!("Using LLM endpoint override: {url}");
                llm = llm.with_endpoint(url);
            }
            info!(
                "LLM question source initialized (model: {}, timeout: {:?})",
                llm_client::MODEL,
                config.question_source_timeout
            );
            Arc::new(LlmQuestionSource::new(llm))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; running offline with fallback questions only");
            Arc::new(OfflineQuestionSource)
        }
    };

    let idle_ttl = chrono::Duration::from_std(config.session_idle_ttl)?;
    let sessions = SessionStore::with_idle_ttl(idle_ttl);
    sessions.spawn_sweeper(SESSION_SWEEP_INTERVAL);
    info!("Idle quiz sessions expire after {:?}", config.session_idle_ttl);

    let state = AppState { source, sessions };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client is hosted

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
