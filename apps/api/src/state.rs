use std::sync::Arc;

use crate::quiz::source::QuestionSource;
use crate::quiz::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable question source. LLM-backed when an API key is configured,
    /// offline otherwise.
    pub source: Arc<dyn QuestionSource>,
    pub sessions: SessionStore,
}
