use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version and the number of live quiz sessions.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "quizsmith",
        "active_sessions": state.sessions.len().await
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::quiz::source::OfflineQuestionSource;
    use crate::quiz::store::SessionStore;

    #[tokio::test]
    async fn test_health_reports_ok() {
        let state = AppState {
            source: Arc::new(OfflineQuestionSource),
            sessions: SessionStore::new(),
        };
        let Json(body) = health_handler(State(state)).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "quizsmith");
        assert_eq!(body["active_sessions"], 0);
    }
}
