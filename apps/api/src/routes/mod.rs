pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::quiz::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Quiz API
        .route("/api/v1/quiz/topics", get(handlers::handle_list_topics))
        .route(
            "/api/v1/quiz/sessions",
            post(handlers::handle_create_session),
        )
        .route(
            "/api/v1/quiz/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/quiz/sessions/:id/config",
            put(handlers::handle_configure),
        )
        .route(
            "/api/v1/quiz/sessions/:id/start",
            post(handlers::handle_start),
        )
        .route(
            "/api/v1/quiz/sessions/:id/answer",
            post(handlers::handle_answer),
        )
        .route(
            "/api/v1/quiz/sessions/:id/retry",
            post(handlers::handle_retry),
        )
        .route(
            "/api/v1/quiz/sessions/:id/reset",
            post(handlers::handle_reset),
        )
        .route(
            "/api/v1/quiz/sessions/:id/results",
            get(handlers::handle_results),
        )
        .route(
            "/api/v1/quiz/sessions/:id/transcript",
            get(handlers::handle_transcript),
        )
        .with_state(state)
}
