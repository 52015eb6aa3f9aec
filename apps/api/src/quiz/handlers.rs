//! Axum route handlers for the Quiz API.
//!
//! Every request that touches a session evaluates its timer first, so a
//! question whose deadline has passed is auto-submitted on the next request
//! that sees it.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::quiz::{AnswerRecord, QuizConfiguration, QuizConfigurationRequest};
use crate::quiz::pipeline::{assemble_questions, QuestionSet};
use crate::quiz::prompts::{TopicEntry, TOPIC_CATALOG};
use crate::quiz::results::{render_transcript, summarize, QuizSummary};
use crate::quiz::session::{Phase, QuizSession, RetryMode};
use crate::quiz::store::SessionHandle;
use crate::quiz::timer::{self, TimerStatus, TimerUrgency};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub config: Option<QuizConfigurationRequest>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub option: usize,
    /// The question the client was showing. A mismatch means that question
    /// already closed and the click is rejected.
    pub question_index: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RetryRequest {
    pub mode: RetryMode,
}

/// A question as shown to the player: no correct index, no explanation.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub text: String,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TimerView {
    pub remaining_seconds: f64,
    pub urgency: TimerUrgency,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub phase: Phase,
    pub attempt: u32,
    pub config: QuizConfiguration,
    pub current_index: usize,
    pub total_questions: usize,
    pub answered: usize,
    pub score: u32,
    pub correct_count: usize,
    pub current_question: Option<QuestionView>,
    pub timer: Option<TimerView>,
    /// Present when this request auto-submitted a question.
    pub timed_out: Option<AnswerRecord>,
}

impl SessionView {
    fn build(session: &QuizSession, status: TimerStatus) -> Self {
        let current_question = session.current_question().map(|q| QuestionView {
            index: session.current_index(),
            text: q.text().to_string(),
            options: q.options().to_vec(),
        });
        let timer = (session.phase() == Phase::Active).then_some(TimerView {
            remaining_seconds: status.remaining_seconds,
            urgency: status.urgency,
        });

        Self {
            id: session.id(),
            created_at: session.created_at(),
            phase: session.phase(),
            attempt: session.attempt(),
            config: session.config().clone(),
            current_index: session.current_index(),
            total_questions: session.questions().len(),
            answered: session.answer_log().len(),
            score: session.score(),
            correct_count: session.correct_count(),
            current_question,
            timer,
            timed_out: status.expired,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerationView {
    #[serde(flatten)]
    pub session: SessionView,
    pub from_source: usize,
    pub from_fallback: usize,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub record: AnswerRecord,
    pub session: SessionView,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn load(state: &AppState, id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Quiz session {id} not found")))
}

/// Builds a question set without holding the session lock. Nothing about the
/// session changes here, so a request dropped mid-generation leaves it as it was.
async fn build_questions(state: &AppState, config: &QuizConfiguration) -> QuestionSet {
    assemble_questions(state.source.as_ref(), config, rand::random::<u64>()).await
}

/// The set must still match the session it is committed to.
fn ensure_config_unchanged(
    session: &QuizSession,
    built_for: &QuizConfiguration,
) -> Result<(), AppError> {
    if session.config() == built_for {
        Ok(())
    } else {
        Err(AppError::Conflict(
            "Quiz configuration changed while questions were being generated".to_string(),
        ))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/quiz/topics
pub async fn handle_list_topics() -> Json<Vec<TopicEntry>> {
    Json(TOPIC_CATALOG.to_vec())
}

/// POST /api/v1/quiz/sessions
///
/// Creates a session in setup. Without a config the defaults apply.
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let config = match request.config {
        Some(c) => QuizConfiguration::try_from(c)?,
        None => QuizConfiguration::default(),
    };
    let now = Utc::now();
    let mut session = QuizSession::new(config, now);
    let status = timer::poll(&mut session, now);
    let view = SessionView::build(&session, status);
    state.sessions.insert(session).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/quiz/sessions/:id
///
/// One refresh cycle: expires the current question if due, then reports state.
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = load(&state, id).await?;
    let mut session = handle.lock().await;
    let status = timer::poll(&mut session, Utc::now());
    Ok(Json(SessionView::build(&session, status)))
}

/// PUT /api/v1/quiz/sessions/:id/config
pub async fn handle_configure(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<QuizConfigurationRequest>,
) -> Result<Json<SessionView>, AppError> {
    let config = QuizConfiguration::try_from(request)?;
    let handle = load(&state, id).await?;
    let mut session = handle.lock().await;
    session.configure(config)?;
    let status = timer::poll(&mut session, Utc::now());
    Ok(Json(SessionView::build(&session, status)))
}

/// POST /api/v1/quiz/sessions/:id/start
///
/// setup → generating → active. Generation cannot fail outward: source
/// problems are covered by fallback questions. The set is built first and the
/// transition is committed in one step once it is ready.
pub async fn handle_start(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GenerationView>, AppError> {
    let handle = load(&state, id).await?;
    let config = handle.lock().await.pending_start()?;
    let set = build_questions(&state, &config).await;

    let mut session = handle.lock().await;
    ensure_config_unchanged(&session, &config)?;
    session.start()?;
    session.begin(set.questions, Utc::now())?;
    let status = timer::poll(&mut session, Utc::now());
    Ok(Json(GenerationView {
        session: SessionView::build(&session, status),
        from_source: set.from_source,
        from_fallback: set.from_fallback,
    }))
}

/// POST /api/v1/quiz/sessions/:id/answer
pub async fn handle_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let handle = load(&state, id).await?;
    let mut session = handle.lock().await;

    if let Some(shown) = request.question_index {
        if session.phase() == Phase::Active && shown != session.current_index() {
            return Err(AppError::Conflict(format!(
                "Question {shown} is already closed; current question is {}",
                session.current_index()
            )));
        }
    }

    let now = Utc::now();
    let record = session.select_answer(request.option, now)?;
    let status = timer::poll(&mut session, now);
    Ok(Json(AnswerResponse {
        record,
        session: SessionView::build(&session, status),
    }))
}

/// POST /api/v1/quiz/sessions/:id/retry
///
/// `regenerate` builds a fresh question set with the same configuration and
/// starts it immediately; `setup` returns to configuration.
pub async fn handle_retry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RetryRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = load(&state, id).await?;

    let mut session = match request.mode {
        RetryMode::Regenerate => {
            let config = handle.lock().await.pending_regenerate()?;
            let set = build_questions(&state, &config).await;

            let mut session = handle.lock().await;
            ensure_config_unchanged(&session, &config)?;
            session.retry(RetryMode::Regenerate)?;
            session.begin(set.questions, Utc::now())?;
            session
        }
        RetryMode::Setup => {
            let mut session = handle.lock().await;
            session.retry(RetryMode::Setup)?;
            session
        }
    };

    let status = timer::poll(&mut session, Utc::now());
    Ok(Json(SessionView::build(&session, status)))
}

/// POST /api/v1/quiz/sessions/:id/reset
///
/// Abandons the run in progress, whatever its phase, and returns to setup.
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = load(&state, id).await?;
    let mut session = handle.lock().await;
    session.reset();
    let status = timer::poll(&mut session, Utc::now());
    Ok(Json(SessionView::build(&session, status)))
}

/// GET /api/v1/quiz/sessions/:id/results
pub async fn handle_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizSummary>, AppError> {
    let handle = load(&state, id).await?;
    let mut session = handle.lock().await;
    timer::poll(&mut session, Utc::now());
    Ok(Json(summarize(&session)?))
}

/// GET /api/v1/quiz/sessions/:id/transcript
pub async fn handle_transcript(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = load(&state, id).await?;
    let mut session = handle.lock().await;
    timer::poll(&mut session, Utc::now());
    let summary = summarize(&session)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_transcript(&summary),
    ))
}

/// DELETE /api/v1/quiz/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Quiz session {id} not found")))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::models::quiz::Difficulty;
    use crate::quiz::pipeline::tests::StubSource;
    use crate::quiz::source::QuestionSource;
    use crate::quiz::store::SessionStore;
    use crate::routes::build_router;

    use super::*;

    /// Never answers call number `stall_on`; every other call yields nothing,
    /// so the quiz is built from fallback questions.
    struct StallingSource {
        stall_on: usize,
        calls: AtomicUsize,
    }

    impl StallingSource {
        fn new(stall_on: usize) -> Self {
            Self {
                stall_on,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QuestionSource for StallingSource {
        async fn request(&self, _topic: &str, _difficulty: Difficulty, _count: usize) -> Option<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == self.stall_on {
                std::future::pending::<()>().await;
            }
            None
        }
    }

    fn app(source: impl QuestionSource + 'static) -> Router {
        build_router(AppState {
            source: Arc::new(source),
            sessions: SessionStore::new(),
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => request
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create(app: &Router, count: usize) -> String {
        create_timed(app, count, 60).await
    }

    async fn create_timed(app: &Router, count: usize, timer_seconds: u32) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/v1/quiz/sessions",
            Some(json!({ "config": {
                "topic": "Practice Set-3",
                "requested_count": count,
                "timer_seconds": timer_seconds
            } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["phase"], "setup");
        assert!(body["created_at"].is_string());
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_full_quiz_flow() {
        let app = app(StubSource::with_valid(2));
        let id = create(&app, 2).await;
        let base = format!("/api/v1/quiz/sessions/{id}");

        let (status, body) = send(&app, "POST", &format!("{base}/start"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "active");
        assert_eq!(body["from_source"], 2);
        assert_eq!(body["from_fallback"], 0);
        assert_eq!(body["total_questions"], 2);
        assert!(body["current_question"].get("correct_index").is_none());
        assert_eq!(body["timer"]["urgency"], "safe");

        let (status, body) = send(
            &app,
            "POST",
            &format!("{base}/answer"),
            Some(json!({ "option": 2, "question_index": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["record"]["is_correct"], true);
        assert_eq!(body["session"]["score"], 10);
        assert_eq!(body["session"]["current_index"], 1);

        let (_, body) = send(&app, "POST", &format!("{base}/answer"), Some(json!({ "option": 0 }))).await;
        assert_eq!(body["record"]["is_correct"], false);
        assert_eq!(body["session"]["phase"], "results");
        assert!(body["session"]["timer"].is_null());

        let (status, body) = send(&app, "GET", &format!("{base}/results"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 10);
        assert_eq!(body["correct_count"], 1);
        assert_eq!(body["total_questions"], 2);
        assert_eq!(body["timeout_count"], 0);
        assert_eq!(body["accuracy_percent"], 50.0);

        let (status, body) = send(&app, "POST", &format!("{base}/retry"), Some(json!({ "mode": "regenerate" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "active");
        assert_eq!(body["attempt"], 2);
        assert_eq!(body["score"], 0);

        let (status, _) = send(&app, "DELETE", &base, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, "GET", &base, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_start_with_broken_source_uses_fallback() {
        let app = app(StubSource::new(Some("not json at all".to_string())));
        let id = create(&app, 4).await;
        let (status, body) = send(&app, "POST", &format!("/api/v1/quiz/sessions/{id}/start"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_questions"], 4);
        assert_eq!(body["from_fallback"], 4);
    }

    #[tokio::test]
    async fn test_transcript_is_plain_text() {
        let app = app(StubSource::with_valid(1));
        let id = create(&app, 1).await;
        let base = format!("/api/v1/quiz/sessions/{id}");
        send(&app, "POST", &format!("{base}/start"), None).await;
        send(&app, "POST", &format!("{base}/answer"), Some(json!({ "option": 2 }))).await;

        let response = app
            .clone()
            .oneshot(Request::builder().uri(format!("{base}/transcript")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("Question 1: Correct"));
    }

    #[tokio::test]
    async fn test_answer_before_start_conflicts() {
        let app = app(StubSource::with_valid(1));
        let id = create(&app, 1).await;
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/quiz/sessions/{id}/answer"),
            Some(json!({ "option": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_stale_question_index_conflicts() {
        let app = app(StubSource::with_valid(3));
        let id = create(&app, 3).await;
        let base = format!("/api/v1/quiz/sessions/{id}");
        send(&app, "POST", &format!("{base}/start"), None).await;
        send(&app, "POST", &format!("{base}/answer"), Some(json!({ "option": 1, "question_index": 0 }))).await;

        let (status, _) = send(
            &app,
            "POST",
            &format!("{base}/answer"),
            Some(json!({ "option": 1, "question_index": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_invalid_option_is_bad_request() {
        let app = app(StubSource::with_valid(1));
        let id = create(&app, 1).await;
        let base = format!("/api/v1/quiz/sessions/{id}");
        send(&app, "POST", &format!("{base}/start"), None).await;
        let (status, _) = send(&app, "POST", &format!("{base}/answer"), Some(json!({ "option": 7 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_configuration_is_rejected() {
        let app = app(StubSource::with_valid(1));
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/quiz/sessions",
            Some(json!({ "config": { "topic": "Java", "requested_count": 0 } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_configure_then_start_uses_new_configuration() {
        let app = app(StubSource::new(None));
        let id = create(&app, 1).await;
        let base = format!("/api/v1/quiz/sessions/{id}");
        let (status, body) = send(
            &app,
            "PUT",
            &format!("{base}/config"),
            Some(json!({ "topic": "SQL", "difficulty": "hard", "requested_count": 6, "timer_seconds": 20 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["config"]["difficulty"], "hard");

        let (_, body) = send(&app, "POST", &format!("{base}/start"), None).await;
        assert_eq!(body["total_questions"], 6);
        assert_eq!(body["timer"]["remaining_seconds"].as_f64().map(|r| r <= 20.0), Some(true));

        let (status, _) = send(
            &app,
            "PUT",
            &format!("{base}/config"),
            Some(json!({ "topic": "SQL" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_reset_mid_quiz_returns_to_setup() {
        let app = app(StubSource::with_valid(3));
        let id = create(&app, 3).await;
        let base = format!("/api/v1/quiz/sessions/{id}");
        send(&app, "POST", &format!("{base}/start"), None).await;
        send(&app, "POST", &format!("{base}/answer"), Some(json!({ "option": 2 }))).await;

        let (status, body) = send(&app, "POST", &format!("{base}/reset"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "setup");
        assert_eq!(body["answered"], 0);
        assert_eq!(body["score"], 0);
        assert!(body["current_question"].is_null());
        assert_eq!(body["config"]["topic"], "Practice Set-3");
    }

    #[tokio::test]
    async fn test_abandoned_start_leaves_session_in_setup() {
        let app = app(StallingSource::new(0));
        let id = create(&app, 2).await;
        let base = format!("/api/v1/quiz/sessions/{id}");

        let abandoned = tokio::time::timeout(
            Duration::from_millis(100),
            send(&app, "POST", &format!("{base}/start"), None),
        )
        .await;
        assert!(abandoned.is_err());

        let (status, body) = send(&app, "GET", &base, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "setup");
        assert!(body["timer"].is_null());

        let (status, body) = send(&app, "POST", &format!("{base}/start"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "active");
        assert_eq!(body["from_fallback"], 2);
    }

    #[tokio::test]
    async fn test_abandoned_regenerate_leaves_results_in_place() {
        let app = app(StallingSource::new(1));
        let id = create(&app, 1).await;
        let base = format!("/api/v1/quiz/sessions/{id}");
        send(&app, "POST", &format!("{base}/start"), None).await;
        let (_, body) = send(&app, "POST", &format!("{base}/answer"), Some(json!({ "option": 0 }))).await;
        assert_eq!(body["session"]["phase"], "results");

        let abandoned = tokio::time::timeout(
            Duration::from_millis(100),
            send(&app, "POST", &format!("{base}/retry"), Some(json!({ "mode": "regenerate" }))),
        )
        .await;
        assert!(abandoned.is_err());

        let (status, _) = send(&app, "GET", &format!("{base}/results"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "POST", &format!("{base}/retry"), Some(json!({ "mode": "regenerate" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "active");
        assert_eq!(body["attempt"], 2);
    }

    #[tokio::test]
    async fn test_poll_after_deadline_auto_submits() {
        let app = app(StubSource::with_valid(2));
        let id = create_timed(&app, 2, 1).await;
        let base = format!("/api/v1/quiz/sessions/{id}");
        send(&app, "POST", &format!("{base}/start"), None).await;

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let (status, body) = send(&app, "GET", &base, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timed_out"]["timed_out"], true);
        assert_eq!(body["timed_out"]["question_index"], 0);
        assert_eq!(body["timed_out"]["selected_index"], -1);
        assert_eq!(body["current_index"], 1);
        assert_eq!(body["answered"], 1);

        let (_, body) = send(&app, "GET", &base, None).await;
        assert!(body["timed_out"].is_null());
        assert_eq!(body["current_index"], 1);
    }

    #[tokio::test]
    async fn test_results_before_finish_conflicts() {
        let app = app(StubSource::with_valid(2));
        let id = create(&app, 2).await;
        let (status, _) = send(&app, "GET", &format!("/api/v1/quiz/sessions/{id}/results"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_topics_listing() {
        let app = app(StubSource::new(None));
        let (status, body) = send(&app, "GET", "/api/v1/quiz/topics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 6);
        assert_eq!(body[0]["name"], "Practice Set-1");
    }
}
