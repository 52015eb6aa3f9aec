//! Quiz session state machine.
//!
//! Phases: `setup → generating → active → results`, with `reset` returning to
//! `setup` from anywhere and `retry` leaving `results` for either `generating`
//! (same configuration, fresh questions) or `setup`.
//!
//! The session never reads the clock itself. Every time-dependent operation
//! takes `now`, so the caller decides when time advances (one evaluation per
//! inbound request or UI refresh).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::quiz::{AnswerRecord, Question, QuizConfiguration, OPTION_COUNT};
use crate::quiz::timer;

/// Points awarded for each correct, non-timed-out answer.
pub const POINTS_PER_CORRECT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Generating,
    Active,
    Results,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Setup => "setup",
            Phase::Generating => "generating",
            Phase::Active => "active",
            Phase::Results => "results",
        };
        f.write_str(s)
    }
}

/// What to do after a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryMode {
    /// Same configuration, fresh question set.
    Regenerate,
    /// Back to editing the configuration.
    Setup,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("cannot {action} while the quiz is in the {phase} phase")]
    InvalidTransition { phase: Phase, action: &'static str },

    #[error("no questions are available for this quiz")]
    NoQuestions,

    #[error("expected {expected} questions, got {actual}")]
    QuestionCountMismatch { expected: usize, actual: usize },

    #[error("option {0} does not exist")]
    InvalidOption(usize),
}

/// Start instant and deadline of the question currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionDeadline {
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    phase: Phase,
    config: QuizConfiguration,
    /// Incremented every time a question set is loaded.
    attempt: u32,
    questions: Vec<Question>,
    current_index: usize,
    deadline: Option<QuestionDeadline>,
    timer_active: bool,
    auto_submitted: bool,
    answer_log: Vec<AnswerRecord>,
    score: u32,
    correct_count: usize,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    pub fn new(config: QuizConfiguration, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            phase: Phase::Setup,
            config,
            attempt: 0,
            questions: Vec::new(),
            current_index: 0,
            deadline: None,
            timer_active: false,
            auto_submitted: false,
            answer_log: Vec::new(),
            score: 0,
            correct_count: 0,
            started_at: None,
            finished_at: None,
        }
    }

    // ── transitions ─────────────────────────────────────────────────────────

    /// Replaces the configuration. Only allowed during setup.
    pub fn configure(&mut self, config: QuizConfiguration) -> Result<(), QuizError> {
        self.require(Phase::Setup, "change the configuration")?;
        self.config = config;
        Ok(())
    }

    /// `setup → generating`. Returns the configuration snapshot the question
    /// pipeline should use.
    pub fn start(&mut self) -> Result<QuizConfiguration, QuizError> {
        self.require(Phase::Setup, "start the quiz")?;
        self.phase = Phase::Generating;
        info!(
            "Session {} generating {} {} questions on '{}'",
            self.id,
            self.config.requested_count(),
            self.config.difficulty(),
            self.config.topic()
        );
        Ok(self.config.clone())
    }

    /// The configuration `start` would snapshot, checked without leaving setup.
    /// Callers that build the question set before committing use this, so an
    /// abandoned build leaves the session untouched.
    pub fn pending_start(&self) -> Result<QuizConfiguration, QuizError> {
        self.require(Phase::Setup, "start the quiz")?;
        Ok(self.config.clone())
    }

    /// Same as `pending_start`, for `retry(RetryMode::Regenerate)` from results.
    pub fn pending_regenerate(&self) -> Result<QuizConfiguration, QuizError> {
        self.require(Phase::Results, "retry")?;
        Ok(self.config.clone())
    }

    /// `generating → active`. Installs the question set and starts the timer
    /// for question 0. An empty or wrongly sized set sends the session back to
    /// setup.
    pub fn begin(&mut self, questions: Vec<Question>, now: DateTime<Utc>) -> Result<(), QuizError> {
        self.require(Phase::Generating, "load questions")?;

        if questions.is_empty() {
            self.phase = Phase::Setup;
            return Err(QuizError::NoQuestions);
        }
        let expected = self.config.requested_count();
        if questions.len() != expected {
            self.phase = Phase::Setup;
            return Err(QuizError::QuestionCountMismatch {
                expected,
                actual: questions.len(),
            });
        }

        self.clear_progress();
        self.questions = questions;
        self.attempt += 1;
        self.started_at = Some(now);
        self.phase = Phase::Active;
        self.activate_question(now);
        info!("Session {} attempt {} is active", self.id, self.attempt);
        Ok(())
    }

    /// Records an explicit answer for the current question.
    ///
    /// If the question's time has already run out at `now`, the selection
    /// loses: the question is recorded as timed out instead.
    pub fn select_answer(
        &mut self,
        option: usize,
        now: DateTime<Utc>,
    ) -> Result<AnswerRecord, QuizError> {
        self.require(Phase::Active, "answer a question")?;
        if option >= OPTION_COUNT {
            return Err(QuizError::InvalidOption(option));
        }

        if timer::remaining(self, now) <= 0.0 {
            debug!(
                "Session {} selection arrived after the deadline of question {}",
                self.id, self.current_index
            );
            return Ok(self.record_timeout(now));
        }

        let question = &self.questions[self.current_index];
        let correct_index = question.correct_index();
        let is_correct = option == correct_index;
        let time_taken_seconds = self
            .deadline
            .map(|d| timer::elapsed_seconds(d.started_at, now))
            .unwrap_or(0.0);

        let record = AnswerRecord {
            question_index: self.current_index,
            selected_index: option as i32,
            correct_index,
            is_correct,
            time_taken_seconds,
            timed_out: false,
        };

        self.timer_active = false;
        self.deadline = None;
        if is_correct {
            self.score += POINTS_PER_CORRECT;
            self.correct_count += 1;
        }
        self.answer_log.push(record.clone());
        self.advance(now);
        Ok(record)
    }

    /// `results → generating` or `results → setup`.
    pub fn retry(&mut self, mode: RetryMode) -> Result<Phase, QuizError> {
        self.require(Phase::Results, "retry")?;
        match mode {
            RetryMode::Regenerate => {
                self.clear_progress();
                self.questions.clear();
                self.phase = Phase::Generating;
            }
            RetryMode::Setup => self.reset(),
        }
        Ok(self.phase)
    }

    /// Abandons whatever is in progress and returns to setup, keeping the
    /// configuration for editing.
    pub fn reset(&mut self) {
        self.clear_progress();
        self.questions.clear();
        self.phase = Phase::Setup;
    }

    /// The timeout branch: logs a timed-out record, then advances. Callers must
    /// have checked that the session is active and the guard allows it.
    pub(crate) fn record_timeout(&mut self, now: DateTime<Utc>) -> AnswerRecord {
        let question = &self.questions[self.current_index];
        let record = AnswerRecord {
            question_index: self.current_index,
            selected_index: -1,
            correct_index: question.correct_index(),
            is_correct: false,
            time_taken_seconds: f64::from(self.config.timer_seconds()),
            timed_out: true,
        };

        self.auto_submitted = true;
        self.timer_active = false;
        self.deadline = None;
        self.answer_log.push(record.clone());
        info!(
            "Session {} question {} timed out",
            self.id, record.question_index
        );
        self.advance(now);
        record
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.activate_question(now);
        } else {
            self.phase = Phase::Results;
            self.finished_at = Some(now);
            info!(
                "Session {} finished: score {} ({} / {} correct)",
                self.id,
                self.score,
                self.correct_count,
                self.questions.len()
            );
        }
    }

    fn activate_question(&mut self, now: DateTime<Utc>) {
        self.deadline = Some(QuestionDeadline {
            started_at: now,
            expires_at: now + Duration::seconds(i64::from(self.config.timer_seconds())),
        });
        self.timer_active = true;
        self.auto_submitted = false;
    }

    fn clear_progress(&mut self) {
        self.current_index = 0;
        self.deadline = None;
        self.timer_active = false;
        self.auto_submitted = false;
        self.answer_log.clear();
        self.score = 0;
        self.correct_count = 0;
        self.started_at = None;
        self.finished_at = None;
    }

    fn require(&self, phase: Phase, action: &'static str) -> Result<(), QuizError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(QuizError::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }

    // ── accessors ───────────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &QuizConfiguration {
        &self.config
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The question awaiting an answer, if the session is active.
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Active => self.questions.get(self.current_index),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<QuestionDeadline> {
        self.deadline
    }

    pub fn timer_active(&self) -> bool {
        self.timer_active
    }

    pub fn auto_submitted(&self) -> bool {
        self.auto_submitted
    }

    pub fn answer_log(&self) -> &[AnswerRecord] {
        &self.answer_log
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }
}
