//! Per-question countdown and auto-submit.
//!
//! Holds no state of its own: everything is computed from the session and the
//! `now` the caller passes in. Expiry is detected by polling, so a timeout is
//! recorded on the first evaluation at or after the deadline.
//!
//! Double-firing is prevented by the session's `timer_active` / `auto_submitted`
//! guard, which is reset only when a new question becomes active.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::quiz::AnswerRecord;
use crate::quiz::session::{Phase, QuizSession};

const WARNING_SECONDS: f64 = 10.0;
const CRITICAL_SECONDS: f64 = 5.0;

/// How close the current question is to running out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerUrgency {
    Safe,
    Warning,
    Critical,
}

impl TimerUrgency {
    pub fn from_remaining(remaining_seconds: f64) -> Self {
        if remaining_seconds <= CRITICAL_SECONDS {
            TimerUrgency::Critical
        } else if remaining_seconds <= WARNING_SECONDS {
            TimerUrgency::Warning
        } else {
            TimerUrgency::Safe
        }
    }
}

/// Result of one refresh-cycle evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerStatus {
    pub remaining_seconds: f64,
    pub urgency: TimerUrgency,
    /// Set when this evaluation auto-submitted the previous question.
    pub expired: Option<AnswerRecord>,
}

/// Seconds between `start` and `now`, never negative.
pub fn elapsed_seconds(start: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - start).num_milliseconds().max(0);
    millis as f64 / 1000.0
}

/// Seconds left on the current question: `max(0, timer_seconds − elapsed)`.
///
/// Before a question is active the full budget is reported; once the quiz is
/// over there is nothing left.
pub fn remaining(session: &QuizSession, now: DateTime<Utc>) -> f64 {
    let budget = f64::from(session.config().timer_seconds());
    match (session.phase(), session.deadline()) {
        (Phase::Active, Some(deadline)) => (budget - elapsed_seconds(deadline.started_at, now)).max(0.0),
        (Phase::Results, _) => 0.0,
        _ => budget,
    }
}

/// Auto-submits the current question if its time is up.
///
/// Idempotent: returns `None` unless the session is active, the timer for the
/// current question is running, it has not already been auto-submitted, and
/// `remaining(now)` is zero.
pub fn expire(session: &mut QuizSession, now: DateTime<Utc>) -> Option<AnswerRecord> {
    if session.phase() != Phase::Active || !session.timer_active() || session.auto_submitted() {
        return None;
    }
    if remaining(session, now) > 0.0 {
        return None;
    }
    Some(session.record_timeout(now))
}

/// One refresh cycle: expire if due, then report the timer for whatever
/// question is now current.
pub fn poll(session: &mut QuizSession, now: DateTime<Utc>) -> TimerStatus {
    let expired = expire(session, now);
    let remaining_seconds = remaining(session, now);
    TimerStatus {
        remaining_seconds,
        urgency: TimerUrgency::from_remaining(remaining_seconds),
        expired,
    }
}
