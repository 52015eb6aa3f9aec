//! Read-only results summary and transcript rendering.

use std::fmt::Write;

use serde::Serialize;

use crate::models::quiz::AnswerRecord;
use crate::quiz::session::{Phase, QuizError, QuizSession};
use crate::quiz::timer::elapsed_seconds;

const VERY_FAST_SECONDS: f64 = 5.0;
const FAST_SECONDS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Outstanding,
    Excellent,
    Good,
    Improving,
    KeepLearning,
}

#[derive(Debug, Clone, Serialize)]
pub struct Performance {
    pub tier: PerformanceTier,
    pub message: String,
}

/// Feedback band for an accuracy percentage.
pub fn performance(accuracy_percent: f64, correct: usize, total: usize) -> Performance {
    let (tier, message) = if accuracy_percent >= 90.0 {
        (
            PerformanceTier::Outstanding,
            format!("Outstanding! {correct}/{total} correct answers shows exceptional knowledge."),
        )
    } else if accuracy_percent >= 80.0 {
        (
            PerformanceTier::Excellent,
            format!("Excellent! You demonstrated solid understanding with {correct}/{total} correct answers."),
        )
    } else if accuracy_percent >= 70.0 {
        (
            PerformanceTier::Good,
            format!("Good work! {correct}/{total} correct shows good knowledge. Keep practicing to reach excellence."),
        )
    } else if accuracy_percent >= 50.0 {
        (
            PerformanceTier::Improving,
            format!("Keep improving! You got {correct}/{total} correct. More practice will get you there."),
        )
    } else {
        (
            PerformanceTier::KeepLearning,
            format!("Keep learning! {correct}/{total} is a start. Try again to boost your score."),
        )
    };
    Performance { tier, message }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Expired,
    VeryFast,
    Fast,
    Steady,
}

impl Pace {
    pub fn of(record: &AnswerRecord) -> Self {
        if record.timed_out {
            Pace::Expired
        } else if record.time_taken_seconds <= VERY_FAST_SECONDS {
            Pace::VeryFast
        } else if record.time_taken_seconds <= FAST_SECONDS {
            Pace::Fast
        } else {
            Pace::Steady
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Pace::Expired => "expired",
            Pace::VeryFast => "very fast",
            Pace::Fast => "fast",
            Pace::Steady => "steady",
        }
    }
}

/// One answer joined with the question it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerReview {
    #[serde(flatten)]
    pub record: AnswerRecord,
    pub question: String,
    pub options: Vec<String>,
    pub explanation: String,
    pub pace: Pace,
}

/// Final statistics for a finished quiz. Built from the answer log only.
#[derive(Debug, Clone, Serialize)]
pub struct QuizSummary {
    pub topic: String,
    pub difficulty: String,
    pub score: u32,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub total_questions: usize,
    pub accuracy_percent: f64,
    pub timeout_count: usize,
    pub average_time_seconds: f64,
    pub total_time_seconds: f64,
    pub performance: Performance,
    pub answer_log: Vec<AnswerReview>,
}

pub fn summarize(session: &QuizSession) -> Result<QuizSummary, QuizError> {
    if session.phase() != Phase::Results {
        return Err(QuizError::InvalidTransition {
            phase: session.phase(),
            action: "view results",
        });
    }

    let log = session.answer_log();
    let total_questions = session.questions().len();
    let correct_count = log.iter().filter(|r| r.is_correct).count();
    let timeout_count = log.iter().filter(|r| r.timed_out).count();

    let accuracy_percent = if total_questions == 0 {
        0.0
    } else {
        correct_count as f64 / total_questions as f64 * 100.0
    };
    let average_time_seconds = if log.is_empty() {
        0.0
    } else {
        log.iter().map(|r| r.time_taken_seconds).sum::<f64>() / log.len() as f64
    };
    let total_time_seconds = match (session.started_at(), session.finished_at()) {
        (Some(start), Some(end)) => elapsed_seconds(start, end),
        _ => 0.0,
    };

    let answer_log = log
        .iter()
        .filter_map(|record| {
            let q = session.questions().get(record.question_index)?;
            Some(AnswerReview {
                record: record.clone(),
                question: q.text().to_string(),
                options: q.options().to_vec(),
                explanation: q.explanation().to_string(),
                pace: Pace::of(record),
            })
        })
        .collect();

    Ok(QuizSummary {
        topic: session.config().topic().to_string(),
        difficulty: session.config().difficulty().to_string(),
        score: session.score(),
        correct_count,
        incorrect_count: total_questions - correct_count,
        total_questions,
        accuracy_percent,
        timeout_count,
        average_time_seconds,
        total_time_seconds,
        performance: performance(accuracy_percent, correct_count, total_questions),
        answer_log,
    })
}

/// Plain-text transcript suitable for download.
pub fn render_transcript(summary: &QuizSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Quiz Results: {} ({})", summary.topic, summary.difficulty);
    let _ = writeln!(out, "Score: {}", summary.score);
    let _ = writeln!(
        out,
        "Correct: {}/{} ({:.1}%)",
        summary.correct_count, summary.total_questions, summary.accuracy_percent
    );
    let _ = writeln!(out, "Timeouts: {}", summary.timeout_count);
    let _ = writeln!(out, "Average time: {:.1}s", summary.average_time_seconds);
    let _ = writeln!(out, "Total time: {:.1}m", summary.total_time_seconds / 60.0);
    let _ = writeln!(out, "{}", summary.performance.message);

    for (i, review) in summary.answer_log.iter().enumerate() {
        let status = if review.record.timed_out {
            "Time up"
        } else if review.record.is_correct {
            "Correct"
        } else {
            "Incorrect"
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "Question {}: {}", i + 1, status);
        let _ = writeln!(out, "Q: {}", review.question);
        for (j, option) in review.options.iter().enumerate() {
            let letter = (b'A' + j as u8) as char;
            let mut marks = Vec::new();
            if j == review.record.correct_index {
                marks.push("correct answer");
            }
            if review.record.selected_index == j as i32 {
                marks.push("your answer");
            }
            if marks.is_empty() {
                let _ = writeln!(out, "  {letter}. {option}");
            } else {
                let _ = writeln!(out, "  {letter}. {option} ({})", marks.join(", "));
            }
        }
        if review.record.timed_out {
            let _ = writeln!(out, "Time expired - no answer selected");
        }
        let _ = writeln!(out, "Explanation: {}", review.explanation);
        let _ = writeln!(
            out,
            "Time: {:.1}s ({})",
            review.record.time_taken_seconds,
            review.pace.label()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::session::tests::{active_session, secs, t0};
    use crate::quiz::timer::expire;

    /// Three questions: correct at 4s, wrong at 12s, then a timeout.
    fn finished_session() -> QuizSession {
        let mut session = active_session(3, 20);
        session.select_answer(2, t0() + secs(4.0)).unwrap();
        session.select_answer(0, t0() + secs(16.0)).unwrap();
        expire(&mut session, t0() + secs(40.0)).unwrap();
        session
    }

    #[test]
    fn test_summary_requires_results_phase() {
        let session = active_session(2, 20);
        assert!(summarize(&session).is_err());
    }

    #[test]
    fn test_summary_statistics() {
        let summary = summarize(&finished_session()).unwrap();
        assert_eq!(summary.score, 10);
        assert_eq!(summary.correct_count, 1);
        assert_eq!(summary.incorrect_count, 2);
        assert_eq!(summary.total_questions, 3);
        assert_eq!(summary.timeout_count, 1);
        assert!((summary.accuracy_percent - 100.0 / 3.0).abs() < 1e-9);
        assert!((summary.average_time_seconds - (4.0 + 12.0 + 20.0) / 3.0).abs() < 1e-9);
        assert!((summary.total_time_seconds - 40.0).abs() < 1e-9);
        assert_eq!(summary.performance.tier, PerformanceTier::KeepLearning);
    }

    #[test]
    fn test_summary_reviews_carry_pace() {
        let summary = summarize(&finished_session()).unwrap();
        let paces: Vec<Pace> = summary.answer_log.iter().map(|r| r.pace).collect();
        assert_eq!(paces, vec![Pace::VeryFast, Pace::Steady, Pace::Expired]);
        assert_eq!(summary.answer_log[0].question, "Test question number 0?");
    }

    #[test]
    fn test_performance_tiers() {
        assert_eq!(performance(95.0, 19, 20).tier, PerformanceTier::Outstanding);
        assert_eq!(performance(80.0, 4, 5).tier, PerformanceTier::Excellent);
        assert_eq!(performance(70.0, 7, 10).tier, PerformanceTier::Good);
        assert_eq!(performance(50.0, 1, 2).tier, PerformanceTier::Improving);
        assert_eq!(performance(49.9, 0, 2).tier, PerformanceTier::KeepLearning);
        assert!(performance(80.0, 4, 5).message.contains("4/5"));
    }

    #[test]
    fn test_transcript_marks_answers() {
        let summary = summarize(&finished_session()).unwrap();
        let text = render_transcript(&summary);
        assert!(text.starts_with("Quiz Results: Java (easy)"));
        assert!(text.contains("Question 1: Correct"));
        assert!(text.contains("Question 2: Incorrect"));
        assert!(text.contains("Question 3: Time up"));
        assert!(text.contains("  C. c (correct answer, your answer)"));
        assert!(text.contains("  A. a (your answer)"));
        assert!(text.contains("Time expired - no answer selected"));
    }

    #[test]
    fn test_serialized_review_flattens_record() {
        let summary = summarize(&finished_session()).unwrap();
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["answer_log"][2]["timed_out"], true);
        assert_eq!(value["answer_log"][2]["selected_index"], -1);
        assert_eq!(value["answer_log"][0]["pace"], "very_fast");
    }
}
