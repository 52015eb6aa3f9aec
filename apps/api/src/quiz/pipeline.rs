//! Question pipeline: source → validator → fallback top-up.
//!
//! Always returns exactly `requested_count` questions. Source failures and
//! malformed output are absorbed here and only show up in logs.

use serde::Serialize;
use tracing::info;

use crate::models::quiz::{Question, QuizConfiguration};
use crate::quiz::fallback::FallbackGenerator;
use crate::quiz::source::QuestionSource;
use crate::quiz::validator::normalize;

/// An assembled question list plus where its entries came from.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionSet {
    pub questions: Vec<Question>,
    pub from_source: usize,
    pub from_fallback: usize,
}

pub async fn assemble_questions(
    source: &dyn QuestionSource,
    config: &QuizConfiguration,
    seed: u64,
) -> QuestionSet {
    let target = config.requested_count();

    let mut questions = match source
        .request(config.topic(), config.difficulty(), target)
        .await
    {
        Some(raw) => normalize(&raw, target),
        None => Vec::new(),
    };
    let from_source = questions.len();

    let shortfall = target.saturating_sub(from_source);
    if shortfall > 0 {
        info!(
            "Topping up {} of {} questions from fallback templates",
            shortfall, target
        );
        questions.extend(FallbackGenerator::new(seed).generate(
            config.topic(),
            config.difficulty(),
            shortfall,
        ));
    }
    questions.truncate(target);

    info!(
        "Assembled {} questions ({} from source, {} from fallback)",
        questions.len(),
        from_source,
        shortfall
    );

    QuestionSet {
        questions,
        from_source,
        from_fallback: shortfall,
    }
}
