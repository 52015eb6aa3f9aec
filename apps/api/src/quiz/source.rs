//! Question Source: pluggable adapter over the remote question generator.
//!
//! Implementations return raw text that is expected to embed a JSON array of
//! question objects. Nothing is parsed here. Every failure (network error,
//! timeout, non-success status, empty body) collapses to `None`, which callers
//! treat exactly like malformed output.
//!
//! `AppState` holds an `Arc<dyn QuestionSource>`, chosen at startup from config.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::llm_client::LlmClient;
use crate::models::quiz::Difficulty;
use crate::quiz::prompts::{build_question_prompt, QUESTION_SYSTEM};

#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn request(&self, topic: &str, difficulty: Difficulty, count: usize) -> Option<String>;
}

/// Asks the shared LLM client for a batch of questions.
pub struct LlmQuestionSource {
    llm: LlmClient,
}

impl LlmQuestionSource {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl QuestionSource for LlmQuestionSource {
    async fn request(&self, topic: &str, difficulty: Difficulty, count: usize) -> Option<String> {
        let prompt = build_question_prompt(topic, difficulty, count);
        info!("Requesting {count} {difficulty} questions on '{topic}' from LLM");

        match self.llm.call_text(&prompt, QUESTION_SYSTEM).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Question source unavailable, falling back to templates: {e}");
                None
            }
        }
    }
}

/// Used when no API key is configured. Every quiz is built from templates.
pub struct OfflineQuestionSource;

#[async_trait]
impl QuestionSource for OfflineQuestionSource {
    async fn request(&self, _topic: &str, _difficulty: Difficulty, _count: usize) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_offline_source_never_yields_text() {
        let source = OfflineQuestionSource;
        assert!(source.request("Practice Set-1", Difficulty::Easy, 5).await.is_none());
    }

    #[tokio::test]
    async fn test_llm_source_swallows_transport_failure() {
        let llm = LlmClient::new("key".to_string(), Duration::from_millis(200))
            .unwrap()
            .with_endpoint("http://127.0.0.1:9/v1/messages");
        let source = LlmQuestionSource::new(llm);
        assert!(source.request("Java", Difficulty::Medium, 3).await.is_none());
    }
}
