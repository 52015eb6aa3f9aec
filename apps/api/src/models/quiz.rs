use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every question carries exactly this many options.
pub const OPTION_COUNT: usize = 4;
/// Question text shorter than this (in characters) is rejected.
pub const MIN_QUESTION_CHARS: usize = 10;
/// Explanations shorter than this are replaced by a synthesized default.
pub const MIN_EXPLANATION_CHARS: usize = 5;

pub const MAX_REQUESTED_COUNT: usize = 50;
pub const MAX_TIMER_SECONDS: u32 = 600;

pub const DEFAULT_TOPIC: &str = "Mixed Aptitude";
pub const DEFAULT_REQUESTED_COUNT: usize = 5;
pub const DEFAULT_TIMER_SECONDS: u32 = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
    #[error("question text must be at least {} characters", MIN_QUESTION_CHARS)]
    TextTooShort,

    #[error("expected {} options, got {0}", OPTION_COUNT)]
    WrongOptionCount(usize),

    #[error("option {0} is empty")]
    EmptyOption(usize),

    #[error("correct index {0} is out of range")]
    CorrectIndexOutOfRange(usize),
}

/// A single validated multiple-choice question.
///
/// Fields are private: the only way to obtain a `Question` is through
/// [`Question::new`], so every instance holds exactly four non-empty options
/// and a `correct_index` that addresses one of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    text: String,
    options: [String; OPTION_COUNT],
    correct_index: usize,
    explanation: String,
}

impl Question {
    /// Builds a question, trimming all text. A blank or too-short explanation is
    /// replaced with one that names the correct option.
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_string();
        if text.chars().count() < MIN_QUESTION_CHARS {
            return Err(QuestionError::TextTooShort);
        }

        let options: Vec<String> = options.into_iter().map(|o| o.trim().to_string()).collect();
        let options: [String; OPTION_COUNT] = options
            .try_into()
            .map_err(|v: Vec<String>| QuestionError::WrongOptionCount(v.len()))?;
        if let Some(empty) = options.iter().position(|o| o.is_empty()) {
            return Err(QuestionError::EmptyOption(empty));
        }

        if correct_index >= OPTION_COUNT {
            return Err(QuestionError::CorrectIndexOutOfRange(correct_index));
        }

        let explanation = explanation.into().trim().to_string();
        let explanation = if explanation.chars().count() < MIN_EXPLANATION_CHARS {
            default_explanation(&options[correct_index])
        } else {
            explanation
        };

        Ok(Self {
            text,
            options,
            correct_index,
            explanation,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }
}

pub fn default_explanation(correct_option: &str) -> String {
    format!("The correct answer is {correct_option}.")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("topic cannot be empty")]
    EmptyTopic,

    #[error("requested_count must be between 1 and {}, got {0}", MAX_REQUESTED_COUNT)]
    RequestedCount(usize),

    #[error("timer_seconds must be between 1 and {}, got {0}", MAX_TIMER_SECONDS)]
    TimerSeconds(u32),
}

/// Settings for one quiz run. Snapshotted when the session leaves `setup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizConfiguration {
    topic: String,
    difficulty: Difficulty,
    requested_count: usize,
    timer_seconds: u32,
}

impl QuizConfiguration {
    pub fn new(
        topic: impl Into<String>,
        difficulty: Difficulty,
        requested_count: usize,
        timer_seconds: u32,
    ) -> Result<Self, ConfigError> {
        let topic = topic.into().trim().to_string();
        if topic.is_empty() {
            return Err(ConfigError::EmptyTopic);
        }
        if requested_count == 0 || requested_count > MAX_REQUESTED_COUNT {
            return Err(ConfigError::RequestedCount(requested_count));
        }
        if timer_seconds == 0 || timer_seconds > MAX_TIMER_SECONDS {
            return Err(ConfigError::TimerSeconds(timer_seconds));
        }
        Ok(Self {
            topic,
            difficulty,
            requested_count,
            timer_seconds,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn requested_count(&self) -> usize {
        self.requested_count
    }

    pub fn timer_seconds(&self) -> u32 {
        self.timer_seconds
    }
}

impl Default for QuizConfiguration {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            difficulty: Difficulty::default(),
            requested_count: DEFAULT_REQUESTED_COUNT,
            timer_seconds: DEFAULT_TIMER_SECONDS,
        }
    }
}

/// Wire shape of a configuration; validated through `TryFrom`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizConfigurationRequest {
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_requested_count")]
    pub requested_count: usize,
    #[serde(default = "default_timer_seconds")]
    pub timer_seconds: u32,
}

fn default_requested_count() -> usize {
    DEFAULT_REQUESTED_COUNT
}

fn default_timer_seconds() -> u32 {
    DEFAULT_TIMER_SECONDS
}

impl TryFrom<QuizConfigurationRequest> for QuizConfiguration {
    type Error = ConfigError;

    fn try_from(req: QuizConfigurationRequest) -> Result<Self, Self::Error> {
        QuizConfiguration::new(req.topic, req.difficulty, req.requested_count, req.timer_seconds)
    }
}

/// One answered (or timed-out) question. Never modified after it is logged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerRecord {
    pub question_index: usize,
    /// `-1` when the question timed out.
    pub selected_index: i32,
    pub correct_index: usize,
    pub is_correct: bool,
    pub time_taken_seconds: f64,
    pub timed_out: bool,
}
