// Prompt constants and topic data for quiz question generation.
// Reuses cross-cutting fragments from llm_client::prompts.

use serde::Serialize;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::models::quiz::Difficulty;

/// Used when a topic has no catalog entry.
pub const GENERIC_TOPIC_DESCRIPTION: &str = "General aptitude and reasoning problems";

const MIXED_SET: &str = "Mixed aptitude and reasoning test covering advanced mathematics \
    (compound interest, combinatorics, LCM, probability, statistics), practical problem-solving \
    (work-time, age, speed-distance, percentages, averages, train problems), logical reasoning \
    (patterns, spatial reasoning, analytical puzzles, linear and circular seating arrangements, \
    number, letter and mixed series completion), verbal ability (grammar, vocabulary), and \
    language-specific code-output puzzles covering Python, Java, C, C++, JavaScript, SQL, DSA, \
    algorithms, memory and pointers, and debugging";

/// A named practice set and the syllabus the generator is asked to cover.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TopicEntry {
    pub name: &'static str,
    pub description: &'static str,
}

pub const TOPIC_CATALOG: &[TopicEntry] = &[
    TopicEntry {
        name: "Practice Set-1",
        description: "General aptitude covering quantitative ability: distance and relative \
            speed, profit and loss, pipes and cisterns, averages, work and time, trains and \
            platforms, percentages, ages and ratios, partnership, mixtures, boats and streams, \
            remainders, arithmetic progressions, powers, clock angles, calendars, simple and \
            compound interest, permutations and combinations, successive discounts",
    },
    TopicEntry {
        name: "Practice Set-2",
        description: "Logical reasoning: clock and time calculation, coding and decoding, \
            artificial language deduction, family relationships, number and letter series, \
            dice and probability, Venn diagrams, row and circular seating arrangements, \
            direction and distance, calendar day calculation",
    },
    TopicEntry {
        name: "Practice Set-3",
        description: "Programming MCQs: Python recursion, slicing and set operations; Java \
            static members and arrays; C undefined behavior and operator precedence; C++ \
            references and virtual functions; JavaScript floating point and array methods; SQL \
            queries, joins, keys and constraints; data structures and algorithms; object-oriented \
            programming, memory management, complexity analysis; output prediction",
    },
    TopicEntry {
        name: "Practice Set-4",
        description: MIXED_SET,
    },
    TopicEntry {
        name: "Practice Set-5",
        description: MIXED_SET,
    },
    TopicEntry {
        name: "Practice Set-6",
        description: MIXED_SET,
    },
];

/// Resolves a topic label to its syllabus description.
pub fn topic_description(topic: &str) -> &'static str {
    TOPIC_CATALOG
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(topic.trim()))
        .map(|t| t.description)
        .unwrap_or(GENERIC_TOPIC_DESCRIPTION)
}

pub fn difficulty_description(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "basic and simple level suitable for beginners",
        Difficulty::Medium => "moderate difficulty with standard complexity",
        Difficulty::Hard => "challenging and complex requiring advanced thinking",
    }
}

/// System prompt for question generation.
pub const QUESTION_SYSTEM: &str = JSON_ONLY_SYSTEM;

/// Question generation prompt. Replace `{count}`, `{topic}` and `{difficulty}` before sending.
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Create exactly {count} multiple-choice questions for Computer Engineering placement preparation.

TOPIC: {topic}
DIFFICULTY: {difficulty}

REQUIREMENTS:
1. Each question must have exactly 4 options
2. Questions should be relevant for campus placements
3. Include clear explanations for correct answers
4. Use proper mathematical notation where needed

OUTPUT FORMAT - Return ONLY a valid JSON array:
[
  {
    "question": "What is 25% of 80?",
    "options": ["15", "20", "25", "30"],
    "correct": 1,
    "explanation": "25% of 80 = (25/100) x 80 = 0.25 x 80 = 20"
  }
]

Generate exactly {count} questions now. Return only the JSON array, no other text."#;

pub fn build_question_prompt(topic: &str, difficulty: Difficulty, count: usize) -> String {
    QUESTION_PROMPT_TEMPLATE
        .replace("{count}", &count.to_string())
        .replace("{topic}", topic_description(topic))
        .replace("{difficulty}", difficulty_description(difficulty))
}
