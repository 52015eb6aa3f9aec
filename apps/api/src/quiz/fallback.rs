//! Fallback question generator: seeded templates that never fail.
//!
//! Used whenever the question source yields nothing usable or too few valid
//! questions. Output is a pure function of `(seed, topic, difficulty, count)`:
//! the seed only shuffles option order, the correct answer always follows its
//! option.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::models::quiz::{Difficulty, Question};

/// One fill-in template. `{topic}` is replaced with the quiz topic.
struct Template {
    question: &'static str,
    correct: &'static str,
    distractors: [&'static str; 3],
    explanation: &'static str,
}

const EASY_TEMPLATES: &[Template] = &[
    Template {
        question: "What is the best first step when approaching a {topic} problem?",
        correct: "Read the question carefully and identify what is being asked",
        distractors: [
            "Pick the longest option",
            "Skip straight to the options without reading",
            "Guess before reading the question",
        ],
        explanation: "Understanding exactly what a {topic} question asks prevents solving the wrong problem.",
    },
    Template {
        question: "When practising {topic}, what most reliably improves accuracy?",
        correct: "Solving varied problems regularly and reviewing mistakes",
        distractors: [
            "Memorising answers to a single question set",
            "Practising only the questions you already know",
            "Avoiding timed practice entirely",
        ],
        explanation: "Regular varied practice with review builds durable {topic} skills.",
    },
    Template {
        question: "In a timed {topic} test, what should you do with a question you cannot solve quickly?",
        correct: "Mark it and return after attempting the others",
        distractors: [
            "Spend all remaining time on it",
            "Leave the test early",
            "Change all previous answers",
        ],
        explanation: "Returning later protects time for questions you can answer in {topic} tests.",
    },
    Template {
        question: "Which habit helps most when checking an answer in {topic}?",
        correct: "Verifying the result against the conditions in the question",
        distractors: [
            "Assuming the first answer is always right",
            "Choosing the option that appears most often",
            "Checking only the units of the answer",
        ],
        explanation: "An answer that satisfies every stated condition is far more likely to be correct.",
    },
];

const MEDIUM_TEMPLATES: &[Template] = &[
    Template {
        question: "A {topic} problem gives more information than needed. What is the best strategy?",
        correct: "Identify the data relevant to the question and set the rest aside",
        distractors: [
            "Use every number given in some calculation",
            "Assume the question contains an error",
            "Answer using only the first sentence",
        ],
        explanation: "{topic} questions often include distractor data; filtering it keeps the solution focused.",
    },
    Template {
        question: "Two approaches to a {topic} question give different answers. What should you do first?",
        correct: "Recheck the assumptions and steps of both approaches",
        distractors: [
            "Average the two answers",
            "Pick whichever answer is larger",
            "Discard both and guess",
        ],
        explanation: "A disagreement signals a faulty assumption or step that must be found.",
    },
    Template {
        question: "Which technique is most useful for eliminating options in a {topic} multiple-choice question?",
        correct: "Rule out options that contradict a condition in the question",
        distractors: [
            "Rule out options that look unfamiliar",
            "Rule out the first and last options",
            "Rule out options with numbers in them",
        ],
        explanation: "Options that violate a stated condition cannot be correct.",
    },
    Template {
        question: "What is the main benefit of estimating before solving a {topic} problem exactly?",
        correct: "It quickly exposes answers that are clearly out of range",
        distractors: [
            "It replaces the need for an exact solution",
            "It guarantees the exact answer",
            "It makes the question easier to read",
        ],
        explanation: "A rough estimate lets you discard implausible options early in {topic} problems.",
    },
];

const HARD_TEMPLATES: &[Template] = &[
    Template {
        question: "In an advanced {topic} problem with several constraints, which approach is usually most efficient?",
        correct: "Apply the most restrictive constraint first to narrow the possibilities",
        distractors: [
            "Enumerate every possibility before applying any constraint",
            "Apply constraints in the order they are written",
            "Ignore constraints that seem redundant",
        ],
        explanation: "The most restrictive constraint prunes the search space fastest.",
    },
    Template {
        question: "When a {topic} question combines two concepts, what is the best way to break it down?",
        correct: "Solve each concept as a sub-problem and combine the results",
        distractors: [
            "Solve only the concept you find easier",
            "Treat the question as a single formula",
            "Look for a keyword and apply a memorised answer",
        ],
        explanation: "Decomposing a compound {topic} problem keeps each step checkable.",
    },
    Template {
        question: "Which statement about verifying a complex {topic} solution is most accurate?",
        correct: "Substituting the answer back into every given condition confirms it",
        distractors: [
            "Re-reading the solution once is sufficient",
            "A solution is verified if it is an integer",
            "Verification is unnecessary when the method is standard",
        ],
        explanation: "Only an answer consistent with all conditions is a verified solution.",
    },
    Template {
        question: "Under strict time pressure in a hard {topic} section, which strategy maximises the expected score?",
        correct: "Attempt high-confidence questions first, then revisit the difficult ones",
        distractors: [
            "Attempt questions strictly in order regardless of difficulty",
            "Start with the hardest question to get it out of the way",
            "Spend equal time on every question",
        ],
        explanation: "Securing likely marks first reduces the cost of getting stuck.",
    },
];

fn templates_for(difficulty: Difficulty) -> &'static [Template] {
    match difficulty {
        Difficulty::Easy => EASY_TEMPLATES,
        Difficulty::Medium => MEDIUM_TEMPLATES,
        Difficulty::Hard => HARD_TEMPLATES,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FallbackGenerator {
    seed: u64,
}

impl FallbackGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Produces exactly `count` questions, cycling through the templates for
    /// `difficulty`. Later cycles carry a round marker so question text stays
    /// distinct.
    pub fn generate(&self, topic: &str, difficulty: Difficulty, count: usize) -> Vec<Question> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let templates = templates_for(difficulty);
        let topic = topic.trim();

        (0..count)
            .filter_map(|i| {
                let template = &templates[i % templates.len()];
                let round = i / templates.len();
                render(template, topic, round, &mut rng)
            })
            .collect()
    }
}

fn render(template: &Template, topic: &str, round: usize, rng: &mut StdRng) -> Option<Question> {
    let fill = |s: &str| s.replace("{topic}", topic);

    let mut text = fill(template.question);
    if round > 0 {
        text = format!("{text} (round {})", round + 1);
    }

    let correct = fill(template.correct);
    let mut options: Vec<String> = std::iter::once(correct.clone())
        .chain(template.distractors.iter().map(|d| fill(*d)))
        .collect();
    options.shuffle(rng);
    let correct_index = options.iter().position(|o| *o == correct)?;

    // Templates are fixed data that satisfy every invariant; `ok()` only
    // discards a case that cannot occur.
    Question::new(text, options, correct_index, fill(template.explanation)).ok()
}
