//! Question validator: the only place that trusts the shape of source output.
//!
//! `normalize` extracts a JSON array from free-form text and keeps the elements
//! that form valid [`Question`]s, in order, capped at the target count. It fails
//! closed: bad elements are dropped, unparseable text yields nothing.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::quiz::{Question, OPTION_COUNT};

const FIELD_QUESTION: &str = "question";
const FIELD_OPTIONS: &str = "options";
const FIELD_CORRECT: &str = "correct";
const FIELD_EXPLANATION: &str = "explanation";

const REQUIRED_FIELDS: [&str; 4] = [
    FIELD_QUESTION,
    FIELD_OPTIONS,
    FIELD_CORRECT,
    FIELD_EXPLANATION,
];

/// Parses raw source text into at most `target_count` valid questions.
pub fn normalize(raw_text: &str, target_count: usize) -> Vec<Question> {
    let json_text = extract_json_block(raw_text);

    let parsed: Value = match serde_json::from_str(json_text) {
        Ok(v) => v,
        Err(e) => {
            warn!("Question source output is not valid JSON: {e}");
            return Vec::new();
        }
    };

    let Value::Array(items) = parsed else {
        warn!("Question source output is not a JSON array");
        return Vec::new();
    };

    let total = items.len();
    let questions: Vec<Question> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let q = coerce_question(item);
            if q.is_none() {
                debug!("Dropping malformed question element {i}");
            }
            q
        })
        .take(target_count)
        .collect();

    debug!("Validator accepted {}/{} elements", questions.len(), total);
    questions
}

/// Locates the JSON payload inside model output.
///
/// Preference order: a ```json fenced block, any fenced block, the span from
/// the first `[` to the last `]`, then the whole text trimmed.
pub fn extract_json_block(text: &str) -> &str {
    for fence in ["```json", "```"] {
        if let Some(open) = text.find(fence) {
            let start = open + fence.len();
            if let Some(len) = text[start..].find("```") {
                return text[start..start + len].trim();
            }
        }
    }

    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if end > start {
            return &text[start..=end];
        }
    }

    text.trim()
}

fn coerce_question(item: &Value) -> Option<Question> {
    let obj = item.as_object()?;
    if !REQUIRED_FIELDS.iter().all(|f| obj.contains_key(*f)) {
        return None;
    }

    let text = scalar_to_string(&obj[FIELD_QUESTION])?;

    let options = obj[FIELD_OPTIONS].as_array()?;
    if options.len() < OPTION_COUNT {
        return None;
    }
    let options = options
        .iter()
        .take(OPTION_COUNT)
        .map(scalar_to_string)
        .collect::<Option<Vec<String>>>()?;

    let correct = coerce_index(&obj[FIELD_CORRECT])?;
    let explanation = explanation_text(obj);

    Question::new(text, options, correct, explanation).ok()
}

/// Strings as-is, numbers and booleans stringified; anything else is unusable.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn explanation_text(obj: &Map<String, Value>) -> String {
    obj.get(FIELD_EXPLANATION)
        .and_then(scalar_to_string)
        .unwrap_or_default()
}

/// Integers as-is, finite floats truncated, integer strings parsed. Negative
/// values are rejected; the upper bound is enforced by `Question::new`.
fn coerce_index(value: &Value) -> Option<usize> {
    let index = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64()?;
                if !f.is_finite() {
                    return None;
                }
                f.trunc() as i64
            }
        },
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    usize::try_from(index).ok()
}
