pub mod extractor;
pub mod fallback;
pub mod sanitizer;

use serde_json::Value as JsonValue;

use crate::models::question::Question;

pub use fallback::{ParseFailure, ParseTier};

/// Raw model text in, parsed JSON document out: extraction, sanitizing and
/// the fallback chain, in that order.
pub fn parse_quiz_response(raw: &str) -> Result<JsonValue, ParseFailure> {
    let extracted = extractor::extract_json(raw);
    let sanitized = sanitizer::sanitize(&extracted);
    fallback::parse_with_fallbacks(raw, &extracted, &sanitized).map(|parsed| parsed.value)
}

/// Pulls question objects out of a parsed reply. Accepts `quiz.questions`
/// or a bare top-level `questions` array; non-object entries are skipped.
pub fn questions_from_payload(payload: &JsonValue) -> Vec<Question> {
    let list = payload
        .get("quiz")
        .and_then(|quiz| quiz.get("questions"))
        .or_else(|| payload.get("questions"))
        .and_then(|q| q.as_array());

    match list {
        Some(items) => items.iter().filter_map(Question::from_model_value).collect(),
        None => Vec::new(),
    }
}
