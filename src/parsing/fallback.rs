use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::fmt;

use super::sanitizer::{self, SanitizeError};

const SAMPLE_CHARS: usize = 500;
const CONTEXT_RADIUS: usize = 100;

static QUIZ_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?s)\{.*"quiz".*\}"#).unwrap());
static LOG_SUBSCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"log(\d+)\(").unwrap());
static BARE_EXPONENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"x(\d+)").unwrap());

/// Parse strategies, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    Strict,
    Lenient,
    QuizSpan,
    TextualPatch,
    TruncationRepair,
}

impl ParseTier {
    pub const ORDER: [ParseTier; 5] = [
        ParseTier::Strict,
        ParseTier::Lenient,
        ParseTier::QuizSpan,
        ParseTier::TextualPatch,
        ParseTier::TruncationRepair,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParseTier::Strict => "strict",
            ParseTier::Lenient => "lenient",
            ParseTier::QuizSpan => "quiz_span",
            ParseTier::TextualPatch => "textual_patch",
            ParseTier::TruncationRepair => "truncation_repair",
        }
    }

    fn attempt(&self, input: &TierInput<'_>) -> Result<JsonValue, String> {
        match self {
            ParseTier::Strict => strict(input.sanitized),
            ParseTier::Lenient => {
                json5::from_str::<JsonValue>(input.sanitized).map_err(|e| e.to_string())
            }
            ParseTier::QuizSpan => {
                let span = QUIZ_OBJECT
                    .find(input.sanitized)
                    .ok_or_else(|| "no quiz object in sanitized text".to_string())?;
                strict(span.as_str())
            }
            ParseTier::TextualPatch => strict(&textual_patch(input.sanitized)),
            ParseTier::TruncationRepair => {
                let scanned = match sanitizer::scan(input.extracted) {
                    Ok(text) => text,
                    Err(SanitizeError::UnterminatedString { repaired }) => repaired,
                };
                let repaired = close_after_last_item(&scanned)
                    .ok_or_else(|| "no complete array item to keep".to_string())?;
                strict(&repaired)
            }
        }
    }
}

impl fmt::Display for ParseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct TierInput<'a> {
    extracted: &'a str,
    sanitized: &'a str,
}

#[derive(Debug, Clone)]
pub struct TierError {
    pub tier: ParseTier,
    pub message: String,
}

/// Raised once every tier has failed. Carries enough of the original reply
/// to diagnose format drift.
#[derive(Debug, thiserror::Error)]
#[error("Failed to parse model response as JSON after all attempts. Original error: {last_error}")]
pub struct ParseFailure {
    pub content_sample: String,
    pub attempts: Vec<TierError>,
    pub error_context: Option<String>,
    pub last_error: String,
}

#[derive(Debug)]
pub struct Parsed {
    pub value: JsonValue,
    pub tier: ParseTier,
}

pub fn parse_with_fallbacks(
    raw: &str,
    extracted: &str,
    sanitized: &str,
) -> Result<Parsed, ParseFailure> {
    let input = TierInput {
        extracted,
        sanitized,
    };
    let mut attempts = Vec::new();

    for tier in ParseTier::ORDER {
        match tier.attempt(&input) {
            Ok(value) => {
                tracing::debug!(tier = %tier, failed_tiers = attempts.len(), "Parsed model response");
                return Ok(Parsed { value, tier });
            }
            Err(message) => {
                tracing::debug!(tier = %tier, error = %message, "Parse tier failed");
                attempts.push(TierError { tier, message });
            }
        }
    }

    let error_context = serde_json::from_str::<JsonValue>(sanitized)
        .err()
        .map(|e| context_window(sanitized, e.line(), e.column()));
    let last_error = attempts
        .last()
        .map(|a| a.message.clone())
        .unwrap_or_default();

    tracing::error!(
        sample = %raw.chars().take(SAMPLE_CHARS).collect::<String>(),
        context = ?error_context,
        "All parsing strategies failed"
    );

    Err(ParseFailure {
        content_sample: raw.chars().take(SAMPLE_CHARS).collect(),
        attempts,
        error_context,
        last_error,
    })
}

fn strict(text: &str) -> Result<JsonValue, String> {
    serde_json::from_str(text).map_err(|e| e.to_string())
}

/// `log2(` becomes `log_2(`, `x2` becomes `x^2`, then the string scan is
/// re-applied and anything outside the outermost braces is dropped.
fn textual_patch(text: &str) -> String {
    let patched = LOG_SUBSCRIPT.replace_all(text, "log_$1(");
    let patched = BARE_EXPONENT.replace_all(&patched, "x^$1");
    let rescanned = match sanitizer::scan(&patched) {
        Ok(s) => s,
        Err(SanitizeError::UnterminatedString { repaired }) => repaired,
    };
    let without_commas = sanitizer::strip_trailing_commas(&rescanned);
    match (without_commas.find('{'), without_commas.rfind('}')) {
        (Some(first), Some(last)) if last > first => without_commas[first..=last].to_string(),
        _ => without_commas,
    }
}

/// Cuts a truncated document right after the last object that closed inside
/// an array and closes every bracket still open at that point.
pub fn close_after_last_item(text: &str) -> Option<String> {
    let mut stack: Vec<char> = Vec::new();
    let mut cut: Option<(usize, Vec<char>)> = None;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => stack.push(ch),
            '}' | ']' => {
                stack.pop();
                if ch == '}' && stack.last() == Some(&'[') {
                    cut = Some((idx + 1, stack.clone()));
                }
            }
            _ => {}
        }
    }

    if stack.is_empty() && !in_string {
        return None;
    }

    let (end, open) = cut?;
    let mut repaired = text[..end].to_string();
    for bracket in open.iter().rev() {
        repaired.push(if *bracket == '[' { ']' } else { '}' });
    }
    Some(repaired)
}

fn context_window(text: &str, line: usize, column: usize) -> String {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let offset = (line_start + column.saturating_sub(1)).min(text.len());

    let mut start = offset.saturating_sub(CONTEXT_RADIUS);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (offset + CONTEXT_RADIUS).min(text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }
    text[start..end].to_string()
}
