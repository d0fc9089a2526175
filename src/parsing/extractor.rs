use once_cell::sync::Lazy;
use regex::Regex;

static QUIZ_SPANS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?s)\{.*?"quiz".*?\}\s*$"#,
        r#"\{(?:[^{}]|\{[^{}]*\})*"quiz"(?:[^{}]|\{[^{}]*\})*\}"#,
        r#"(?s)\{.*"quiz".*\}"#,
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const QUIZ_KEY: &str = "\"quiz\"";

/// Isolates the JSON object carrying the `"quiz"` key from a raw model reply.
///
/// Falls back to the trimmed input when nothing looks like a quiz object, so
/// the parser downstream reports the failure instead of this step.
pub fn extract_json(raw: &str) -> String {
    let cleaned = strip_fences(raw.trim());

    for pattern in QUIZ_SPANS.iter() {
        if let Some(m) = pattern.find(cleaned) {
            tracing::debug!(pattern = %pattern.as_str(), "Found quiz span by pattern");
            return m.as_str().trim().to_string();
        }
    }

    if let (Some(first), Some(last)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if last > first {
            let candidate = &cleaned[first..=last];
            if candidate.contains(QUIZ_KEY) {
                tracing::debug!("Extracted quiz span by brace boundaries");
                return candidate.to_string();
            }
        }
    }

    if let Some(span) = balanced_span_around_quiz(cleaned) {
        tracing::debug!("Extracted quiz span by brace counting");
        return span.to_string();
    }

    tracing::debug!("No quiz span found, passing content through");
    cleaned.to_string()
}

fn strip_fences(text: &str) -> &str {
    let body = if let Some(rest) = text.strip_prefix("```json") {
        rest
    } else if let Some(rest) = text.strip_prefix("```") {
        rest
    } else {
        return text;
    };
    let body = body.trim_start();
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim_end()
}

/// Walks forward from the `{` that opens the object holding the first
/// `"quiz"` key until the depth returns to zero. Braces inside string
/// literals are ignored.
fn balanced_span_around_quiz(text: &str) -> Option<&str> {
    let key_at = text.find(QUIZ_KEY)?;
    let start = text[..key_at].rfind('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
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
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
