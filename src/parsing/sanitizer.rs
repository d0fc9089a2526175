use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    /// The scan reached the end of input while still inside a string. The
    /// text repaired so far is kept for truncation recovery.
    #[error("unterminated string literal at end of input")]
    UnterminatedString { repaired: String },
}

/// Repairs the usual structural defects of model-written JSON.
///
/// Never fails: when the character scan cannot finish it falls back to a
/// handful of targeted regex substitutions.
pub fn sanitize(text: &str) -> String {
    let text = text.trim();
    match scan(text) {
        Ok(repaired) => repaired,
        Err(err) => {
            tracing::debug!(error = %err, "Character scan failed, using regex repair");
            regex_repair(text)
        }
    }
}

/// Left-to-right scan that tracks whether the cursor is inside a string
/// literal and escapes whatever a JSON string cannot hold verbatim.
pub fn scan(text: &str) -> Result<String, SanitizeError> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if !in_string {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
            i += 1;
            continue;
        }

        match ch {
            '\\' => {
                // only \" \\ \n \t and \uXXXX survive; \frac or \beta stay literal text
                let next = chars.get(i + 1).copied();
                if let Some(kept @ ('"' | '\\' | 'n' | 't')) = next {
                    out.push('\\');
                    out.push(kept);
                    i += 2;
                } else if next == Some('u') && is_unicode_escape(&chars[i + 2..]) {
                    out.extend(&chars[i..i + 6]);
                    i += 6;
                } else {
                    out.push_str("\\\\");
                    i += 1;
                }
                continue;
            }
            '"' => {
                if closes_string(&chars[i + 1..]) {
                    in_string = false;
                    out.push('"');
                } else {
                    out.push_str("\\\"");
                }
            }
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {}
            c => out.push(c),
        }
        i += 1;
    }

    if in_string {
        return Err(SanitizeError::UnterminatedString { repaired: out });
    }
    Ok(out)
}

fn is_unicode_escape(rest: &[char]) -> bool {
    rest.len() >= 4 && rest[..4].iter().all(|c| c.is_ascii_hexdigit())
}

/// A quote ends the string only when what follows is structural.
fn closes_string(rest: &[char]) -> bool {
    match rest.iter().find(|c| !c.is_whitespace()) {
        None => true,
        Some(c) => matches!(c, ':' | ',' | '}' | ']'),
    }
}

static EXPLANATION_QUOTES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""explanation":\s*"([^"]*)"([^"]*)"([^"]*)"(\s*[,}])"#).unwrap()
});
static QUESTION_QUOTES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""question":\s*"([^"]*)"([^"]*)"([^"]*)"(\s*[,}])"#).unwrap()
});
static FIELD_NEWLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"("(?:explanation|question)":\s*"[^"]*)\n([^"]*")"#).unwrap());
static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[}\]])").unwrap());

/// Narrow safety net used only when [`scan`] gives up.
pub fn regex_repair(text: &str) -> String {
    let fixed = EXPLANATION_QUOTES.replace_all(text, r#""explanation": "$1\"$2\"$3"$4"#);
    let fixed = QUESTION_QUOTES.replace_all(&fixed, r#""question": "$1\"$2\"$3"$4"#);
    let fixed = FIELD_NEWLINE.replace_all(&fixed, r"$1\n$2");
    let fixed = fixed.replace('\t', "\\t");
    TRAILING_COMMA.replace_all(&fixed, "$1").into_owned()
}

/// Drops commas that directly precede `}` or `]`, leaving string contents
/// alone.
pub fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            out.push(ch);
            continue;
        }
        if ch == '"' {
            in_string = true;
        }
        if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        out.push(ch);
    }
    out
}
