use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::models::question::OptionKey;
use crate::solvers::{format_number, round4};
use crate::solvers::polynomial::Polynomial;

static VARIABLE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]\s*=\s*").unwrap());
static FRACTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([+-]?\d+)\s*/\s*(\d+)$").unwrap());
static ROOT_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+(?:and|or)\s+").unwrap());
static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());
static STANDALONE_XY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|[^a-z])[xy](?:$|[^a-z])").unwrap());

/// Comparable form of an answer, whether computed by a solver or read from
/// an option string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Scalar(f64),
    Fraction(i64, i64),
    /// Coordinate pair with parentheses and whitespace removed: `3,-2`.
    Pair(String),
    /// Unordered roots, kept sorted ascending.
    RootSet(Vec<f64>),
    /// Algebraic answer in canonical polynomial form when it parses.
    Expression(String),
    Text(String),
}

impl AnswerValue {
    /// Normalises an option string. Order matters: a leading `x =` is
    /// dropped, then fractions, root pairs, coordinate pairs and algebraic
    /// forms are tried before falling back to the first number in the text.
    pub fn normalize(raw: &str) -> AnswerValue {
        let lowered = raw.trim().to_lowercase().replace('−', "-");
        let text = VARIABLE_PREFIX.replace(&lowered, "").trim().to_string();

        if let Some(caps) = FRACTION.captures(&text) {
            let num = caps[1].parse::<i64>();
            let den = caps[2].parse::<i64>();
            if let (Ok(num), Ok(den)) = (num, den) {
                if den != 0 {
                    return AnswerValue::Fraction(num, den);
                }
            }
        }

        let parts: Vec<&str> = ROOT_SPLIT.split(&text).collect();
        if parts.len() == 2 {
            let roots: Option<Vec<f64>> = parts
                .iter()
                .map(|p| VARIABLE_PREFIX.replace(p.trim(), "").trim().parse::<f64>().ok())
                .collect();
            if let Some(mut roots) = roots {
                roots.sort_by(|a, b| a.total_cmp(b));
                return AnswerValue::RootSet(roots);
            }
        }

        if text.contains('(') && text.contains(',') && text.contains(')') {
            let stripped: String = text
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '(' && *c != ')')
                .collect();
            return AnswerValue::Pair(stripped);
        }

        if STANDALONE_XY.is_match(&text) {
            return match Polynomial::parse(&text) {
                Some(poly) => AnswerValue::Expression(poly.to_string()),
                None => AnswerValue::Expression(text.chars().filter(|c| !c.is_whitespace()).collect()),
            };
        }

        if let Some(m) = FIRST_NUMBER.find(&text) {
            if let Ok(v) = m.as_str().parse::<f64>() {
                return AnswerValue::Scalar(v);
            }
        }
        AnswerValue::Text(text)
    }

    /// Numeric reading of scalar-like answers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Scalar(v) => Some(*v),
            AnswerValue::Fraction(n, d) => Some(*n as f64 / *d as f64),
            _ => None,
        }
    }

    /// Confidence that two answers agree: 1.0 for an exact match (numbers are
    /// compared at four decimals), 0.9 for a numeric match within tolerance,
    /// `None` otherwise.
    pub fn matches(&self, other: &AnswerValue, tolerance: &MatchTolerance) -> Option<f64> {
        use AnswerValue::*;

        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return tolerance.compare(a, b);
        }

        match (self, other) {
            (RootSet(a), RootSet(b)) => compare_roots(a, b, tolerance),
            (RootSet(roots), scalar) | (scalar, RootSet(roots)) => {
                // a double root is written as a single number
                let value = scalar.as_number()?;
                let mut worst: f64 = 1.0;
                for r in roots {
                    worst = worst.min(tolerance.compare(*r, value)?);
                }
                Some(worst)
            }
            (Pair(a), Pair(b)) | (Expression(a), Expression(b)) | (Text(a), Text(b)) => {
                (a == b).then_some(1.0)
            }
            _ => None,
        }
    }
}

fn compare_roots(a: &[f64], b: &[f64], tolerance: &MatchTolerance) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let mut worst: f64 = 1.0;
    for (x, y) in a.iter().zip(b) {
        worst = worst.min(tolerance.compare(*x, *y)?);
    }
    Some(worst)
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Scalar(v) => f.write_str(&format_number(*v)),
            AnswerValue::Fraction(n, d) => write!(f, "{}/{}", n, d),
            AnswerValue::Pair(p) => write!(f, "({})", p.replace(',', ", ")),
            AnswerValue::RootSet(roots) => {
                let parts: Vec<String> = roots.iter().map(|r| format_number(*r)).collect();
                f.write_str(&parts.join(" and "))
            }
            AnswerValue::Expression(e) | AnswerValue::Text(e) => f.write_str(e),
        }
    }
}

/// Numeric closeness: `|a - b| <= max(|a| * relative, absolute)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchTolerance {
    pub relative: f64,
    pub absolute: f64,
}

impl Default for MatchTolerance {
    fn default() -> Self {
        Self {
            relative: 0.001,
            absolute: 0.001,
        }
    }
}

impl MatchTolerance {
    pub fn uniform(value: f64) -> Self {
        Self {
            relative: value,
            absolute: value,
        }
    }

    fn compare(&self, a: f64, b: f64) -> Option<f64> {
        if a == b || round4(a) == round4(b) {
            return Some(1.0);
        }
        let allowed = (a.abs() * self.relative).max(self.absolute);
        ((a - b).abs() <= allowed).then_some(0.9)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptionMatch {
    pub key: OptionKey,
    pub confidence: f64,
}

/// Option letter whose value agrees with `answer`. Exact matches beat
/// tolerance matches; ties go to the earlier letter.
pub fn find_matching_option(
    answer: &AnswerValue,
    options: &BTreeMap<String, String>,
    tolerance: &MatchTolerance,
) -> Option<OptionMatch> {
    let mut best: Option<OptionMatch> = None;
    for key in OptionKey::ALL {
        let Some(raw) = options.get(key.as_str()) else {
            continue;
        };
        let candidate = AnswerValue::normalize(raw);
        let Some(confidence) = answer.matches(&candidate, tolerance) else {
            continue;
        };
        if best.map_or(true, |b| confidence > b.confidence) {
            best = Some(OptionMatch { key, confidence });
        }
    }
    best
}
