use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::question::{OptionKey, Question};
use crate::solvers::{SolveMethod, Solution};

static CHATTER: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)wait, let me recalculate[^.]*\.",
        r"(?i)let me try again[^.]*\.",
        r"(?i)actually, let me [^.]*\.",
        r"(?i)let me check[^.]*\.",
        r"(?i)let me verify[^.]*\.",
        r"(?i)i keep getting[^.]*\.",
        r"(?i)i consistently get[^.]*\.",
        r"(?i)this doesn't match[^.]*\.",
        r"(?i)still doesn't match[^.]*\.",
        r"(?i)since.*isn't an option[^.]*\.",
        r"(?i)but.*isn't an option[^.]*\.",
        r"(?i)given the options[^.]*\.",
        r"(?i)there might be[^.]*\.",
        r"(?i)i'll.*with[^.]*\.",
        r"(?i)wait,[^.]*\.",
        r"(?i)actually,[^.]*\.",
        r"(?i)let me try once more[^.]*\.",
        r"(?i)once more with[^.]*\.",
        r"(?i)based on.*constraints[^.]*\.",
        r"(?i)given the.*problem[^.]*\.",
        r"(?i)since this.*typo[^.]*\.",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DOUBLE_PERIOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s*\.").unwrap());
static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s+").unwrap());

const CHATTER_WORDS: [&str; 5] = ["wait", "actually", "let me", "doesn't match", "recalculate"];

/// Strips self-correction chatter ("Wait, let me recalculate...") from a
/// model explanation and cuts it at the first sentence that still hedges.
pub fn clean_explanation(explanation: &str) -> String {
    let mut cleaned = explanation.to_string();
    for pattern in CHATTER.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    let cleaned = DOUBLE_PERIOD.replace_all(&cleaned, ".").trim().to_string();

    let kept: Vec<&str> = SENTENCE_BREAK
        .split(&cleaned)
        .take_while(|sentence| {
            let lower = sentence.to_lowercase();
            !CHATTER_WORDS.iter().any(|w| lower.contains(w))
        })
        .collect();
    let result = kept.join(". ").trim().to_string();

    if result.chars().count() > 10 {
        if result.ends_with('.') {
            result
        } else {
            format!("{}.", result)
        }
    } else {
        cleaned
    }
}

static SO_SLOPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)so the slope is [^.]+\.").unwrap());
static SLOPE_IS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)slope is [^.,]+[.,]").unwrap());
static SO_INTERCEPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)so the y-intercept is [^.]+\.").unwrap());
static INTERCEPT_IS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)y-intercept is [^.,]+[.,]").unwrap());
static SO_ROOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)so the roots are [^.]+\.").unwrap());
static SO_X: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)so x = [^.]+\.").unwrap());
static ROOTS_ARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)roots are [^.,]+[.,]").unwrap());

/// Explanation for a question whose marked answer was replaced by `key`.
pub fn corrected_explanation(question: &Question, solution: &Solution, key: OptionKey) -> String {
    let option = question.option(key).unwrap_or_default();
    let work = solution.work.as_str();

    match solution.method {
        SolveMethod::SlopeCalculation => format!(
            "To find the slope, rearrange the equation into y = mx + b form. {} Therefore, the slope is {}.",
            work, option
        ),
        SolveMethod::YInterceptCalculation => format!(
            "To find the y-intercept, rearrange the equation into y = mx + b form. {} Therefore, the y-intercept is {}.",
            work, option
        ),
        SolveMethod::QuadraticFactoring => format!(
            "To find the roots, factor the quadratic equation. The roots are the values of x that make the equation equal to zero. {} Setting each factor equal to zero gives the roots {}.",
            work, option
        ),
        SolveMethod::PolynomialDegree => format!(
            "The degree of a polynomial is the highest power of x. {} Therefore, the degree is {}.",
            work, option
        ),
        SolveMethod::RationalSimplification => format!(
            "To simplify the rational expression, factor the numerator and cancel common terms. {} The simplified form is {}.",
            work, option
        ),
        SolveMethod::CoefficientExtraction => format!(
            "To find the coefficient, identify the term with the specified power of x. {} The coefficient is {}.",
            work, option
        ),
        SolveMethod::Arithmetic => format!(
            "Calculate the expression step by step: {} The result is {}.",
            work, option
        ),
        _ => patch_original(question, option),
    }
}

fn patch_original(question: &Question, option: &str) -> String {
    let text = question.question.to_lowercase();
    let mut fixed = question.explanation.clone();

    if text.contains("slope") {
        fixed = SO_SLOPE
            .replace(&fixed, format!("so the slope is {}.", option).as_str())
            .into_owned();
        fixed = SLOPE_IS
            .replace(&fixed, format!("slope is {}.", option).as_str())
            .into_owned();
    }
    if text.contains("intercept") {
        fixed = SO_INTERCEPT
            .replace(&fixed, format!("so the y-intercept is {}.", option).as_str())
            .into_owned();
        fixed = INTERCEPT_IS
            .replace(&fixed, format!("y-intercept is {}.", option).as_str())
            .into_owned();
    }
    if text.contains("roots") {
        let replacement = format!("so the roots are {}.", option);
        fixed = SO_ROOTS.replace(&fixed, replacement.as_str()).into_owned();
        fixed = SO_X.replace(&fixed, replacement.as_str()).into_owned();
        fixed = ROOTS_ARE
            .replace(&fixed, format!("roots are {}.", option).as_str())
            .into_owned();
    }

    if fixed.trim().is_empty() {
        format!("The correct answer is {}.", option)
    } else {
        fixed
    }
}
