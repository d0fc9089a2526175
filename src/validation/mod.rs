//! Independent verification of model-written questions.

pub mod answer;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::models::question::{OptionKey, Question};
use crate::solvers::{self, Solution};
use answer::{find_matching_option, MatchTolerance};

pub const ACCEPTANCE_THRESHOLD: u8 = 60;

const CORRECTED_SCORE: u8 = 70;
const UNVERIFIED_SCORE: u8 = 75;
const UNSOLVED_SCORE: u8 = 85;
const COMPLEX_BASELINE: i32 = 85;
const FAULT_SCORE: u8 = 80;

/// Question shapes the solver catalogue has a chance of re-deriving.
static SIMPLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // arithmetic
        r"what\s+is\s+[\d+\-*/^()\s.]+\s*\?",
        r"calculate\s+[\d+\-*/^()\s.]+",
        r"evaluate\s+[\d+\-*/^()\s.]+",
        r"find\s+the\s+value\s+of\s+[\d+\-*/^()\s.]+",
        // geometry
        r"area.*square.*side",
        r"area.*rectangle.*length.*width",
        r"perimeter.*square",
        r"perimeter.*rectangle",
        r"(?:square|rectangle).*(?:area|perimeter)",
        // percentages
        r"what\s+is\s+\d+(?:\.\d+)?\s*%\s+of\s+\d+",
        // equations and functions
        r"solve\s+for\s+[x-z].*[x-z]\s*[+-]\s*\d+\s*=\s*\d+",
        r"(?:solve\s+for|find)\s+[x-z]\b.*[x-z]\s*(?:[+-]\s*\d+(?:\.\d+)?\s*)?=\s*-?\d",
        r"[a-z]\([a-z]\)\s*=.*[a-z]\(-?\d",
        // lines
        r"what\s+is\s+the\s+slope.*equation",
        r"find\s+the\s+slope.*equation",
        r"what\s+is\s+the\s+y-intercept.*equation",
        r"find\s+the\s+y-intercept.*equation",
        r"slope.*line.*equation",
        r"y-intercept.*line.*equation",
        r"intercept.*line.*equation",
        r"(?:slope|intercept).*=",
        // polynomials
        r"factor.*equation",
        r"roots.*equation",
        r"what\s+are\s+the\s+roots",
        r"roots\s+of",
        r"degree.*polynomial",
        r"degree\s+of",
        r"simplify.*rational.*expression",
        r"simplify.*expression",
        r"simplify.*/",
        r"quadratic.*equation",
        r"x\s*\^2.*=\s*0",
        r"highest.*power",
        r"coefficient.*x",
        r"coefficient.*term",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub score: u8,
    pub corrected_answer: Option<OptionKey>,
    pub solution: Option<Solution>,
}

impl ValidationResult {
    fn scored(score: u8, issues: Vec<String>) -> Self {
        Self {
            is_valid: score >= ACCEPTANCE_THRESHOLD,
            issues,
            score,
            corrected_answer: None,
            solution: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionShape {
    Simple,
    Complex,
}

#[derive(Debug, Clone)]
pub struct QuestionValidator {
    tolerance: MatchTolerance,
    solve: fn(&str) -> Option<Solution>,
}

impl Default for QuestionValidator {
    fn default() -> Self {
        Self::new(MatchTolerance::default())
    }
}

impl QuestionValidator {
    pub fn new(tolerance: MatchTolerance) -> Self {
        Self {
            tolerance,
            solve: solvers::solve,
        }
    }

    #[cfg(test)]
    fn with_solver(mut self, solve: fn(&str) -> Option<Solution>) -> Self {
        self.solve = solve;
        self
    }

    pub fn validate(&self, question: &Question) -> ValidationResult {
        let issues = structural_issues(question);
        if !issues.is_empty() {
            tracing::debug!(issues = ?issues, "Question rejected on structure");
            return ValidationResult::scored(0, issues);
        }

        match catch_unwind(AssertUnwindSafe(|| self.assess(question))) {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    question = %question.question,
                    "Validator fault, accepting question with neutral score"
                );
                ValidationResult::scored(FAULT_SCORE, Vec::new())
            }
        }
    }

    fn assess(&self, question: &Question) -> ValidationResult {
        let text = normalize_question_text(&question.question);
        match classify(&text) {
            QuestionShape::Simple => self.validate_simple(question, &text),
            QuestionShape::Complex => validate_complex(question),
        }
    }

    fn validate_simple(&self, question: &Question, text: &str) -> ValidationResult {
        let Some(solution) = (self.solve)(text) else {
            tracing::debug!("Simple question but no solver matched");
            return ValidationResult::scored(UNSOLVED_SCORE, Vec::new());
        };

        let claimed = question.correct_key();
        let found = find_matching_option(&solution.answer, &question.options, &self.tolerance);

        let mut result = match found {
            Some(m) if Some(m.key) != claimed => {
                let claimed = claimed.map(|k| k.as_str()).unwrap_or("?");
                let mut result = ValidationResult::scored(
                    CORRECTED_SCORE,
                    vec![format!(
                        "Wrong answer marked: {} claimed, computed answer {} matches option {}",
                        claimed, solution.answer, m.key
                    )],
                );
                result.corrected_answer = Some(m.key);
                result
            }
            Some(_) => ValidationResult::scored(100, Vec::new()),
            None => ValidationResult::scored(
                UNVERIFIED_SCORE,
                vec![format!(
                    "Could not verify calculated answer {} against options",
                    solution.answer
                )],
            ),
        };
        result.solution = Some(solution);
        result
    }
}

fn structural_issues(question: &Question) -> Vec<String> {
    let mut issues = Vec::new();
    if question.question.trim().chars().count() < 10 {
        issues.push("Question text too short".to_string());
    }
    if !OptionKey::ALL.iter().all(|k| question.options.contains_key(k.as_str())) {
        issues.push("Missing required options A, B, C, D".to_string());
    }
    if question.correct_key().is_none() {
        issues.push("Invalid correct answer format".to_string());
    }
    if question.explanation.trim().chars().count() < 5 {
        issues.push("Missing or very short explanation".to_string());
    }
    issues
}

fn validate_complex(question: &Question) -> ValidationResult {
    let mut issues = Vec::new();
    let mut score = COMPLEX_BASELINE;
    let mut rejected = false;

    let values: Vec<&str> = OptionKey::ALL
        .iter()
        .filter_map(|k| question.option(*k))
        .collect();
    let distinct: HashSet<&str> = values.iter().copied().collect();
    if distinct.len() < values.len() {
        issues.push("Duplicate answer options detected".to_string());
        score -= 25;
        rejected = true;
    }
    if distinct.len() == 1 {
        issues.push("All answer options are identical".to_string());
        score -= 40;
    }

    let correct_is_empty = question
        .correct_key()
        .and_then(|k| question.option(k))
        .map_or(true, |v| v.trim().is_empty());
    if correct_is_empty {
        issues.push("Correct answer option is empty".to_string());
        score -= 30;
        rejected = true;
    }

    if let Some(first) = values.first() {
        let len = first.chars().count();
        if len < 3 && values.iter().all(|v| v.chars().count() == len) {
            issues.push("All options are suspiciously short and same length".to_string());
            score -= 15;
            rejected = true;
        }
    }

    if question.explanation.chars().count() < 10 {
        issues.push("Very short explanation for complex question".to_string());
        score -= 10;
    }

    // these defects reject on their own, whatever the remaining score
    if rejected {
        score = score.min(i32::from(ACCEPTANCE_THRESHOLD) - 1);
    }
    ValidationResult::scored(score.clamp(0, 100) as u8, issues)
}

/// Lowercases and maps typographic operators onto their ASCII forms.
pub fn normalize_question_text(text: &str) -> String {
    text.to_lowercase()
        .replace('×', "*")
        .replace('÷', "/")
        .replace('−', "-")
        .replace('²', "^2")
        .replace('³', "^3")
}

pub fn classify(text: &str) -> QuestionShape {
    if SIMPLE_PATTERNS.iter().any(|p| p.is_match(text)) {
        QuestionShape::Simple
    } else {
        QuestionShape::Complex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::answer::AnswerValue;

    fn question(text: &str, options: [&str; 4], correct: &str) -> Question {
        Question {
            id: 1,
            question: text.into(),
            options: OptionKey::ALL
                .iter()
                .zip(options)
                .map(|(k, v)| (k.as_str().to_string(), v.to_string()))
                .collect(),
            correct_answer: correct.into(),
            explanation: "Worked through step by step.".into(),
            topic: None,
            math_class: None,
        }
    }

    fn validator() -> QuestionValidator {
        QuestionValidator::default()
    }

    #[test]
    fn confirms_correct_arithmetic() {
        let q = question("What is 2 + 2 * 3?", ["6", "8", "10", "2"], "B");
        let result = validator().validate(&q);
        assert!(result.is_valid);
        assert_eq!(result.score, 100);
        assert_eq!(result.corrected_answer, None);
        assert_eq!(
            result.solution.map(|s| s.answer),
            Some(AnswerValue::Scalar(8.0))
        );
    }

    #[test]
    fn corrects_a_wrongly_marked_answer() {
        let q = question("What is 2 + 2 * 3?", ["6", "8", "10", "2"], "A");
        let result = validator().validate(&q);
        assert!(result.is_valid);
        assert_eq!(result.score, 70);
        assert_eq!(result.corrected_answer, Some(OptionKey::B));
        assert!(result.issues[0].starts_with("Wrong answer marked"));
    }

    #[test]
    fn unverifiable_answer_is_kept_at_75() {
        let q = question("What is 2 + 2 * 3?", ["6", "7", "10", "2"], "B");
        let result = validator().validate(&q);
        assert!(result.is_valid);
        assert_eq!(result.score, 75);
        assert_eq!(result.corrected_answer, None);
    }

    #[test]
    fn missing_option_is_structural_rejection() {
        let mut q = question("What is 2 + 2 * 3?", ["6", "8", "10", "2"], "B");
        q.options.remove("D");
        let result = validator().validate(&q);
        assert!(!result.is_valid);
        assert_eq!(result.score, 0);
        assert_eq!(result.issues, vec!["Missing required options A, B, C, D"]);
    }

    #[test]
    fn short_text_and_bad_letter_are_both_reported() {
        let mut q = question("2+2?", ["1", "2", "3", "4"], "E");
        q.explanation = "ok".into();
        let result = validator().validate(&q);
        assert_eq!(result.score, 0);
        assert_eq!(result.issues.len(), 3);
    }

    #[test]
    fn quadratic_roots_match_either_order() {
        let text = "What are the roots of x^2 - 5x + 6 = 0?";
        for options in [
            ["2 and 3", "1 and 6", "-2 and -3", "0 and 5"],
            ["1 and 6", "3 and 2", "-2 and -3", "0 and 5"],
        ] {
            let q = question(text, options, "A");
            let result = validator().validate(&q);
            let expected = if options[0] == "2 and 3" { None } else { Some(OptionKey::B) };
            assert_eq!(result.corrected_answer, expected);
            assert!(result.is_valid);
        }
    }

    #[test]
    fn unicode_operators_are_normalised() {
        let q = question("What is 6 × 4 ÷ 3?", ["8", "6", "12", "2"], "A");
        let result = validator().validate(&q);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn simple_but_unsolved_gets_neutral_score() {
        let q = question(
            "Simplify the expression sqrt(50) as a radical.",
            ["5√2", "2√5", "25√2", "10√5"],
            "A",
        );
        let result = validator().validate(&q);
        assert!(result.solution.is_none());
        assert_eq!(result.score, 85);
    }

    #[test]
    fn complex_questions_get_quality_checks_only() {
        let text = "Which property justifies rewriting a(b + c) as ab + ac?";
        let good = question(
            text,
            ["Distributive", "Associative", "Commutative", "Identity"],
            "A",
        );
        assert_eq!(validator().validate(&good).score, 85);

        let dupes = question(text, ["Same", "Same", "Other", "Else"], "A");
        let result = validator().validate(&dupes);
        assert_eq!(result.score, 59);
        assert!(!result.is_valid);
        assert_eq!(result.issues, vec!["Duplicate answer options detected"]);

        let junk = question(text, ["a", "a", "a", "a"], "A");
        let result = validator().validate(&junk);
        assert_eq!(result.score, 5);
        assert!(!result.is_valid);

        let empty = question(text, ["", "Associative", "Commutative", "Identity"], "A");
        assert_eq!(validator().validate(&empty).score, 55);

        let mut terse = good.clone();
        terse.explanation = "See notes".into();
        let result = validator().validate(&terse);
        assert_eq!(result.score, 75);
        assert!(result.is_valid);
    }

    fn faulty_solver(_: &str) -> Option<Solution> {
        panic!("solver fault")
    }

    #[test]
    fn solver_fault_falls_back_to_neutral_score() {
        let q = question("What is 2 + 2 * 3?", ["6", "8", "10", "2"], "A");
        let result = validator().with_solver(faulty_solver).validate(&q);
        assert!(result.is_valid);
        assert_eq!(result.score, 80);
        assert_eq!(result.corrected_answer, None);
        assert!(result.solution.is_none());
    }

    #[test]
    fn huge_exponent_leaves_the_question_unsolved() {
        let q = question(
            "What is the degree of the polynomial x^10000000000 + 1?",
            ["1", "2", "10000000000", "0"],
            "C",
        );
        let result = validator().validate(&q);
        assert!(result.is_valid);
        assert_eq!(result.corrected_answer, None);
    }

    #[test]
    fn half_parsed_equation_is_not_corrected() {
        let q = question("Solve for x: 2x + 4 = 10 - x", ["2", "3", "4", "6"], "A");
        let result = validator().validate(&q);
        assert!(result.is_valid);
        assert_eq!(result.corrected_answer, None);
        assert_eq!(result.score, 85);
    }

    #[test]
    fn square_given_its_perimeter_is_not_corrected() {
        let q = question(
            "What is the area of a square with a perimeter of 20?",
            ["25", "400", "80", "16"],
            "A",
        );
        let result = validator().validate(&q);
        assert!(result.is_valid);
        assert_eq!(result.corrected_answer, None);
    }

    #[test]
    fn every_solver_round_trips_through_option_matching() {
        let cases: [(&str, [&str; 4], OptionKey); 10] = [
            ("What is 2 + 2 * 3?", ["6", "8", "10", "2"], OptionKey::B),
            ("Solve for x: 2x + 4 = 10", ["x = 2", "x = 7", "x = 3", "x = 5"], OptionKey::C),
            (
                "What is the area of a square with side length 5 cm?",
                ["25 cm²", "20 cm²", "10 cm²", "5 cm²"],
                OptionKey::A,
            ),
            ("What is 15% of 80?", ["8", "15", "10", "12"], OptionKey::D),
            ("If f(x) = 2x^2 - 3x + 1, what is f(3)?", ["8", "10", "19", "28"], OptionKey::B),
            (
                "What is the slope of the line with equation 2x + 3y = 6?",
                ["2/3", "-2/3", "3/2", "2"],
                OptionKey::B,
            ),
            (
                "What are the roots of x^2 - 5x + 6 = 0?",
                ["-2 and -3", "1 and 6", "2 and 3", "-1 and -6"],
                OptionKey::C,
            ),
            (
                "What is the degree of the polynomial 3x^4 - 2x^2 + 7?",
                ["2", "3", "7", "4"],
                OptionKey::D,
            ),
            (
                "Simplify the rational expression (2x^2 - 5x - 3)/(x - 3)",
                ["2x + 1", "2x - 1", "x + 3", "2x + 3"],
                OptionKey::A,
            ),
            (
                "What is the coefficient of x^2 in 3x^2 + 5x - 2?",
                ["5", "3", "-2", "2"],
                OptionKey::B,
            ),
        ];

        let validator = validator();
        for (text, options, expected) in cases {
            let q = question(text, options, expected.as_str());
            let normalized = normalize_question_text(text);
            assert_eq!(classify(&normalized), QuestionShape::Simple, "{}", text);

            let solution = solvers::solve(&normalized).unwrap_or_else(|| panic!("unsolved: {}", text));
            let m = find_matching_option(&solution.answer, &q.options, &MatchTolerance::default())
                .unwrap_or_else(|| panic!("no option for: {}", text));
            assert_eq!(m.key, expected, "{}", text);
            assert_eq!(m.confidence, 1.0, "{}", text);

            let result = validator.validate(&q);
            assert_eq!(result.score, 100, "{}", text);
        }
    }
}
