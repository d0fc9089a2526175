use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::math_class::MathClass;
use crate::models::quiz::{Difficulty, GradableQuiz, Quiz};
use crate::services::quiz_service::GenerationRequest;

pub const MAX_CLASSES: usize = 5;
pub const MAX_QUESTIONS: i64 = 10;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizPayload {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 5, message = "Please select 1-5 valid math classes."),
        custom(function = "known_classes")
    )]
    pub selected_classes: Vec<String>,
    #[serde(default, alias = "numquestions")]
    #[validate(range(
        min = 1,
        max = 10,
        message = "Number of questions must be a positive number between 1 and 10."
    ))]
    pub num_questions: i64,
    #[serde(default)]
    #[validate(custom(function = "known_difficulty"))]
    pub difficulty: String,
}

#[allow(clippy::ptr_arg)]
fn known_classes(classes: &Vec<String>) -> Result<(), ValidationError> {
    if classes.iter().all(|c| MathClass::from_name(c.trim()).is_some()) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_class")
            .with_message("Please select 1-5 valid math classes.".into()))
    }
}

fn known_difficulty(difficulty: &str) -> Result<(), ValidationError> {
    match Difficulty::parse(difficulty.trim()) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("unknown_difficulty")
            .with_message("Difficulty must be 'easy', 'medium', or 'hard'.".into())),
    }
}

impl GenerateQuizPayload {
    /// Typed request; call after `validate()`. Duplicate classes collapse to
    /// one entry.
    pub fn to_request(&self) -> Option<GenerationRequest> {
        let mut classes: Vec<MathClass> = Vec::with_capacity(self.selected_classes.len());
        for name in &self.selected_classes {
            let class = MathClass::from_name(name.trim())?;
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
        if classes.is_empty() || classes.len() > MAX_CLASSES {
            return None;
        }
        if !(1..=MAX_QUESTIONS).contains(&self.num_questions) {
            return None;
        }
        Some(GenerationRequest {
            classes,
            difficulty: Difficulty::parse(self.difficulty.trim())?,
            count: self.num_questions as usize,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizResponse {
    pub quiz: Quiz,
    pub requested_questions: usize,
    pub partial: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeQuizPayload {
    pub quiz: GradableQuiz,
    #[serde(default, alias = "studentAnswer")]
    pub student_answers: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedQuestion {
    pub question_id: u32,
    pub correct: bool,
    pub student_answer: Option<String>,
    pub correct_answer: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeQuizResponse {
    pub score: usize,
    pub total: usize,
    pub percentage: u32,
    pub results: Vec<GradedQuestion>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> GenerateQuizPayload {
        serde_json::from_value(value).unwrap()
    }

    fn first_message(p: &GenerateQuizPayload) -> String {
        crate::utils::validation::validation_message(&p.validate().unwrap_err())
    }

    #[test]
    fn accepts_lowercase_count_alias() {
        let p = payload(json!({
            "selectedClasses": ["Algebra I", "Geometry", "Algebra I"],
            "numquestions": 4,
            "difficulty": "medium"
        }));
        assert!(p.validate().is_ok());
        let request = p.to_request().unwrap();
        assert_eq!(request.classes, vec![MathClass::AlgebraOne, MathClass::Geometry]);
        assert_eq!(request.count, 4);
        assert_eq!(request.difficulty, Difficulty::Medium);
    }

    #[test]
    fn rejects_unknown_or_missing_classes() {
        let unknown = payload(json!({"selectedClasses": ["Calculus III"], "numQuestions": 3, "difficulty": "easy"}));
        assert_eq!(first_message(&unknown), "Please select 1-5 valid math classes.");
        let empty = payload(json!({"selectedClasses": [], "numQuestions": 3, "difficulty": "easy"}));
        assert_eq!(first_message(&empty), "Please select 1-5 valid math classes.");
    }

    #[test]
    fn rejects_out_of_range_count() {
        for n in [0, 11, -2] {
            let p = payload(json!({"selectedClasses": ["Geometry"], "numQuestions": n, "difficulty": "hard"}));
            assert_eq!(
                first_message(&p),
                "Number of questions must be a positive number between 1 and 10."
            );
        }
    }

    #[test]
    fn rejects_unknown_difficulty() {
        let p = payload(json!({"selectedClasses": ["Geometry"], "numQuestions": 2, "difficulty": "extreme"}));
        assert_eq!(first_message(&p), "Difficulty must be 'easy', 'medium', or 'hard'.");
    }

    #[test]
    fn grade_payload_accepts_singular_alias_and_nulls() {
        let p: GradeQuizPayload = serde_json::from_value(json!({
            "quiz": {"questions": []},
            "studentAnswer": ["A", null]
        }))
        .unwrap();
        assert_eq!(p.student_answers, vec![Some("A".to_string()), None]);
    }
}
