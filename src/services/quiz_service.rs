use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::math_class::MathClass;
use crate::models::question::Question;
use crate::models::quiz::{Difficulty, Quiz, QuizEnvelope};
use crate::parsing;
use crate::services::ai_service::{CompletionRequest, QuizModel};
use crate::services::audit_service::{CorrectionLog, CorrectionRecord};
use crate::services::prompt_service::PromptBuilder;
use crate::utils::explanation::{clean_explanation, corrected_explanation};
use crate::validation::answer::MatchTolerance;
use crate::validation::QuestionValidator;

/// Model calls per quiz request.
pub const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    Requesting,
    Extracting,
    Validating,
    Accumulating,
    Retry,
    Done,
    Exhausted,
}

impl GenerationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStage::Requesting => "requesting",
            GenerationStage::Extracting => "extracting",
            GenerationStage::Validating => "validating",
            GenerationStage::Accumulating => "accumulating",
            GenerationStage::Retry => "retry",
            GenerationStage::Done => "done",
            GenerationStage::Exhausted => "exhausted",
        }
    }
}

/// Validated input of one quiz request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub classes: Vec<MathClass>,
    pub difficulty: Difficulty,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub batch_cap: usize,
    pub call_timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    pub tolerance: MatchTolerance,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            batch_cap: 5,
            call_timeout: Duration::from_secs(120),
            max_tokens: 8000,
            temperature: 0.4,
            tolerance: MatchTolerance::default(),
        }
    }
}

impl GenerationSettings {
    pub fn from_config() -> Self {
        let config = crate::config::get_config();
        Self {
            batch_cap: config.generation_batch_cap.max(1),
            call_timeout: Duration::from_secs(config.llm_timeout_secs),
            max_tokens: config.llm_max_tokens,
            temperature: config.llm_temperature,
            tolerance: MatchTolerance::uniform(config.answer_tolerance),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub quiz: QuizEnvelope,
    pub requested: usize,
    pub attempts: u32,
    pub corrections: Vec<CorrectionRecord>,
}

impl GenerationOutcome {
    pub fn is_partial(&self) -> bool {
        self.quiz.quiz.questions.len() < self.requested
    }
}

/// Accepted questions of a single request. Never shared between requests.
struct QuizAccumulator {
    target: usize,
    accepted: Vec<Question>,
    corrections: CorrectionLog,
    last_error: Option<String>,
}

impl QuizAccumulator {
    fn new(target: usize, generation_id: Uuid) -> Self {
        Self {
            target,
            accepted: Vec::with_capacity(target),
            corrections: CorrectionLog::new(generation_id),
            last_error: None,
        }
    }

    fn remaining(&self) -> usize {
        self.target.saturating_sub(self.accepted.len())
    }

    fn is_full(&self) -> bool {
        self.remaining() == 0
    }
}

#[derive(Clone)]
pub struct QuizService {
    model: Arc<dyn QuizModel>,
    validator: QuestionValidator,
    settings: GenerationSettings,
}

impl QuizService {
    pub fn new(model: Arc<dyn QuizModel>, settings: GenerationSettings) -> Self {
        Self {
            validator: QuestionValidator::new(settings.tolerance),
            model,
            settings,
        }
    }

    /// Runs the request/validate/accumulate loop until the quiz is full or
    /// the attempt budget is spent. A short quiz is a success; an empty one
    /// is `Error::NoValidQuestions`.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome> {
        let generation_id = Uuid::new_v4();
        let span = tracing::info_span!("generate_quiz", %generation_id);
        self.run(request, generation_id).instrument(span).await
    }

    async fn run(&self, request: GenerationRequest, generation_id: Uuid) -> Result<GenerationOutcome> {
        let class_names: Vec<String> = request.classes.iter().map(|c| c.name().to_string()).collect();
        tracing::info!(
            "Generating {} {} questions from classes: {}",
            request.count,
            request.difficulty,
            class_names.join(", ")
        );

        let prompts = PromptBuilder::new(request.classes.clone(), request.difficulty);
        let system = prompts.system_prompt();
        let mut acc = QuizAccumulator::new(request.count, generation_id);
        let mut attempts = 0;

        for attempt in 1..=MAX_ATTEMPTS {
            if acc.is_full() {
                break;
            }
            attempts = attempt;
            let batch = self.settings.batch_cap.min(acc.remaining() * 2);
            tracing::info!(
                attempt,
                stage = GenerationStage::Requesting.as_str(),
                batch,
                accepted = acc.accepted.len(),
                "Requesting batch"
            );

            let raw = match self.request_batch(&system, &prompts, batch).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Model call failed");
                    acc.last_error = Some(e.to_string());
                    continue;
                }
            };

            let added = match self.absorb_batch(&raw, &mut acc) {
                Ok(added) => added,
                Err(failure) => {
                    tracing::warn!(
                        attempt,
                        stage = GenerationStage::Extracting.as_str(),
                        error = %failure,
                        "Batch could not be parsed"
                    );
                    acc.last_error = Some(failure.to_string());
                    continue;
                }
            };

            let stage = if acc.is_full() {
                GenerationStage::Done
            } else {
                GenerationStage::Retry
            };
            tracing::info!(
                attempt,
                stage = stage.as_str(),
                added,
                accepted = acc.accepted.len(),
                target = acc.target,
                "Attempt finished"
            );
        }

        if acc.accepted.is_empty() {
            tracing::error!(
                attempts,
                stage = GenerationStage::Exhausted.as_str(),
                last_error = acc.last_error.as_deref().unwrap_or("no valid questions"),
                "Quiz generation failed"
            );
            return Err(Error::NoValidQuestions {
                attempts,
                last_error: acc.last_error,
            });
        }

        acc.accepted.truncate(request.count);
        tracing::info!(
            "Valid questions: {}/{} ({} corrected)",
            acc.accepted.len(),
            request.count,
            acc.corrections.len()
        );

        Ok(GenerationOutcome {
            quiz: QuizEnvelope {
                quiz: Quiz {
                    selected_classes: class_names,
                    difficulty: request.difficulty,
                    questions: acc.accepted,
                },
            },
            requested: request.count,
            attempts,
            corrections: acc.corrections.into_records(),
        })
    }

    async fn request_batch(
        &self,
        system: &str,
        prompts: &PromptBuilder,
        batch: usize,
    ) -> Result<String> {
        let request = CompletionRequest {
            system: system.to_string(),
            prompt: prompts.user_prompt(batch),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };
        let timeout = self.settings.call_timeout;
        match tokio::time::timeout(timeout, self.model.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(timeout.as_secs())),
        }
    }

    /// Parses one model reply and moves every valid question into the
    /// accumulator, stopping as soon as it is full. Returns how many were
    /// added.
    fn absorb_batch(
        &self,
        raw: &str,
        acc: &mut QuizAccumulator,
    ) -> std::result::Result<usize, parsing::ParseFailure> {
        let payload = parsing::parse_quiz_response(raw)?;
        let candidates = parsing::questions_from_payload(&payload);
        tracing::debug!(
            stage = GenerationStage::Validating.as_str(),
            candidates = candidates.len(),
            "Batch parsed"
        );

        let mut added = 0;
        for mut question in candidates {
            if acc.is_full() {
                break;
            }
            let result = self.validator.validate(&question);
            if !result.is_valid {
                tracing::debug!(
                    score = result.score,
                    issues = ?result.issues,
                    "Question rejected"
                );
                continue;
            }

            let id = acc.accepted.len() as u32 + 1;
            question.id = id;
            if let (Some(key), Some(solution)) = (result.corrected_answer, result.solution.as_ref()) {
                let original = std::mem::replace(&mut question.correct_answer, key.to_string());
                question.explanation = corrected_explanation(&question, solution, key);
                let reason = result.issues.first().map(String::as_str).unwrap_or("Answer corrected");
                acc.corrections.record(id, &question.question, &original, key, reason);
            }
            question.explanation = clean_explanation(&question.explanation);

            tracing::debug!(
                stage = GenerationStage::Accumulating.as_str(),
                id,
                score = result.score,
                "Question accepted"
            );
            acc.accepted.push(question);
            added += 1;
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::OptionKey;
    use crate::services::ai_service::MockQuizModel;
    use serde_json::json;

    fn valid_question(n: i64) -> serde_json::Value {
        json!({
            "id": 99,
            "question": format!("What is {} + {}?", n, n),
            "options": {"A": (2 * n).to_string(), "B": "0", "C": "-1", "D": (2 * n + 1).to_string()},
            "correctAnswer": "A",
            "explanation": format!("Adding {} to itself gives {}.", n, 2 * n),
            "topic": "Arithmetic"
        })
    }

    fn reply(questions: Vec<serde_json::Value>) -> String {
        json!({"quiz": {"selectedClasses": ["Algebra I"], "difficulty": "easy", "questions": questions}})
            .to_string()
    }

    fn request(count: usize) -> GenerationRequest {
        GenerationRequest {
            classes: vec![MathClass::AlgebraOne],
            difficulty: Difficulty::Easy,
            count,
        }
    }

    fn service(model: MockQuizModel) -> QuizService {
        QuizService::new(Arc::new(model), GenerationSettings::default())
    }

    #[tokio::test]
    async fn first_full_batch_ends_generation() {
        let mut model = MockQuizModel::new();
        model
            .expect_complete()
            .times(1)
            .returning(|_| Ok(reply((1..=4).map(valid_question).collect())));

        let outcome = service(model).generate(request(3)).await.unwrap();
        let questions = &outcome.quiz.quiz.questions;
        assert_eq!(questions.len(), 3);
        assert_eq!(questions.iter().map(|q| q.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.is_partial());
    }

    #[tokio::test]
    async fn every_attempt_invalid_is_exhaustion() {
        let mut model = MockQuizModel::new();
        model
            .expect_complete()
            .times(3)
            .returning(|_| Ok("I cannot produce JSON today.".to_string()));

        let err = service(model).generate(request(2)).await.unwrap_err();
        match err {
            Error::NoValidQuestions { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert!(last_error.unwrap().contains("Failed to parse"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn rejected_questions_trigger_a_smaller_retry() {
        let mut model = MockQuizModel::new();
        let mut seq = mockall::Sequence::new();
        model
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                let mut broken = valid_question(5);
                broken["options"] = json!({"A": "10", "B": "0"});
                Ok(reply(vec![valid_question(1), broken]))
            });
        model
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| req.prompt.contains("exactly 2 questions"))
            .returning(|_| Ok(reply(vec![valid_question(7)])));

        let outcome = service(model).generate(request(2)).await.unwrap();
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.quiz.quiz.questions.len(), 2);
        assert_eq!(outcome.quiz.quiz.questions[1].question, "What is 7 + 7?");
    }

    #[tokio::test]
    async fn partial_quiz_is_returned_after_budget() {
        let mut model = MockQuizModel::new();
        let mut calls = 0;
        model.expect_complete().times(3).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(reply(vec![valid_question(2)]))
            } else {
                Err(Error::Llm("overloaded".into()))
            }
        });

        let outcome = service(model).generate(request(4)).await.unwrap();
        assert_eq!(outcome.quiz.quiz.questions.len(), 1);
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.is_partial());
    }

    #[tokio::test]
    async fn wrong_answers_are_corrected_and_logged() {
        let mut model = MockQuizModel::new();
        model.expect_complete().times(1).returning(|_| {
            Ok(reply(vec![json!({
                "question": "What is 2 + 2 * 3?",
                "options": {"A": "12", "B": "8", "C": "10", "D": "6"},
                "correctAnswer": "A",
                "explanation": "Add first to get 4, then multiply by 3 to get 12. Wait, let me recalculate."
            })]))
        });

        let outcome = service(model).generate(request(1)).await.unwrap();
        let q = &outcome.quiz.quiz.questions[0];
        assert_eq!(q.correct_answer, "B");
        assert!(q.explanation.starts_with("Calculate the expression step by step"));
        assert!(q.explanation.ends_with("The result is 8."));
        assert_eq!(outcome.corrections.len(), 1);
        assert_eq!(outcome.corrections[0].original, "A");
        assert_eq!(outcome.corrections[0].corrected, OptionKey::B);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_model_call_counts_as_failed_attempt() {
        struct Stalled;

        #[async_trait::async_trait]
        impl QuizModel for Stalled {
            async fn complete(&self, _request: CompletionRequest) -> Result<String> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }

        let settings = GenerationSettings {
            call_timeout: Duration::from_secs(1),
            ..GenerationSettings::default()
        };
        let err = QuizService::new(Arc::new(Stalled), settings)
            .generate(request(1))
            .await
            .unwrap_err();
        match err {
            Error::NoValidQuestions { last_error, .. } => {
                assert_eq!(last_error.as_deref(), Some("Model call timed out after 1s"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
