use crate::dto::quiz_dto::{GradeQuizResponse, GradedQuestion};
use crate::models::quiz::GradableQuiz;

pub struct GradingService;

impl GradingService {
    /// Compares each answer with the question at the same index. Answers are
    /// matched case-insensitively; a missing or null answer is wrong.
    pub fn grade_quiz(quiz: &GradableQuiz, answers: &[Option<String>]) -> GradeQuizResponse {
        let mut score = 0;
        let mut results = Vec::with_capacity(quiz.questions.len());

        for (idx, q) in quiz.questions.iter().enumerate() {
            let given = answers.get(idx).cloned().flatten();
            let correct = given
                .as_deref()
                .map(|a| a.trim().eq_ignore_ascii_case(q.correct_answer.trim()))
                .unwrap_or(false);
            if correct {
                score += 1;
            }
            results.push(GradedQuestion {
                question_id: if q.id == 0 { idx as u32 + 1 } else { q.id },
                correct,
                student_answer: given,
                correct_answer: q.correct_answer.clone(),
                explanation: q.explanation.clone(),
            });
        }

        let total = quiz.questions.len();
        let percentage = if total == 0 {
            0
        } else {
            ((score as f64 / total as f64) * 100.0).round() as u32
        };
        tracing::debug!("Graded quiz: {}/{} ({}%)", score, total, percentage);

        GradeQuizResponse {
            score,
            total,
            percentage,
            results,
        }
    }
}
