use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    dto::quiz_dto::{GenerateQuizPayload, GenerateQuizResponse, GradeQuizPayload},
    error::{Error, Result},
    services::grading_service::GradingService,
    utils::validation::validate,
    AppState,
};

#[axum::debug_handler]
pub async fn generate_quiz(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerateQuizPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;
    validate(&payload)?;
    let request = payload
        .to_request()
        .ok_or_else(|| Error::BadRequest("Invalid quiz request".to_string()))?;

    let outcome = state.quiz_service.generate(request).await?;
    if outcome.is_partial() {
        tracing::warn!(
            "Returning partial quiz: {}/{} questions",
            outcome.quiz.quiz.questions.len(),
            outcome.requested
        );
    }

    let partial = outcome.is_partial();
    Ok((
        StatusCode::OK,
        Json(GenerateQuizResponse {
            quiz: outcome.quiz.quiz,
            requested_questions: outcome.requested,
            partial,
        }),
    ))
}

#[axum::debug_handler]
pub async fn grade_quiz(
    payload: std::result::Result<Json<GradeQuizPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;
    let report = GradingService::grade_quiz(&payload.quiz, &payload.student_answers);
    Ok((StatusCode::OK, Json(report)))
}
