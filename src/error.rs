use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::parsing::ParseFailure;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Parse(#[from] ParseFailure),

    #[error("Model error: {0}")]
    Llm(String),

    #[error("Model call timed out after {0}s")]
    Timeout(u64),

    #[error("No valid questions could be generated after {attempts} attempts. Please try again.")]
    NoValidQuestions {
        attempts: u32,
        last_error: Option<String>,
    },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Validation(err) => (
                StatusCode::BAD_REQUEST,
                crate::utils::validation::validation_message(&err),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::NoValidQuestions { attempts, last_error } => {
                if let Some(cause) = &last_error {
                    tracing::warn!(attempts, cause = %cause, "Quiz generation exhausted");
                }
                (
                    StatusCode::BAD_GATEWAY,
                    Error::NoValidQuestions { attempts, last_error }.to_string(),
                )
            }
            Error::Parse(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            Error::Llm(msg) => (StatusCode::BAD_GATEWAY, format!("External service error: {}", msg)),
            Error::Reqwest(err) => (StatusCode::BAD_GATEWAY, format!("External service error: {}", err)),
            Error::Timeout(secs) => (
                StatusCode::GATEWAY_TIMEOUT,
                format!("Model call timed out after {}s", secs),
            ),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Error::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Anyhow(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_valid_questions_maps_to_bad_gateway() {
        let resp = Error::NoValidQuestions {
            attempts: 3,
            last_error: Some("parse".into()),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn input_errors_map_to_bad_request() {
        let resp = Error::BadRequest("Difficulty must be 'easy', 'medium', or 'hard'.".into())
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn exhaustion_message_is_user_facing() {
        let err = Error::NoValidQuestions {
            attempts: 3,
            last_error: None,
        };
        assert_eq!(
            err.to_string(),
            "No valid questions could be generated after 3 attempts. Please try again."
        );
    }
}
