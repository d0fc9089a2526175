pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod parsing;
pub mod routes;
pub mod services;
pub mod solvers;
pub mod utils;
pub mod validation;

use std::sync::Arc;

use axum::{routing::{get, post}, Router};

use crate::error::Result;
use crate::services::{
    ai_service::{AnthropicClient, QuizModel},
    quiz_service::{GenerationSettings, QuizService},
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: QuizService,
}

impl AppState {
    pub fn new() -> Result<Self> {
        let settings = GenerationSettings::from_config();
        let model = AnthropicClient::from_config(settings.call_timeout)?;
        Ok(Self::with_model(Arc::new(model), settings))
    }

    pub fn with_model(model: Arc<dyn QuizModel>, settings: GenerationSettings) -> Self {
        Self {
            quiz_service: QuizService::new(model, settings),
        }
    }
}

/// Every route of the service, without transport layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/quiz/generate", post(routes::quiz::generate_quiz))
        .route("/generateQuiz", post(routes::quiz::generate_quiz))
        .route("/api/quiz/grade", post(routes::quiz::grade_quiz))
        .route("/gradeQuiz", post(routes::quiz::grade_quiz))
        .with_state(state)
}
