use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use math_quiz_backend::{
    error::{Error, Result},
    router,
    services::{
        ai_service::{CompletionRequest, QuizModel},
        quiz_service::GenerationSettings,
    },
    AppState,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

/// Replays canned model replies in order.
struct ScriptedModel {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn new(replies: Vec<std::result::Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuizModel for ScriptedModel {
    async fn complete(&self, _request: CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(Error::Llm(msg)),
            None => Err(Error::Llm("script exhausted".into())),
        }
    }
}

fn app(model: Arc<ScriptedModel>) -> Router {
    router(AppState::with_model(model, GenerationSettings::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<String>) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .unwrap();
    let res = app.clone().oneshot(request).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, json)
}

fn question(a: i64, b: i64, marked: &str) -> JsonValue {
    json!({
        "id": 42,
        "question": format!("What is {} + {}?", a, b),
        "options": {"A": (a + b).to_string(), "B": (a + b + 1).to_string(), "C": (a - b).to_string(), "D": (a * b + 7).to_string()},
        "correctAnswer": marked,
        "explanation": format!("Add {} and {} to get {}.", a, b, a + b),
        "topic": "Arithmetic",
        "mathClass": "Algebra I"
    })
}

fn reply(questions: Vec<JsonValue>) -> String {
    let body = json!({"quiz": {"selectedClasses": ["Algebra I"], "difficulty": "easy", "questions": questions}});
    format!("Here is your quiz:\n```json\n{}\n```\nHope that helps!", body)
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app(ScriptedModel::new(vec![]));
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn generate_returns_validated_quiz() {
    let model = ScriptedModel::new(vec![Ok(reply(vec![
        question(2, 3, "A"),
        question(10, 4, "B"),
        question(7, 8, "A"),
    ]))]);
    let app = app(model.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/api/quiz/generate",
        Some(json!({"selectedClasses": ["Algebra I"], "numQuestions": 2, "difficulty": "easy"}).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(model.calls(), 1);
    assert_eq!(body["partial"], false);
    assert_eq!(body["requestedQuestions"], 2);
    let questions = body["quiz"]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["id"], 1);
    assert_eq!(questions[1]["id"], 2);
    // 10 + 4 was marked B ("15"); the validator moves it to A ("14")
    assert_eq!(questions[1]["correctAnswer"], "A");
    assert_eq!(body["quiz"]["selectedClasses"], json!(["Algebra I"]));
    assert_eq!(body["quiz"]["difficulty"], "easy");
}

#[tokio::test]
async fn legacy_route_and_lowercase_alias() {
    let model = ScriptedModel::new(vec![Ok(reply(vec![question(1, 1, "A")]))]);
    let app = app(model);
    let (status, body) = send(
        &app,
        "POST",
        "/generateQuiz",
        Some(json!({"selectedClasses": ["Geometry"], "numquestions": 1, "difficulty": "hard"}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quiz"]["difficulty"], "hard");
}

#[tokio::test]
async fn invalid_input_fails_before_any_model_call() {
    let model = ScriptedModel::new(vec![]);
    let app = app(model.clone());

    let cases = [
        (
            json!({"selectedClasses": [], "numQuestions": 3, "difficulty": "easy"}),
            "Please select 1-5 valid math classes.",
        ),
        (
            json!({"selectedClasses": ["Algebra I"], "numQuestions": 12, "difficulty": "easy"}),
            "Number of questions must be a positive number between 1 and 10.",
        ),
        (
            json!({"selectedClasses": ["Algebra I"], "numQuestions": 3, "difficulty": "brutal"}),
            "Difficulty must be 'easy', 'medium', or 'hard'.",
        ),
    ];
    for (payload, message) in cases {
        let (status, body) = send(&app, "POST", "/api/quiz/generate", Some(payload.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], message);
    }
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = app(ScriptedModel::new(vec![]));
    let (status, body) = send(&app, "POST", "/api/quiz/generate", Some("{not json".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn exhausted_generation_is_bad_gateway() {
    let model = ScriptedModel::new(vec![
        Ok("Sorry, I can't help with that.".into()),
        Err("overloaded".into()),
        Ok(reply(vec![json!({"question": "Too short", "options": {}})])),
    ]);
    let app = app(model.clone());
    let (status, body) = send(
        &app,
        "POST",
        "/api/quiz/generate",
        Some(json!({"selectedClasses": ["Trigonometry"], "numQuestions": 2, "difficulty": "medium"}).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(model.calls(), 3);
    assert_eq!(
        body["error"],
        "No valid questions could be generated after 3 attempts. Please try again."
    );
}

#[tokio::test]
async fn short_quiz_is_flagged_partial() {
    let model = ScriptedModel::new(vec![
        Ok(reply(vec![question(4, 5, "A")])),
        Err("overloaded".into()),
        Ok("no json here".into()),
    ]);
    let app = app(model);
    let (status, body) = send(
        &app,
        "POST",
        "/api/quiz/generate",
        Some(json!({"selectedClasses": ["Algebra I"], "numQuestions": 3, "difficulty": "easy"}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["partial"], true);
    assert_eq!(body["quiz"]["questions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn grade_scores_by_index() {
    let app = app(ScriptedModel::new(vec![]));
    let quiz = json!({
        "questions": [
            {"id": 1, "question": "q1", "options": {}, "correctAnswer": "A", "explanation": "e1"},
            {"id": 2, "question": "q2", "options": {}, "correctAnswer": "B", "explanation": "e2"},
            {"id": 3, "question": "q3", "options": {}, "correctAnswer": "B", "explanation": "e3"}
        ]
    });
    let (status, body) = send(
        &app,
        "POST",
        "/gradeQuiz",
        Some(json!({"quiz": quiz, "studentAnswers": ["A", "C", "B"]}).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 2);
    assert_eq!(body["total"], 3);
    assert_eq!(body["percentage"], 67);
    assert_eq!(body["results"][1]["correct"], false);
    assert_eq!(body["results"][1]["studentAnswer"], "C");
    assert_eq!(body["results"][1]["correctAnswer"], "B");
    assert_eq!(body["results"][2]["explanation"], "e3");
}

#[tokio::test]
async fn grade_empty_quiz_is_zero_percent() {
    let app = app(ScriptedModel::new(vec![]));
    let (status, body) = send(
        &app,
        "POST",
        "/api/quiz/grade",
        Some(json!({"quiz": {"questions": []}, "studentAnswers": []}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["percentage"], 0);
}
