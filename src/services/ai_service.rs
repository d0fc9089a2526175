use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

use crate::error::{Error, Result};

/// Closing braces of the quiz document. Generation stops here so the model
/// cannot append prose after the JSON, and the sequence itself is not
/// returned by the API.
pub const QUIZ_STOP_SEQUENCE: &str = "}]}}";

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Text-completion seam between the generation loop and the model vendor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizModel: Send + Sync {
    /// Full response text; streamed responses are buffered to completion.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String, base_url: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(timeout: Duration) -> Result<Self> {
        let config = crate::config::get_config();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(
            config.llm_api_key.clone(),
            config.llm_model.clone(),
            config.llm_base_url.clone(),
            client,
        ))
    }

    fn payload(&self, request: &CompletionRequest) -> JsonValue {
        json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "system": request.system,
            "messages": [
                {"role": "user", "content": request.prompt}
            ],
            "stop_sequences": [QUIZ_STOP_SEQUENCE],
            "stream": true
        })
    }
}

#[async_trait]
impl QuizModel for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let res = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.payload(&request))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("Anthropic API error {}: {}", status, text)));
        }

        let body = res.text().await?;
        let text = collect_stream_text(&body)?;
        tracing::debug!(chars = text.len(), "Model response buffered");
        Ok(text)
    }
}

/// Concatenates the text deltas of a buffered server-sent-event body.
/// A plain (non-streamed) message body is accepted as well. When generation
/// ended on the stop sequence, the sequence is appended back.
pub fn collect_stream_text(body: &str) -> Result<String> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') {
        let message: JsonValue = serde_json::from_str(trimmed)?;
        return message_text(&message);
    }

    let mut text = String::new();
    let mut stopped_on_sequence = false;
    for line in body.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let Ok(event) = serde_json::from_str::<JsonValue>(data.trim()) else {
            continue;
        };
        match event.get("type").and_then(|t| t.as_str()) {
            Some("content_block_delta") => {
                let delta = &event["delta"];
                if delta.get("type").and_then(|t| t.as_str()) == Some("text_delta") {
                    if let Some(chunk) = delta.get("text").and_then(|t| t.as_str()) {
                        text.push_str(chunk);
                    }
                }
            }
            Some("message_delta") => {
                if event["delta"]["stop_reason"].as_str() == Some("stop_sequence") {
                    stopped_on_sequence = true;
                }
            }
            Some("error") => {
                let message = event["error"]["message"].as_str().unwrap_or("unknown stream error");
                return Err(Error::Llm(message.to_string()));
            }
            _ => {}
        }
    }

    if text.trim().is_empty() {
        return Err(Error::Llm("Model returned no content".to_string()));
    }
    if stopped_on_sequence {
        text.push_str(QUIZ_STOP_SEQUENCE);
    }
    Ok(text)
}

fn message_text(message: &JsonValue) -> Result<String> {
    if let Some(err) = message.get("error") {
        let msg = err["message"].as_str().unwrap_or("unknown error");
        return Err(Error::Llm(msg.to_string()));
    }
    let mut text: String = message
        .get("content")
        .and_then(|c| c.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::Llm("Model returned no content".to_string()));
    }
    if message.get("stop_reason").and_then(|r| r.as_str()) == Some("stop_sequence") {
        text.push_str(QUIZ_STOP_SEQUENCE);
    }
    Ok(text)
}
