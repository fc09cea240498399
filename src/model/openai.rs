//! OpenAI-compatible chat completions backend.
//!
//! Works against any endpoint speaking the `/chat/completions` protocol
//! (Groq by default). One instance is shared by every model name in the
//! failover pool; the model name travels with each request.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{ChatBackend, Message};
use crate::errors::BackendError;

/// Default API base URL (Groq's OpenAI-compatible surface).
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Backend posting to `{base_url}/chat/completions` with a bearer token.
pub struct OpenAiCompatBackend {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request_body(model: &str, messages: &[Message]) -> serde_json::Value {
        serde_json::json!({
            "model": model,
            "messages": messages,
        })
    }

    /// Pull the first choice's text out of a raw response body.
    fn parse_completion(body: &str) -> Result<String, BackendError> {
        let parsed: CompletionResponse = serde_json::from_str(body)
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(BackendError::EmptyCompletion)
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatBackend {
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<String, BackendError> {
        debug!(model, messages = messages.len(), "Sending completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&Self::build_request_body(model, messages))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Self::parse_completion(&body)
    }
}
