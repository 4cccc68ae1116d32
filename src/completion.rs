use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::CommunicationError;

/// Anything that turns a prompt into a response.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CommunicationError>;
}

/// Client for the Gemini `generateContent` endpoint. Single attempt, no timeout.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_payload(prompt: &str) -> Value {
        json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ]
        })
    }
}

/// Joins the text parts of the first candidate.
pub fn extract_text(response: &Value) -> Result<String, CommunicationError> {
    if let Some(message) = response["error"]["message"].as_str() {
        return Err(CommunicationError::new(format!("provider error: {message}")));
    }

    let parts = response["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| CommunicationError::new("response contained no candidates"))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();

    if text.is_empty() {
        return Err(CommunicationError::new("response contained no text"));
    }
    Ok(text)
}

#[async_trait]
impl TextCompletion for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CommunicationError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "sending completion request");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::build_payload(prompt))
            .send()
            .await
            .map_err(|e| CommunicationError::new(format!("request failed: {e}")))?;

        let status = response.status();
        info!(%status, "received completion response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CommunicationError::new(format!(
                "API error {status}: {body}"
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| CommunicationError::new(format!("failed to parse JSON response: {e}")))?;
        extract_text(&data)
    }
}
