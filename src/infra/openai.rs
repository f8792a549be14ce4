use crate::app::ports::TextCompletionPort;
use crate::config::ClassifierConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

const SYSTEM_PROMPT: &str = "You classify theatre seating prices. Return only valid JSON.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenAI or any compatible endpoint.
#[derive(Clone)]
pub struct OpenAiCompletion {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiCompletion {
    pub fn new(endpoint: &str, model: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &ClassifierConfig) -> Option<Self> {
        config
            .api_key
            .as_deref()
            .map(|key| Self::new(&config.endpoint, &config.model, key))
    }
}

#[async_trait]
impl TextCompletionPort for OpenAiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, String> {
        debug!(prompt_length = prompt.len(), model = %self.model, "Calling completion endpoint");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "temperature": 0,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": prompt }
                ]
            }))
            .send()
            .await
            .map_err(|e| format!("Failed to send completion request: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Completion endpoint returned an error");
            return Err(format!("completion endpoint returned {}: {}", status, body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse completion response: {}", e))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| "completion response had no content".to_string())
    }
}
