//! OpenAI chat-completions client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::AgentError;

use super::types::{ChatMessage, ToolSchema};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Sampling temperature used for every completion.
const TEMPERATURE: f32 = 0.7;

/// Abstraction over the model endpoint.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one chat completion and return the assistant message.
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatMessage, AgentError>;
}

/// Client for the OpenAI chat-completions API.
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, OPENAI_API_URL.to_string())
    }

    /// Point the client at a different completions endpoint (proxies, tests).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatMessage, AgentError> {
        let mut body = json!({
            "model": model,
            "messages": messages,
            "temperature": TEMPERATURE,
        });
        if let Some(tools) = tools {
            if !tools.is_empty() {
                body["tools"] = json!(tools);
            }
        }

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::from_transport("model endpoint request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ApiErrorResponse>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(AgentError::Other(anyhow::anyhow!(
                "model endpoint returned {status}: {detail}"
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Other(anyhow::Error::new(e).context("decoding completion")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| AgentError::Other(anyhow::anyhow!("completion had no choices")))
    }
}
