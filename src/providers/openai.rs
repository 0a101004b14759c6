//! OpenAI chat-completions backend
//!
//! The only hosted backend with structured role messages: the system
//! prompt and each history entry go out as their own message.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GlanceError, Result};
use crate::providers::base::AiBackend;
use crate::providers::{EMPTY_REPLY, reply_error, send_error};
use crate::session::ChatMessage;

/// Default OpenAI model when no override is configured.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-5.2";

const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// OpenAI API backend
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiMessage>,
}

impl OpenAiBackend {
    /// Creates an OpenAI backend.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `api_key` - OpenAI API key
    /// * `model` - Model override, or `None` for [`DEFAULT_OPENAI_MODEL`]
    /// * `api_base` - Endpoint override, or `None` for the public API
    pub fn new(
        client: Client,
        api_key: String,
        model: Option<String>,
        api_base: Option<String>,
    ) -> Self {
        Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }

    fn build_messages(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        query: &str,
    ) -> Vec<OpenAiMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(OpenAiMessage {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        });
        for msg in history {
            messages.push(OpenAiMessage {
                role: msg.role.to_string(),
                content: msg.content.clone(),
            });
        }
        messages.push(OpenAiMessage {
            role: "user".to_string(),
            content: query.to_string(),
        });
        messages
    }
}

#[async_trait]
impl AiBackend for OpenAiBackend {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        query: &str,
    ) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.api_base);
        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: self.build_messages(system_prompt, history, query),
        };

        debug!(
            "openai request: model={}, messages={}",
            self.model,
            request.messages.len()
        );
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("OpenAI", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(reply_error("OpenAI", status, &body).into());
        }

        let parsed: OpenAiResponse = response.json().await.map_err(|e| {
            GlanceError::Provider(format!("Failed to parse OpenAI response: {e}"))
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .map(|m| m.content)
            .unwrap_or_else(|| EMPTY_REPLY.to_string());
        Ok(text)
    }

    fn name(&self) -> &str {
        "chatgpt"
    }
}
