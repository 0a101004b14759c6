//! Google Gemini backend
//!
//! Talks to the `generateContent` endpoint. Gemini takes no structured
//! role messages here, so the system prompt and conversation history are
//! flattened into a single user turn.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GlanceError, Result};
use crate::prompts::flatten_context;
use crate::providers::base::AiBackend;
use crate::providers::{EMPTY_REPLY, reply_error, send_error};
use crate::session::ChatMessage;

/// Default Gemini model when no override is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini API backend
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiBackend {
    /// Creates a Gemini backend.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `api_key` - Gemini API key
    /// * `model` - Model override, or `None` for [`DEFAULT_GEMINI_MODEL`]
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
            model: model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }
}

#[async_trait]
impl AiBackend for GeminiBackend {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        query: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: flatten_context(system_prompt, history, query),
                }],
            }],
        };

        debug!("gemini request: model={}", self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("Gemini", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(reply_error("Gemini", status, &body).into());
        }

        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            GlanceError::Provider(format!("Failed to parse Gemini response: {e}"))
        })?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_else(|| EMPTY_REPLY.to_string());
        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
