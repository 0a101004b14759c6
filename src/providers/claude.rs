//! Anthropic Claude backend
//!
//! Uses the messages API with a single flattened user turn carrying the
//! system prompt and conversation history.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GlanceError, Result};
use crate::prompts::flatten_context;
use crate::providers::base::AiBackend;
use crate::providers::{EMPTY_REPLY, reply_error, send_error};
use crate::session::ChatMessage;

/// Default Claude model when no override is configured.
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-5-sonnet-20241022";

const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Claude API backend
pub struct ClaudeBackend {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ClaudeContent>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    text: Option<String>,
}

impl ClaudeBackend {
    /// Creates a Claude backend.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `api_key` - Anthropic API key
    /// * `model` - Model override, or `None` for [`DEFAULT_CLAUDE_MODEL`]
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
            model: model.unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string()),
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }
}

#[async_trait]
impl AiBackend for ClaudeBackend {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        query: &str,
    ) -> Result<String> {
        let url = format!("{}/v1/messages", self.api_base);
        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: flatten_context(system_prompt, history, query),
            }],
        };

        debug!("claude request: model={}", self.model);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("Claude", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(reply_error("Claude", status, &body).into());
        }

        let parsed: ClaudeResponse = response.json().await.map_err(|e| {
            GlanceError::Provider(format!("Failed to parse Claude response: {e}"))
        })?;

        let text = parsed
            .content
            .into_iter()
            .next()
            .and_then(|c| c.text)
            .unwrap_or_else(|| EMPTY_REPLY.to_string());
        Ok(text)
    }

    fn name(&self) -> &str {
        "claude"
    }
}
