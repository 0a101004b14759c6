//! Backend abstraction
//!
//! The `AiBackend` trait is the single seam between the request
//! coordinator and the concrete hosted/local clients.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::ChatMessage;

/// Which backend handles AI requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Claude,
    Local,
}

impl ProviderKind {
    /// Parses a stored provider name.
    ///
    /// Accepts both "chatgpt" and "openai" for the OpenAI backend.
    /// Unknown names fall back to Gemini, the configuration default.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "local" => Self::Local,
            "chatgpt" | "openai" => Self::OpenAi,
            "claude" => Self::Claude,
            _ => Self::Gemini,
        }
    }

    /// Canonical stored name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "chatgpt",
            Self::Claude => "claude",
            Self::Local => "local",
        }
    }

    /// True for hosted providers that require an API key.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Trait that all AI backends must implement
///
/// Implementations take the resolved system prompt, the conversation so
/// far, and the current query, and return the reply text. How history is
/// encoded on the wire is each backend's concern.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Generates a reply to `query` given the conversation context.
    ///
    /// # Arguments
    ///
    /// * `system_prompt` - Resolved system prompt
    /// * `history` - Prior messages, oldest first, excluding `query`
    /// * `query` - The current user input
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        query: &str,
    ) -> Result<String>;

    /// Human-readable backend name for logging
    fn name(&self) -> &str;
}
