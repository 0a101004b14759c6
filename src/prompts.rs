//! Prompt construction
//!
//! Central home for every piece of prompt text the engine sends to a
//! backend: system-prompt presets, the flattened single-turn context used
//! by providers without structured history, the explain wrapper, and
//! title generation.

use crate::session::{ChatMessage, Role};

/// Fallback system prompt when no preset applies.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Maximum length of an auto-generated session title.
pub const TITLE_MAX_CHARS: usize = 50;

/// Built-in system prompt styles.
///
/// `Custom` defers to a user-supplied prompt string; an empty custom
/// prompt falls back to [`DEFAULT_SYSTEM_PROMPT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemPromptPreset {
    Concise,
    Detailed,
    Simple,
    Technical,
    Creative,
    Custom,
}

impl SystemPromptPreset {
    /// Parses a stored preset name. Unknown names map to `Concise`,
    /// matching the store's default.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "detailed" => Self::Detailed,
            "simple" => Self::Simple,
            "technical" => Self::Technical,
            "creative" => Self::Creative,
            "custom" => Self::Custom,
            _ => Self::Concise,
        }
    }

    /// Stored name of this preset
    pub fn name(&self) -> &'static str {
        match self {
            Self::Concise => "concise",
            Self::Detailed => "detailed",
            Self::Simple => "simple",
            Self::Technical => "technical",
            Self::Creative => "creative",
            Self::Custom => "custom",
        }
    }

    /// Resolves the preset to a concrete system prompt.
    ///
    /// # Arguments
    ///
    /// * `custom_prompt` - User-supplied prompt consulted only for `Custom`
    pub fn resolve(&self, custom_prompt: &str) -> String {
        match self {
            Self::Concise => "You are a helpful AI assistant. Provide brief, to-the-point explanations. Be concise and clear.".to_string(),
            Self::Detailed => "You are a helpful AI assistant. Provide comprehensive and thorough explanations. Include relevant details and context.".to_string(),
            Self::Simple => "You are a helpful AI assistant. Explain things in simple, easy-to-understand language. Avoid technical jargon and use beginner-friendly terms.".to_string(),
            Self::Technical => "You are a helpful AI assistant. Provide technical explanations using advanced terminology. Assume the user has technical knowledge.".to_string(),
            Self::Creative => "You are a helpful AI assistant. Respond in an engaging, conversational tone. Be creative and personable in your explanations.".to_string(),
            Self::Custom => {
                if custom_prompt.is_empty() {
                    DEFAULT_SYSTEM_PROMPT.to_string()
                } else {
                    custom_prompt.to_string()
                }
            }
        }
    }
}

/// Flattens the system prompt, history, and current query into a single
/// text block for backends that take one user turn per request.
pub fn flatten_context(system_prompt: &str, history: &[ChatMessage], query: &str) -> String {
    let mut out = String::from(system_prompt);
    if !history.is_empty() {
        out.push_str("\n\nConversation history:\n");
        for msg in history {
            let role = if msg.role == Role::User {
                "User"
            } else {
                "Assistant"
            };
            out.push_str(&format!("{role}: {}\n", msg.content));
        }
    }
    out.push_str(&format!("\nUser: {query}"));
    out
}

/// Wraps captured screen text in the explain instruction.
pub fn explain_prompt(input: &str) -> String {
    format!("Explain the following text concisely:\n\n{input}")
}

/// Builds the title-generation prompt from the first user message.
pub fn title_prompt(first_message: &str) -> String {
    format!(
        "Generate a concise 3-5 word title for a conversation that starts with: \"{first_message}\". Only respond with the title, nothing else."
    )
}

/// Trims a generated title and caps it at [`TITLE_MAX_CHARS`] characters.
pub fn clean_title(raw: &str) -> String {
    raw.trim().chars().take(TITLE_MAX_CHARS).collect()
}
