//! AI backends
//!
//! One module per backend plus the shared trait and factory. Hosted
//! backends share status-to-error mapping so classification downstream
//! sees consistent messages regardless of provider.

pub mod base;
pub mod claude;
pub mod gemini;
pub mod local;
pub mod openai;

pub use base::{AiBackend, ProviderKind};
pub use claude::{ClaudeBackend, DEFAULT_CLAUDE_MODEL};
pub use gemini::{DEFAULT_GEMINI_MODEL, GeminiBackend};
pub use local::{build_local_prompt, LocalEngine, LocalModelManager, LOCAL_CONTEXT_TURNS};
pub use openai::{DEFAULT_OPENAI_MODEL, OpenAiBackend};

use std::sync::Arc;

use reqwest::{Client, StatusCode};

use crate::error::GlanceError;

/// Reply substituted when a provider returns an empty candidate list.
pub const EMPTY_REPLY: &str = "No response";

/// Creates the backend for `kind`.
///
/// Remote backends get their own client handle (cheap clone of the shared
/// pool); the local backend is the long-lived manager the caller owns.
///
/// # Arguments
///
/// * `kind` - Which backend to build
/// * `client` - Shared HTTP client
/// * `api_key` - API key for hosted providers, ignored for local
/// * `model` - Model override, or `None` for the provider default
/// * `api_base` - Endpoint override, or `None` for the public API
/// * `local` - The process-wide local model manager
pub fn create_backend(
    kind: ProviderKind,
    client: Client,
    api_key: String,
    model: Option<String>,
    api_base: Option<String>,
    local: Arc<LocalModelManager>,
) -> Arc<dyn AiBackend> {
    match kind {
        ProviderKind::Gemini => Arc::new(GeminiBackend::new(client, api_key, model, api_base)),
        ProviderKind::OpenAi => Arc::new(OpenAiBackend::new(client, api_key, model, api_base)),
        ProviderKind::Claude => Arc::new(ClaudeBackend::new(client, api_key, model, api_base)),
        ProviderKind::Local => local,
    }
}

/// Maps a transport-level failure to the error taxonomy.
pub(crate) fn send_error(provider: &str, err: reqwest::Error) -> GlanceError {
    if err.is_timeout() {
        GlanceError::Timeout
    } else if err.is_connect() {
        GlanceError::ConnectionFailure(format!("{provider} request failed: {err}"))
    } else {
        GlanceError::Provider(format!("{provider} request failed: {err}"))
    }
}

/// Maps a non-success HTTP status to the error taxonomy.
pub(crate) fn reply_error(provider: &str, status: StatusCode, body: &str) -> GlanceError {
    tracing::error!("{provider} returned error {status}: {body}");
    match status.as_u16() {
        401 => GlanceError::InvalidCredentials(format!("{provider} returned 401: {body}")),
        429 => GlanceError::RateLimited(format!("{provider} returned 429: {body}")),
        403 => GlanceError::QuotaExceeded(format!("{provider} returned 403: {body}")),
        _ => GlanceError::Provider(format!("{provider} returned error {status}: {body}")),
    }
}
