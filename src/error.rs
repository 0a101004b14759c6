//! Error types for Glance
//!
//! This module defines all error types used throughout the engine,
//! using `thiserror` for ergonomic error handling, plus the classified
//! `ErrorNotice` triple the presentation layer renders.

use thiserror::Error;

/// Main error type for Glance operations
///
/// This enum encompasses all possible errors that can occur during
/// overlay operation, provider interactions, local inference, and
/// preference/history persistence.
#[derive(Error, Debug)]
pub enum GlanceError {
    /// An AI request exceeded the coordinator's deadline
    #[error("Request timed out")]
    Timeout,

    /// The network is unreachable or the provider host could not be resolved
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    /// The configured API key was rejected by the provider
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// No API key is configured for a remote provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// The provider throttled the request
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The account's usage quota is exhausted
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// A local inference request is already in flight
    #[error("A local request is already in progress")]
    LocalBusy,

    /// The on-device model failed to load into memory
    #[error("Local model not loaded: {0}")]
    LocalModelNotLoaded(String),

    /// The on-device model file has not been downloaded
    #[error("Local model not downloaded")]
    LocalModelNotDownloaded,

    /// An in-flight local request was superseded by a newer one
    #[error("Request cancelled")]
    Cancelled,

    /// Provider-level errors (API responses, malformed payloads, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration/preference errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// History persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for Glance operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// A classified failure, ready to render inline in the transcript.
///
/// The presentation layer never inspects raw error types; it only sees
/// this triple and offers Retry when `is_retryable` is true, otherwise a
/// shortcut into settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    /// Short heading, e.g. "Request Timeout"
    pub title: String,
    /// Human-readable explanation shown under the heading
    pub message: String,
    /// Whether a user-initiated retry is sensible
    pub is_retryable: bool,
}

impl ErrorNotice {
    fn new(title: &str, message: impl Into<String>, is_retryable: bool) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            is_retryable,
        }
    }
}

/// Classify a failure into the `ErrorNotice` taxonomy.
///
/// Known `GlanceError` variants map directly. Everything else falls back
/// to case-insensitive pattern matching on the error's message chain, and
/// unmatched failures default to a retryable Unknown notice.
pub fn classify(err: &anyhow::Error) -> ErrorNotice {
    if let Some(glance) = err.downcast_ref::<GlanceError>() {
        match glance {
            GlanceError::Timeout => {
                return ErrorNotice::new(
                    "Request Timeout",
                    "The AI service is taking too long to respond.",
                    true,
                );
            }
            GlanceError::ConnectionFailure(detail) => {
                return ErrorNotice::new(
                    "Connection Error",
                    format!(
                        "Unable to reach the AI service. Check your internet connection.\n\n{detail}"
                    ),
                    true,
                );
            }
            GlanceError::InvalidCredentials(detail) => {
                return ErrorNotice::new(
                    "Invalid API Key",
                    format!("Your API key is invalid or expired.\n\n{detail}"),
                    false,
                );
            }
            GlanceError::MissingCredentials(provider) => {
                return ErrorNotice::new(
                    "API Key Required",
                    format!("No API key is configured for {provider}. Add one in settings."),
                    false,
                );
            }
            GlanceError::RateLimited(detail) => {
                return ErrorNotice::new(
                    "Rate Limit Exceeded",
                    format!("You've exceeded the API rate limit.\n\n{detail}"),
                    true,
                );
            }
            GlanceError::QuotaExceeded(detail) => {
                return ErrorNotice::new(
                    "Quota Exceeded",
                    format!("Your API quota has been exceeded.\n\n{detail}"),
                    false,
                );
            }
            GlanceError::LocalBusy => {
                return ErrorNotice::new(
                    "Model Busy",
                    "Please wait for the current request to complete.",
                    false,
                );
            }
            GlanceError::LocalModelNotLoaded(detail) => {
                return ErrorNotice::new(
                    "Model Not Loaded",
                    format!("The on-device model could not be loaded.\n\n{detail}"),
                    false,
                );
            }
            GlanceError::LocalModelNotDownloaded => {
                return ErrorNotice::new(
                    "Model Not Downloaded",
                    "Download the on-device model in settings before using the local provider.",
                    false,
                );
            }
            _ => {}
        }
    }

    classify_message(&format!("{err:#}"))
}

/// Pattern-match a flattened error message against the taxonomy.
///
/// Rules mirror the hosted providers' observable failure text: HTTP
/// status codes embedded in provider errors, reqwest connect/timeout
/// phrasing, and generic network wording.
fn classify_message(raw: &str) -> ErrorNotice {
    let msg = raw.to_lowercase();

    if msg.contains("api key") || msg.contains("401") || msg.contains("unauthorized") {
        ErrorNotice::new(
            "Invalid API Key",
            format!("Your API key is invalid or expired.\n\nDetails: {raw}"),
            false,
        )
    } else if msg.contains("rate limit") || msg.contains("429") {
        ErrorNotice::new(
            "Rate Limit Exceeded",
            format!("You've exceeded the API rate limit.\n\nDetails: {raw}"),
            true,
        )
    } else if msg.contains("quota") || msg.contains("403") {
        ErrorNotice::new(
            "Quota Exceeded",
            format!("Your API quota has been exceeded.\n\nDetails: {raw}"),
            false,
        )
    } else if msg.contains("timeout") || msg.contains("timed out") {
        ErrorNotice::new(
            "Request Timeout",
            format!("The request timed out.\n\nDetails: {raw}"),
            true,
        )
    } else if msg.contains("network") || msg.contains("connection") || msg.contains("dns") {
        ErrorNotice::new(
            "Network Error",
            format!("Network connection failed.\n\nDetails: {raw}"),
            true,
        )
    } else {
        ErrorNotice::new(
            "Error",
            format!("An unexpected error occurred.\n\nDetails: {raw}"),
            true,
        )
    }
}
