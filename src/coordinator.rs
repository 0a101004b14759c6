//! Request coordination
//!
//! Sits between the overlay and the backends. Every request re-reads the
//! preferences so a provider or key change applies immediately, checks
//! credentials before any network traffic, and enforces the local
//! backend's admission rules: at most one local request in flight (a
//! second caller fails fast rather than queueing) and a minimum spacing
//! between consecutive local inferences.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{GlanceError, Result};
use crate::prefs::{self, PreferenceStore};
use crate::prompts;
use crate::providers::{create_backend, LocalModelManager, ProviderKind};
use crate::session::ChatMessage;

/// Deadline for a single AI request. Generous because the first local
/// inference includes model load time.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Minimum spacing between consecutive local inferences.
pub const MIN_LOCAL_INTERVAL: Duration = Duration::from_secs(2);

/// Routes queries to the configured backend.
pub struct RequestCoordinator {
    prefs: Arc<dyn PreferenceStore>,
    http: Client,
    local: Arc<LocalModelManager>,
    local_slot: Semaphore,
    last_local: Mutex<Option<Instant>>,
    timeout: Duration,
}

impl RequestCoordinator {
    /// Creates a coordinator.
    ///
    /// # Arguments
    ///
    /// * `prefs` - Preference store consulted fresh on every request
    /// * `local` - The process-wide local model manager
    pub fn new(prefs: Arc<dyn PreferenceStore>, local: Arc<LocalModelManager>) -> Self {
        Self {
            prefs,
            http: Client::new(),
            local,
            local_slot: Semaphore::new(1),
            last_local: Mutex::new(None),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Overrides the request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends `query` with `history` to the configured backend and returns
    /// the reply text.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` before any network traffic when a
    /// hosted provider has no API key, `LocalBusy` when the local backend
    /// already has a request in flight, and `Timeout` when the deadline
    /// elapses.
    pub async fn submit_query(&self, query: &str, history: &[ChatMessage]) -> Result<String> {
        let kind = ProviderKind::parse(&prefs::provider(self.prefs.as_ref()));
        let api_key = prefs::api_key(self.prefs.as_ref());
        if kind.is_remote() && api_key.is_none() {
            warn!("rejecting request: no API key for {kind}");
            return Err(GlanceError::MissingCredentials(kind.name().to_string()).into());
        }

        let system_prompt = prefs::system_prompt(self.prefs.as_ref());
        let model = self.prefs.get(crate::prefs::keys::MODEL);
        let api_base = self.prefs.get(crate::prefs::keys::API_BASE);
        let backend = create_backend(
            kind,
            self.http.clone(),
            api_key.unwrap_or_default(),
            model,
            api_base,
            self.local.clone(),
        );

        debug!("dispatching query to {}", backend.name());
        if kind == ProviderKind::Local {
            // Fail fast instead of queueing behind the running request.
            let _permit = match self.local_slot.try_acquire() {
                Ok(permit) => permit,
                Err(_) => {
                    debug!("local backend busy, rejecting request");
                    return Err(GlanceError::LocalBusy.into());
                }
            };
            self.deadline(async {
                self.apply_local_spacing().await;
                backend.generate(&system_prompt, history, query).await
            })
            .await
        } else {
            self.deadline(backend.generate(&system_prompt, history, query))
                .await
        }
    }

    /// Sends captured screen text through the explain wrapper.
    pub async fn explain_text(&self, text: &str, history: &[ChatMessage]) -> Result<String> {
        self.submit_query(&prompts::explain_prompt(text), history)
            .await
    }

    /// Generates a short session title from the first user message.
    ///
    /// Runs as an ordinary request with empty history, so on the local
    /// backend it competes for the single-flight slot like any other.
    pub async fn generate_title(&self, first_message: &str) -> Result<String> {
        let reply = self
            .submit_query(&prompts::title_prompt(first_message), &[])
            .await?;
        Ok(prompts::clean_title(&reply))
    }

    /// Loads the local model ahead of time when it is the active
    /// provider. A no-op otherwise.
    pub async fn preload_local(&self) -> Result<()> {
        let kind = ProviderKind::parse(&prefs::provider(self.prefs.as_ref()));
        if kind != ProviderKind::Local {
            return Ok(());
        }
        info!("preloading local model");
        self.local.preload().await
    }

    async fn deadline<F>(&self, fut: F) -> Result<String>
    where
        F: std::future::Future<Output = Result<String>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("request exceeded {:?} deadline", self.timeout);
                Err(GlanceError::Timeout.into())
            }
        }
    }

    /// Waits out the remainder of [`MIN_LOCAL_INTERVAL`] since the last
    /// local inference, then records this one.
    async fn apply_local_spacing(&self) {
        let mut last = self.last_local.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < MIN_LOCAL_INTERVAL {
                let wait = MIN_LOCAL_INTERVAL - elapsed;
                debug!("spacing local request by {wait:?}");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}
