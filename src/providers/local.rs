//! On-device inference backend
//!
//! The actual inference runtime lives behind the `LocalEngine` trait so
//! the host process can plug in whatever runtime it ships with.
//! `LocalModelManager` wraps an engine with the serialization rules the
//! runtime needs: one inference at a time, lazy model loading, and
//! last-request-wins cancellation of a superseded inference.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{GlanceError, Result};
use crate::providers::base::AiBackend;
use crate::session::{ChatMessage, Role};

/// Number of trailing conversation turns fed to the local model.
///
/// Kept small so prompt processing stays fast on-device.
pub const LOCAL_CONTEXT_TURNS: usize = 3;

/// On-device inference runtime.
///
/// Implementations run a single inference at a time; the manager enforces
/// that, so `generate` never needs its own locking.
#[async_trait]
pub trait LocalEngine: Send + Sync {
    /// True if the model file is present on disk.
    fn is_downloaded(&self) -> bool;

    /// Loads the model into memory. Called once before the first
    /// inference; must be idempotent.
    async fn load(&self) -> Result<()>;

    /// Runs one inference over `prompt` and returns the raw completion.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Serializes access to a [`LocalEngine`].
///
/// A new request cancels whatever inference is still running, then waits
/// for the engine lock. The model is loaded lazily on the first request
/// and stays resident afterwards.
pub struct LocalModelManager {
    engine: Arc<dyn LocalEngine>,
    inference_lock: tokio::sync::Mutex<()>,
    active: Mutex<Option<CancellationToken>>,
    loaded: AtomicBool,
}

impl LocalModelManager {
    pub fn new(engine: Arc<dyn LocalEngine>) -> Self {
        Self {
            engine,
            inference_lock: tokio::sync::Mutex::new(()),
            active: Mutex::new(None),
            loaded: AtomicBool::new(false),
        }
    }

    /// Loads the model ahead of the first request.
    ///
    /// # Errors
    ///
    /// Returns `LocalModelNotDownloaded` if the model file is absent, or
    /// `LocalModelNotLoaded` if the engine fails to initialize.
    pub async fn preload(&self) -> Result<()> {
        let _guard = self.inference_lock.lock().await;
        self.ensure_loaded().await
    }

    /// True once the model is resident in memory.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    async fn ensure_loaded(&self) -> Result<()> {
        if self.loaded.load(Ordering::Acquire) {
            return Ok(());
        }
        if !self.engine.is_downloaded() {
            return Err(GlanceError::LocalModelNotDownloaded.into());
        }
        debug!("loading local model");
        self.engine
            .load()
            .await
            .map_err(|e| GlanceError::LocalModelNotLoaded(format!("{e:#}")))?;
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    /// Runs one inference, cancelling any inference still in flight.
    ///
    /// The superseded request fails with `Cancelled`; this request then
    /// takes the engine lock and runs to completion unless it is itself
    /// superseded while queued.
    pub async fn run(&self, prompt: &str) -> Result<String> {
        let token = CancellationToken::new();
        {
            let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(previous) = active.replace(token.clone()) {
                warn!("superseding in-flight local inference");
                previous.cancel();
            }
        }

        let _guard = self.inference_lock.lock().await;
        if token.is_cancelled() {
            return Err(GlanceError::Cancelled.into());
        }
        self.ensure_loaded().await?;

        let result = tokio::select! {
            _ = token.cancelled() => Err(GlanceError::Cancelled.into()),
            res = self.engine.generate(prompt) => res,
        };

        // If our token is still live, no newer request has replaced it
        // and the slot still holds ours.
        if !token.is_cancelled() {
            let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
            *active = None;
        }
        result
    }
}

/// Builds the compact prompt the local model sees: the last few turns as
/// plain "User:"/"Assistant:" lines followed by the current query.
pub fn build_local_prompt(history: &[ChatMessage], query: &str) -> String {
    let mut prompt = String::new();
    let start = history.len().saturating_sub(LOCAL_CONTEXT_TURNS);
    for msg in &history[start..] {
        let role = if msg.role == Role::User {
            "User"
        } else {
            "Assistant"
        };
        prompt.push_str(&format!("{role}: {}\n", msg.content));
    }
    prompt.push_str(&format!("User: {query}"));
    prompt
}

#[async_trait]
impl AiBackend for LocalModelManager {
    async fn generate(
        &self,
        _system_prompt: &str,
        history: &[ChatMessage],
        query: &str,
    ) -> Result<String> {
        let prompt = build_local_prompt(history, query);
        let reply = self.run(&prompt).await?;
        Ok(reply.trim().to_string())
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct FakeEngine {
        downloaded: bool,
        load_calls: AtomicUsize,
        delay: Duration,
        reply: String,
    }

    impl FakeEngine {
        fn new(reply: &str) -> Self {
            Self {
                downloaded: true,
                load_calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                reply: reply.to_string(),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn not_downloaded(mut self) -> Self {
            self.downloaded = false;
            self
        }
    }

    #[async_trait]
    impl LocalEngine for FakeEngine {
        fn is_downloaded(&self) -> bool {
            self.downloaded
        }

        async fn load(&self) -> Result<()> {
            self.load_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn generate(&self, _prompt: &str) -> Result<String> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_run_returns_reply() {
        let manager = LocalModelManager::new(Arc::new(FakeEngine::new("hello from gemma")));
        let reply = manager.run("User: hi").await.unwrap();
        assert_eq!(reply, "hello from gemma");
    }

    #[tokio::test]
    async fn test_not_downloaded_errors() {
        let manager =
            LocalModelManager::new(Arc::new(FakeEngine::new("x").not_downloaded()));
        let err = manager.run("prompt").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GlanceError>(),
            Some(GlanceError::LocalModelNotDownloaded)
        ));
    }

    #[tokio::test]
    async fn test_model_loads_once() {
        let engine = Arc::new(FakeEngine::new("ok"));
        let manager = LocalModelManager::new(engine.clone());
        manager.run("a").await.unwrap();
        manager.run("b").await.unwrap();
        assert_eq!(engine.load_calls.load(Ordering::SeqCst), 1);
        assert!(manager.is_loaded());
    }

    #[tokio::test]
    async fn test_preload_loads_without_inference() {
        let engine = Arc::new(FakeEngine::new("ok"));
        let manager = LocalModelManager::new(engine.clone());
        manager.preload().await.unwrap();
        assert!(manager.is_loaded());
        assert_eq!(engine.load_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_request_cancels_older() {
        let engine = Arc::new(FakeEngine::new("slow").with_delay(Duration::from_secs(30)));
        let manager = Arc::new(LocalModelManager::new(engine));

        let first = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.run("first").await })
        };
        // Let the first request take the engine lock.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.run("second").await })
        };

        let first_err = first.await.unwrap().unwrap_err();
        assert!(matches!(
            first_err.downcast_ref::<GlanceError>(),
            Some(GlanceError::Cancelled)
        ));
        // The superseding request still completes.
        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(second.await.unwrap().unwrap(), "slow");
    }

    #[tokio::test]
    async fn test_backend_trims_reply() {
        let manager = LocalModelManager::new(Arc::new(FakeEngine::new("  padded  ")));
        let reply = manager.generate("sys", &[], "hi").await.unwrap();
        assert_eq!(reply, "padded");
    }

    #[test]
    fn test_build_local_prompt_takes_last_turns() {
        let history = vec![
            ChatMessage::user("one"),
            ChatMessage::assistant("two"),
            ChatMessage::user("three"),
            ChatMessage::assistant("four"),
        ];
        let prompt = build_local_prompt(&history, "five");
        assert!(!prompt.contains("one"));
        assert!(prompt.contains("Assistant: two\n"));
        assert!(prompt.contains("User: three\n"));
        assert!(prompt.contains("Assistant: four\n"));
        assert!(prompt.ends_with("User: five"));
    }

    #[test]
    fn test_build_local_prompt_empty_history() {
        assert_eq!(build_local_prompt(&[], "hi"), "User: hi");
    }
}
