//! Glance - floating-overlay AI chat engine
//!
//! This library implements the platform-independent core of a floating
//! chat overlay: the gesture-driven presentation state machine, the AI
//! request coordinator with hosted and on-device backends, the session
//! and history model, and the host integration shell.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `overlay`: Controller state machine, gesture recognition, layout
//!   math, and the rendering contract
//! - `coordinator`: Request routing, credential checks, timeouts, and
//!   local admission control
//! - `providers`: AI backend abstraction and implementations (Gemini,
//!   OpenAI, Claude, on-device)
//! - `session` / `history`: Conversation entities and persistence
//! - `prefs` / `prompts`: User preferences and prompt construction
//! - `shell`: Typed event channel and dispatch loop for the host
//! - `error`: Error types, result alias, and failure classification
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use glance::{
//!     FileHistoryStore, FilePreferences, OverlayController, OverlayShell,
//!     RequestCoordinator, ScreenMetrics,
//! };
//! use glance::providers::LocalModelManager;
//! # struct NoopRenderer;
//! # impl glance::OverlayRenderer for NoopRenderer {
//! #     fn show_collapsed(&mut self, _: glance::overlay::layout::Frame) {}
//! #     fn show_expanded(&mut self, _: glance::overlay::layout::Frame, _: &str) {}
//! #     fn render_transcript(&mut self, _: &[glance::ChatMessage]) {}
//! #     fn set_thinking(&mut self, _: bool) {}
//! #     fn show_error(&mut self, _: &glance::ErrorNotice) {}
//! #     fn move_window(&mut self, _: i32, _: i32) {}
//! #     fn set_title(&mut self, _: &str) {}
//! #     fn fade_out(&mut self) {}
//! #     fn hide(&mut self) {}
//! # }
//! # struct NoEngine;
//! # #[async_trait::async_trait]
//! # impl glance::providers::LocalEngine for NoEngine {
//! #     fn is_downloaded(&self) -> bool { false }
//! #     async fn load(&self) -> glance::Result<()> { Ok(()) }
//! #     async fn generate(&self, _: &str) -> glance::Result<String> { Ok(String::new()) }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let prefs = Arc::new(FilePreferences::new()?);
//!     let history = Arc::new(FileHistoryStore::new()?);
//!     let local = Arc::new(LocalModelManager::new(Arc::new(NoEngine)));
//!     let coordinator = Arc::new(RequestCoordinator::new(prefs, local));
//!     let screen = ScreenMetrics { width: 1080, height: 2400 };
//!
//!     let (shell, events) = OverlayShell::new(|tx| {
//!         OverlayController::new(NoopRenderer, coordinator, history, tx, screen)
//!     });
//!     // Hand `events` to the host's selection source, then run.
//!     shell.run().await;
//!     Ok(())
//! }
//! ```

pub mod coordinator;
pub mod error;
pub mod history;
pub mod overlay;
pub mod prefs;
pub mod prompts;
pub mod providers;
pub mod session;
pub mod shell;

// Re-export commonly used types
pub use coordinator::RequestCoordinator;
pub use error::{classify, ErrorNotice, GlanceError, Result};
pub use history::{FileHistoryStore, HistoryStore};
pub use overlay::layout::ScreenMetrics;
pub use overlay::render::OverlayRenderer;
pub use overlay::{HeaderAction, OverlayController, OverlayMode};
pub use prefs::{FilePreferences, MemoryPreferences, PreferenceStore};
pub use providers::{AiBackend, ProviderKind};
pub use session::{ChatMessage, ChatSession, Role};
pub use shell::{EngineEvent, OverlayShell, TextSelection};

#[cfg(test)]
pub mod test_utils;
