//! Host integration shell
//!
//! Bridges the host process and the overlay controller. The host feeds
//! typed events into an unbounded channel; the shell filters text
//! selections (blank, own-app, and password selections never reach the
//! engine, and identical text is debounced) and drains the channel on a
//! single dispatch task so the controller never sees concurrent calls.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::overlay::render::OverlayRenderer;
use crate::overlay::OverlayController;

/// How soon the same selected text may fire again.
pub const SELECTION_DEBOUNCE_MS: u64 = 500;

/// A text selection observed by the host.
#[derive(Debug, Clone)]
pub struct TextSelection {
    /// The selected text
    pub text: String,
    /// True when the selection happened inside the host app itself
    pub from_own_app: bool,
    /// True when the selection came from a password field
    pub is_password: bool,
}

impl TextSelection {
    /// An ordinary selection from another app.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            from_own_app: false,
            is_password: false,
        }
    }
}

/// Events the host posts into the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Text was selected somewhere on screen
    TextSelected(TextSelection),
    /// The user picked a saved conversation to reopen
    RestoreSession(String),
    /// Background title generation finished
    TitleGenerated { session_id: String, title: String },
}

/// Owns the event channel and the dispatch loop.
pub struct OverlayShell<R: OverlayRenderer> {
    controller: OverlayController<R>,
    events_rx: UnboundedReceiver<EngineEvent>,
    last_selection: Option<(String, Instant)>,
}

impl<R: OverlayRenderer> OverlayShell<R> {
    /// Creates the event channel and wires a controller to it.
    ///
    /// `build_controller` receives the channel's sender so the controller
    /// can post events back to itself (title generation results); it keeps
    /// only a weak handle, so the channel closes when the host's senders
    /// drop. Returns the shell and a sender for the host's event sources.
    pub fn new<F>(build_controller: F) -> (Self, UnboundedSender<EngineEvent>)
    where
        F: FnOnce(UnboundedSender<EngineEvent>) -> OverlayController<R>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = build_controller(tx.clone());
        let shell = Self {
            controller,
            events_rx: rx,
            last_selection: None,
        };
        (shell, tx)
    }

    /// The controller, for host access and test assertions.
    pub fn controller(&self) -> &OverlayController<R> {
        &self.controller
    }

    /// Mutable controller access for host-driven actions (pointer events,
    /// submits, title edits).
    pub fn controller_mut(&mut self) -> &mut OverlayController<R> {
        &mut self.controller
    }

    /// Runs the dispatch loop until every host sender is dropped, then
    /// persists the current session and tears the overlay down.
    ///
    /// Preloads the local model first when it is the active provider; a
    /// preload failure is logged and the loop starts anyway.
    pub async fn run(mut self) {
        info!("overlay shell starting");
        if let Err(e) = self.controller.preload_local().await {
            warn!("local model preload failed: {e:#}");
        }
        while let Some(event) = self.events_rx.recv().await {
            self.dispatch(event).await;
        }
        info!("overlay shell stopping");
        self.controller.shutdown();
    }

    /// Handles one event. Exposed for tests that drive the loop by hand.
    pub async fn dispatch(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::TextSelected(selection) => {
                if self.admit_selection(&selection) {
                    self.controller.handle_text_selected(&selection.text).await;
                }
            }
            EngineEvent::RestoreSession(session_id) => {
                self.controller.restore_session(&session_id);
            }
            EngineEvent::TitleGenerated { session_id, title } => {
                self.controller.apply_generated_title(&session_id, &title);
            }
        }
    }

    /// Filters a selection: blank, own-app, and password selections are
    /// dropped, and identical text repeats inside the debounce window.
    fn admit_selection(&mut self, selection: &TextSelection) -> bool {
        if selection.from_own_app {
            debug!("dropping own-app selection");
            return false;
        }
        if selection.is_password {
            debug!("dropping password selection");
            return false;
        }
        let text = selection.text.trim();
        if text.is_empty() {
            return false;
        }

        let now = Instant::now();
        if let Some((last_text, last_time)) = &self.last_selection {
            if last_text == text
                && now.duration_since(*last_time).as_millis() < u128::from(SELECTION_DEBOUNCE_MS)
            {
                debug!("debouncing repeated selection");
                return false;
            }
        }
        self.last_selection = Some((text.to_string(), now));
        true
    }
}
