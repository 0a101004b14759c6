//! Floating overlay state machine
//!
//! The controller owns the overlay's mode, the current chat session, and
//! the gesture recognizers, and drives a host-provided renderer. All
//! calls arrive on one task (the shell's dispatch loop), so the state
//! machine needs no interior locking; only title generation leaves the
//! task, and its result is marshaled back as an event.

pub mod gesture;
pub mod layout;
pub mod render;

use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedSender, WeakUnboundedSender};
use tracing::{debug, info, warn};

use crate::coordinator::RequestCoordinator;
use crate::error::classify;
use crate::history::HistoryStore;
use crate::prompts;
use crate::session::{ChatMessage, ChatSession};
use crate::shell::EngineEvent;
use gesture::{DragConfig, DragRecognizer, GestureOutcome, PointerEvent};
use layout::{
    clamp_icon_position, panel_size, snap_target_x, should_dismiss, Frame, ScreenMetrics,
    EDGE_PADDING, ICON_SIZE,
};
use render::OverlayRenderer;

/// Vertical offset of the expanded panel from the top of the screen.
const PANEL_TOP_MARGIN: i32 = 50;

/// What the overlay is currently showing. Exactly one mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayMode {
    /// Only the floating icon is visible
    Collapsed,
    /// Panel open, waiting for input
    ExpandedIdle,
    /// Panel open, request in flight
    ExpandedLoading,
    /// Panel open, last request succeeded
    ExpandedResponse,
    /// Panel open, last request failed
    ExpandedError,
}

/// What a header pointer event asks the host to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderAction {
    /// Nothing actionable
    None,
    /// The header was tapped; open the title editor
    EditTitle,
    /// A drag release dismissed the overlay
    Dismissed,
}

/// Drives the floating overlay.
///
/// Owns the current [`ChatSession`] while the overlay lives; collapsing
/// persists a snapshot but keeps the session in memory so re-expanding
/// restores the conversation.
pub struct OverlayController<R: OverlayRenderer> {
    renderer: R,
    coordinator: Arc<RequestCoordinator>,
    history: Arc<dyn HistoryStore>,
    // Weak so the controller never keeps its own event channel open.
    events: WeakUnboundedSender<EngineEvent>,
    screen: ScreenMetrics,
    mode: OverlayMode,
    session: Option<ChatSession>,
    last_query: Option<String>,
    icon_pos: (i32, i32),
    panel_frame: Frame,
    icon_recognizer: DragRecognizer,
    header_recognizer: DragRecognizer,
    title_requested: bool,
}

impl<R: OverlayRenderer> OverlayController<R> {
    /// Creates a controller showing the collapsed icon at its default
    /// spot near the top-right edge.
    pub fn new(
        renderer: R,
        coordinator: Arc<RequestCoordinator>,
        history: Arc<dyn HistoryStore>,
        events: UnboundedSender<EngineEvent>,
        screen: ScreenMetrics,
    ) -> Self {
        let icon_pos = (screen.width - ICON_SIZE - EDGE_PADDING, EDGE_PADDING);
        let (panel_w, panel_h) = panel_size(screen);
        let mut controller = Self {
            renderer,
            coordinator,
            history,
            events: events.downgrade(),
            screen,
            mode: OverlayMode::Collapsed,
            session: None,
            last_query: None,
            icon_pos,
            panel_frame: Frame::new(0, PANEL_TOP_MARGIN, panel_w, panel_h),
            icon_recognizer: DragRecognizer::new(DragConfig::icon()),
            header_recognizer: DragRecognizer::new(DragConfig::header()),
            title_requested: false,
        };
        controller
            .renderer
            .show_collapsed(Frame::icon_at(icon_pos.0, icon_pos.1));
        controller
    }

    /// Current mode
    pub fn mode(&self) -> OverlayMode {
        self.mode
    }

    /// The session currently owned by the overlay, if any.
    pub fn current_session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    /// The renderer, for host access and test assertions.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Warms up the local model when it is the active provider.
    pub async fn preload_local(&self) -> crate::error::Result<()> {
        self.coordinator.preload_local().await
    }

    /// Expands the overlay into the panel.
    ///
    /// Creates a fresh session only when none exists; re-expanding after
    /// a collapse picks the conversation back up. Panel sizing is
    /// recomputed on every expansion.
    pub fn expand(&mut self) {
        if self.mode != OverlayMode::Collapsed {
            return;
        }
        if self.session.is_none() {
            self.start_session();
        }

        let (panel_w, panel_h) = panel_size(self.screen);
        self.panel_frame = Frame::new(
            (self.screen.width - panel_w) / 2,
            PANEL_TOP_MARGIN,
            panel_w,
            panel_h,
        );

        let session = self.session.as_ref().expect("session created above");
        self.renderer.show_expanded(self.panel_frame, &session.title);
        self.renderer.render_transcript(&session.messages);
        self.mode = OverlayMode::ExpandedIdle;
        debug!("overlay expanded, session {}", session.id);
    }

    /// Collapses the panel back to the icon.
    ///
    /// A non-empty session is persisted exactly once; the session stays
    /// in memory either way so nothing is lost.
    pub fn collapse(&mut self) {
        if self.mode == OverlayMode::Collapsed {
            return;
        }
        self.persist_current();
        self.renderer
            .show_collapsed(Frame::icon_at(self.icon_pos.0, self.icon_pos.1));
        self.mode = OverlayMode::Collapsed;
        debug!("overlay collapsed");
    }

    /// Submits typed input as a user turn. Blank input is ignored.
    pub async fn submit(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring blank submit");
            return;
        }
        if self.mode == OverlayMode::Collapsed {
            return;
        }
        self.run_query(text.to_string(), true).await;
    }

    /// Handles a screen text selection: expands if needed and asks for an
    /// explanation without appending a user turn.
    pub async fn handle_text_selected(&mut self, text: &str) {
        if self.mode == OverlayMode::Collapsed {
            self.expand();
        }
        self.run_query(prompts::explain_prompt(text), false).await;
    }

    /// Re-submits the last query after a failure. No-op when nothing has
    /// been asked yet.
    pub async fn retry(&mut self) {
        let Some(query) = self.last_query.clone() else {
            return;
        };
        if self.mode == OverlayMode::Collapsed {
            return;
        }
        info!("retrying last query");
        self.run_query(query, false).await;
    }

    /// Adopts a saved session wholesale and shows it.
    pub fn restore_session(&mut self, session_id: &str) {
        let loaded = match self.history.load(session_id) {
            Ok(Some(session)) => session,
            Ok(None) => {
                warn!("session {session_id} not found in history");
                return;
            }
            Err(e) => {
                warn!("failed to load session {session_id}: {e:#}");
                return;
            }
        };
        // A restored conversation already has its title settled.
        self.title_requested = loaded.messages.len() >= 2;
        self.last_query = None;
        self.session = Some(loaded);

        if self.mode == OverlayMode::Collapsed {
            self.expand();
        } else {
            let session = self.session.as_ref().expect("just set");
            self.renderer.set_title(&session.title);
            self.renderer.render_transcript(&session.messages);
            self.mode = OverlayMode::ExpandedIdle;
        }
    }

    /// Applies an auto-generated title if the session is still current,
    /// then persists it.
    pub fn apply_generated_title(&mut self, session_id: &str, title: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.id != session_id {
            debug!("discarding title for stale session {session_id}");
            return;
        }
        session.rename_title(title);
        self.renderer.set_title(title);
        self.persist_current();
    }

    /// Applies a user-edited title. Blank edits are ignored; non-blank
    /// edits persist immediately.
    pub fn edit_title(&mut self, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.rename_title(title);
        self.renderer.set_title(title);
        self.persist_current();
    }

    /// Abandons the current session without saving it. The next
    /// expansion starts fresh.
    pub fn reset_session(&mut self) {
        self.session = None;
        self.last_query = None;
        self.title_requested = false;
        if self.mode != OverlayMode::Collapsed {
            self.start_session();
            let session = self.session.as_ref().expect("just created");
            self.renderer.set_title(&session.title);
            self.renderer.render_transcript(&session.messages);
            self.mode = OverlayMode::ExpandedIdle;
        }
    }

    /// A touch landed outside the expanded panel.
    pub fn outside_touch(&mut self) {
        self.collapse();
    }

    /// The close button was tapped.
    pub fn close(&mut self) {
        self.collapse();
    }

    /// Tears the overlay down entirely, persisting first.
    pub fn shutdown(&mut self) {
        self.persist_current();
        self.renderer.hide();
    }

    /// Feeds a pointer event from the collapsed icon. A tap expands; a
    /// drag relocates the icon and snaps it to the nearest edge on
    /// release.
    pub fn icon_pointer(&mut self, event: PointerEvent) {
        if self.mode != OverlayMode::Collapsed {
            return;
        }
        match self.icon_recognizer.handle(event) {
            GestureOutcome::Tap => self.expand(),
            GestureOutcome::DragMove { dx, dy } => {
                let (x, y) = clamp_icon_position(
                    self.icon_pos.0 + dx.round() as i32,
                    self.icon_pos.1 + dy.round() as i32,
                    self.screen,
                );
                self.icon_pos = (x, y);
                self.renderer.move_window(x, y);
            }
            GestureOutcome::DragEnd { .. } => {
                let target_x = snap_target_x(self.icon_pos.0, self.screen);
                self.icon_pos.0 = target_x;
                self.renderer.move_window(target_x, self.icon_pos.1);
            }
            GestureOutcome::None => {}
        }
    }

    /// Feeds a pointer event from the panel header. Drags move the panel
    /// freely, and a release that leaves it mostly off screen, or that
    /// throws it fast, dismisses the overlay. A tap asks the host to open
    /// title editing; the edited text comes back through
    /// [`edit_title`](Self::edit_title).
    pub fn header_pointer(&mut self, event: PointerEvent) -> HeaderAction {
        if self.mode == OverlayMode::Collapsed {
            return HeaderAction::None;
        }
        match self.header_recognizer.handle(event) {
            GestureOutcome::Tap => HeaderAction::EditTitle,
            GestureOutcome::DragMove { dx, dy } => {
                // The panel may leave the screen while dragging.
                self.panel_frame.x += dx.round() as i32;
                self.panel_frame.y += dy.round() as i32;
                self.renderer.move_window(self.panel_frame.x, self.panel_frame.y);
                HeaderAction::None
            }
            GestureOutcome::DragEnd { velocity } => {
                if should_dismiss(self.panel_frame, self.screen, velocity) {
                    self.renderer.fade_out();
                    self.collapse();
                    HeaderAction::Dismissed
                } else {
                    HeaderAction::None
                }
            }
            GestureOutcome::None => HeaderAction::None,
        }
    }

    fn start_session(&mut self) {
        let session = ChatSession::new();
        info!("starting session {}", session.id);
        self.session = Some(session);
        self.title_requested = false;
        self.last_query = None;
    }

    async fn run_query(&mut self, query: String, append_user: bool) {
        self.last_query = Some(query.clone());
        if self.session.is_none() {
            self.start_session();
        }

        {
            let session = self.session.as_mut().expect("session ensured above");
            if append_user {
                session.append_message(ChatMessage::user(&query));
            }
            self.renderer.render_transcript(&session.messages);
        }
        self.renderer.set_thinking(true);
        self.mode = OverlayMode::ExpandedLoading;

        let history = self.history_for_query(&query);
        let result = self.coordinator.submit_query(&query, &history).await;
        self.renderer.set_thinking(false);

        match result {
            Ok(reply) => {
                let session = self.session.as_mut().expect("session ensured above");
                session.append_message(ChatMessage::assistant(reply));
                self.renderer.render_transcript(&session.messages);
                self.mode = OverlayMode::ExpandedResponse;
                self.maybe_request_title();
            }
            Err(e) => {
                warn!("query failed: {e:#}");
                self.renderer.show_error(&classify(&e));
                self.mode = OverlayMode::ExpandedError;
            }
        }
    }

    /// Conversation context for a request: everything before the current
    /// query turn. On retry the failed user turn is already in the
    /// session, so it is excluded the same way.
    fn history_for_query(&self, query: &str) -> Vec<ChatMessage> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        let mut messages = session.messages.clone();
        if messages
            .last()
            .is_some_and(|m| m.role == crate::session::Role::User && m.content == query)
        {
            messages.pop();
        }
        messages
    }

    /// Kicks off title generation the first time the session reaches its
    /// first complete exchange. The result comes back through the event
    /// channel so it lands on the dispatch task.
    fn maybe_request_title(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.messages.len() != 2 || self.title_requested {
            return;
        }
        let Some(first_message) = session.first_user_message().map(str::to_string) else {
            return;
        };
        self.title_requested = true;

        let session_id = session.id.clone();
        let coordinator = self.coordinator.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            match coordinator.generate_title(&first_message).await {
                Ok(title) => {
                    // The channel may have closed during a shutdown.
                    if let Some(events) = events.upgrade() {
                        let _ = events.send(EngineEvent::TitleGenerated { session_id, title });
                    }
                }
                // Keep the placeholder title on failure.
                Err(e) => debug!("title generation failed: {e:#}"),
            }
        });
    }

    fn persist_current(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.is_empty() {
            return;
        }
        // A lost snapshot must never disturb the live conversation.
        if let Err(e) = self.history.save(session) {
            warn!("failed to persist session {}: {e:#}", session.id);
        }
    }
}
