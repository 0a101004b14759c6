//! Rendering contract
//!
//! The controller never draws; it describes what the overlay should look
//! like through this trait and the host's windowing layer makes it so.
//! Keeping the seam here lets the whole state machine run under test
//! against a recording implementation.

use crate::error::ErrorNotice;
use crate::overlay::layout::Frame;
use crate::session::ChatMessage;

/// Host-side presentation of the overlay.
///
/// Calls arrive from a single task in a deterministic order; renderers
/// never need their own locking.
pub trait OverlayRenderer: Send {
    /// Shows the collapsed icon at the given frame, replacing whatever
    /// was on screen.
    fn show_collapsed(&mut self, frame: Frame);

    /// Shows the expanded panel at the given frame with the given title.
    fn show_expanded(&mut self, frame: Frame, title: &str);

    /// Replaces the visible transcript with these messages.
    fn render_transcript(&mut self, messages: &[ChatMessage]);

    /// Toggles the thinking indicator.
    fn set_thinking(&mut self, thinking: bool);

    /// Appends an error card to the transcript; retryable errors carry a
    /// retry affordance.
    fn show_error(&mut self, notice: &ErrorNotice);

    /// Moves the visible window without re-laying it out.
    fn move_window(&mut self, x: i32, y: i32);

    /// Updates the panel title in place.
    fn set_title(&mut self, title: &str);

    /// Plays the dismiss fade on the expanded panel.
    fn fade_out(&mut self);

    /// Removes the overlay from the screen entirely.
    fn hide(&mut self);
}
