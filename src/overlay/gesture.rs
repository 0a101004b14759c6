//! Pointer gesture recognition
//!
//! A small state machine that turns raw pointer events into taps and
//! drags. The collapsed icon and the expanded panel header use the same
//! recognizer with different thresholds: the icon reacts to any movement
//! past its slop, while the header also requires a short hold so title
//! taps and drags stay distinguishable.

/// Movement slop for the collapsed icon, in pixels.
pub const ICON_SLOP_PX: f32 = 10.0;
/// Movement slop for the panel header, in pixels.
pub const HEADER_SLOP_PX: f32 = 20.0;
/// Hold time before a header drag can begin, in milliseconds.
pub const HEADER_HOLD_MS: u64 = 150;

/// What a pointer event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// One raw pointer sample in screen coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub x: f32,
    pub y: f32,
    /// Monotonic timestamp in milliseconds
    pub t_ms: u64,
}

impl PointerEvent {
    pub fn down(x: f32, y: f32, t_ms: u64) -> Self {
        Self { phase: PointerPhase::Down, x, y, t_ms }
    }

    pub fn moved(x: f32, y: f32, t_ms: u64) -> Self {
        Self { phase: PointerPhase::Move, x, y, t_ms }
    }

    pub fn up(x: f32, y: f32, t_ms: u64) -> Self {
        Self { phase: PointerPhase::Up, x, y, t_ms }
    }
}

/// Thresholds controlling when a touch becomes a drag.
#[derive(Debug, Clone, Copy)]
pub struct DragConfig {
    /// Movement from the touch-down point required before dragging starts
    pub slop_px: f32,
    /// Time the pointer must be held down before dragging may start;
    /// zero disables the time gate
    pub min_hold_ms: u64,
}

impl DragConfig {
    /// Thresholds for the collapsed icon
    pub fn icon() -> Self {
        Self { slop_px: ICON_SLOP_PX, min_hold_ms: 0 }
    }

    /// Thresholds for the expanded panel header
    pub fn header() -> Self {
        Self { slop_px: HEADER_SLOP_PX, min_hold_ms: HEADER_HOLD_MS }
    }
}

/// What the recognizer concluded from one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// Nothing actionable yet
    None,
    /// The pointer went up without ever dragging
    Tap,
    /// The pointer moved while dragging; apply this delta to the window
    DragMove { dx: f32, dy: f32 },
    /// The drag ended; velocity is in pixels per second
    DragEnd { velocity: (f32, f32) },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    PossibleDrag,
    Dragging,
}

/// Turns a pointer event stream into taps and drags.
///
/// Feed every event for one pointer through [`DragRecognizer::handle`];
/// the recognizer resets itself on pointer-up, so one instance serves the
/// whole lifetime of its surface.
#[derive(Debug)]
pub struct DragRecognizer {
    config: DragConfig,
    phase: Phase,
    start_x: f32,
    start_y: f32,
    last_x: f32,
    last_y: f32,
    down_t_ms: u64,
    last_t_ms: u64,
    velocity_x: f32,
    velocity_y: f32,
}

impl DragRecognizer {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            start_x: 0.0,
            start_y: 0.0,
            last_x: 0.0,
            last_y: 0.0,
            down_t_ms: 0,
            last_t_ms: 0,
            velocity_x: 0.0,
            velocity_y: 0.0,
        }
    }

    /// Whether the pointer is currently dragging
    pub fn is_dragging(&self) -> bool {
        self.phase == Phase::Dragging
    }

    /// Processes one pointer event.
    pub fn handle(&mut self, event: PointerEvent) -> GestureOutcome {
        match event.phase {
            PointerPhase::Down => {
                self.phase = Phase::PossibleDrag;
                self.start_x = event.x;
                self.start_y = event.y;
                self.last_x = event.x;
                self.last_y = event.y;
                self.down_t_ms = event.t_ms;
                self.last_t_ms = event.t_ms;
                self.velocity_x = 0.0;
                self.velocity_y = 0.0;
                GestureOutcome::None
            }
            PointerPhase::Move => {
                if self.phase == Phase::Idle {
                    return GestureOutcome::None;
                }
                let dx = event.x - self.last_x;
                let dy = event.y - self.last_y;

                if self.phase == Phase::PossibleDrag {
                    let held = event.t_ms - self.down_t_ms >= self.config.min_hold_ms;
                    let moved = (event.x - self.start_x).abs() > self.config.slop_px
                        || (event.y - self.start_y).abs() > self.config.slop_px;
                    if held && moved {
                        self.phase = Phase::Dragging;
                    }
                }

                let outcome = if self.phase == Phase::Dragging {
                    let dt_ms = event.t_ms - self.last_t_ms;
                    if dt_ms > 0 {
                        self.velocity_x = dx / dt_ms as f32 * 1000.0;
                        self.velocity_y = dy / dt_ms as f32 * 1000.0;
                    }
                    GestureOutcome::DragMove { dx, dy }
                } else {
                    GestureOutcome::None
                };

                self.last_x = event.x;
                self.last_y = event.y;
                self.last_t_ms = event.t_ms;
                outcome
            }
            PointerPhase::Up => {
                let was_dragging = self.phase == Phase::Dragging;
                self.phase = Phase::Idle;
                if was_dragging {
                    GestureOutcome::DragEnd {
                        velocity: (self.velocity_x, self.velocity_y),
                    }
                } else {
                    GestureOutcome::Tap
                }
            }
        }
    }
}
