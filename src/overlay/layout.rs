//! Overlay window geometry
//!
//! Pure math for placing the collapsed icon and the expanded panel:
//! expansion sizing, icon clamping, snap-to-edge animation targets, and
//! the throw-to-dismiss decision. Everything here is deterministic and
//! unit-testable; the renderer applies the results.

/// Side length of the collapsed icon window, in pixels.
pub const ICON_SIZE: i32 = 100;
/// Gap kept between the snapped icon and the screen edge.
pub const EDGE_PADDING: i32 = 16;
/// Panel width as a fraction of the screen width.
pub const PANEL_WIDTH_FRACTION: f32 = 0.9;
/// Panel height as a fraction of the screen height.
pub const PANEL_HEIGHT_FRACTION: f32 = 0.3;
/// Minimum panel height regardless of screen size, in pixels.
pub const PANEL_MIN_HEIGHT: i32 = 250;
/// Velocity above which a drag release counts as a throw, in px/s.
pub const THROW_VELOCITY_PX_PER_S: f32 = 500.0;
/// Off-screen fraction that dismisses a thrown panel.
pub const DISMISS_FRACTION_THROWN: f32 = 0.3;
/// Off-screen fraction that dismisses a slowly released panel.
pub const DISMISS_FRACTION: f32 = 0.4;
/// Duration of the snap-to-edge animation, in milliseconds.
pub const SNAP_DURATION_MS: u64 = 200;

/// Usable screen dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenMetrics {
    pub width: i32,
    pub height: i32,
}

/// Position and size of an overlay window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Frame {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// An icon-sized frame at the given position.
    pub fn icon_at(x: i32, y: i32) -> Self {
        Self::new(x, y, ICON_SIZE, ICON_SIZE)
    }
}

/// Panel size for the given screen: 90% of the width, 30% of the height,
/// never shorter than [`PANEL_MIN_HEIGHT`].
pub fn panel_size(screen: ScreenMetrics) -> (i32, i32) {
    let width = (screen.width as f32 * PANEL_WIDTH_FRACTION) as i32;
    let height = ((screen.height as f32 * PANEL_HEIGHT_FRACTION) as i32).max(PANEL_MIN_HEIGHT);
    (width, height)
}

/// Clamps an icon position so the icon stays fully on screen.
pub fn clamp_icon_position(x: i32, y: i32, screen: ScreenMetrics) -> (i32, i32) {
    (
        x.clamp(0, screen.width - ICON_SIZE),
        y.clamp(0, screen.height - ICON_SIZE),
    )
}

/// Horizontal snap target for a released icon: the nearer screen edge,
/// judged by the icon's center, inset by [`EDGE_PADDING`].
pub fn snap_target_x(icon_x: i32, screen: ScreenMetrics) -> i32 {
    let center_x = icon_x + ICON_SIZE / 2;
    if center_x < screen.width / 2 {
        EDGE_PADDING
    } else {
        screen.width - ICON_SIZE - EDGE_PADDING
    }
}

/// Decelerating ease: fast at first, settling into the target.
pub fn decelerate(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Interpolated x position of a snap animation at progress `t` in [0, 1].
pub fn snap_position_at(from_x: i32, target_x: i32, t: f32) -> i32 {
    from_x + ((target_x - from_x) as f32 * decelerate(t)).round() as i32
}

/// Fraction of the frame hanging off each screen edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffscreenFractions {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl OffscreenFractions {
    pub fn max(&self) -> f32 {
        self.left.max(self.right).max(self.top).max(self.bottom)
    }
}

/// How far the frame hangs off each edge, as fractions of its own size.
pub fn offscreen_fractions(frame: Frame, screen: ScreenMetrics) -> OffscreenFractions {
    let left = if frame.x < 0 {
        (-frame.x) as f32 / frame.width as f32
    } else {
        0.0
    };
    let right_edge = frame.x + frame.width;
    let right = if right_edge > screen.width {
        (right_edge - screen.width) as f32 / frame.width as f32
    } else {
        0.0
    };
    let top = if frame.y < 0 {
        (-frame.y) as f32 / frame.height as f32
    } else {
        0.0
    };
    let bottom_edge = frame.y + frame.height;
    let bottom = if bottom_edge > screen.height {
        (bottom_edge - screen.height) as f32 / frame.height as f32
    } else {
        0.0
    };
    OffscreenFractions { left, right, top, bottom }
}

/// Decides whether a released panel drag dismisses the overlay.
///
/// A fast throw always dismisses. Otherwise the panel must hang far
/// enough off screen, with a lower bar when the release still carried
/// throw-level velocity.
pub fn should_dismiss(frame: Frame, screen: ScreenMetrics, velocity: (f32, f32)) -> bool {
    let thrown = velocity.0.abs() > THROW_VELOCITY_PX_PER_S
        || velocity.1.abs() > THROW_VELOCITY_PX_PER_S;
    let threshold = if thrown {
        DISMISS_FRACTION_THROWN
    } else {
        DISMISS_FRACTION
    };
    thrown || offscreen_fractions(frame, screen).max() > threshold
}
