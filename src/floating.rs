//! Placement rules for the floating button and the panel next to it.

use eframe::egui::{Pos2, Rect, Vec2};
use std::time::Duration;

/// Gap between the button and the right screen edge on first start.
pub const EDGE_OFFSET: f32 = 12.0;
/// Gap between the button and the panel.
pub const PANEL_GAP: f32 = 10.0;
/// Pointer travel (Manhattan) before a press turns into a drag.
pub const DRAG_THRESHOLD: f32 = 10.0;
/// Snapping always reaches at least this far.
pub const MIN_SNAP_DISTANCE: f32 = 30.0;
/// Interval of the keep-on-screen guard.
pub const GUARD_INTERVAL: Duration = Duration::from_millis(2500);

/// Right edge, vertically centred.
pub fn initial_position(screen: Rect, size: Vec2) -> Pos2 {
    Pos2::new(
        screen.max.x - size.x - EDGE_OFFSET,
        screen.min.y + (screen.height() - size.y) / 2.0,
    )
}

pub fn ensure_in_screen(pos: Pos2, size: Vec2, screen: Rect) -> Pos2 {
    Pos2::new(
        pos.x.max(screen.min.x).min(screen.max.x - size.x),
        pos.y.max(screen.min.y).min(screen.max.y - size.y),
    )
}

/// Move flush to the nearest screen edge when within reach. On ties left
/// wins over right, right over top, and top over bottom.
pub fn snap_to_edges(pos: Pos2, size: Vec2, screen: Rect, margin: f32) -> Pos2 {
    let d_left = (pos.x - screen.min.x).abs();
    let d_right = (screen.max.x - (pos.x + size.x)).abs();
    let d_top = (pos.y - screen.min.y).abs();
    let d_bottom = (screen.max.y - (pos.y + size.y)).abs();

    let nearest = d_left.min(d_right).min(d_top).min(d_bottom);
    if nearest > margin.max(MIN_SNAP_DISTANCE) {
        return pos;
    }
    let mut out = pos;
    if nearest == d_left {
        out.x = screen.min.x;
    } else if nearest == d_right {
        out.x = screen.max.x - size.x;
    } else if nearest == d_top {
        out.y = screen.min.y;
    } else {
        out.y = screen.max.y - size.y;
    }
    out
}

/// Panel to the right of the button, or to the left when it would not fit.
/// Either way it is kept on screen, flush with the left edge when the screen
/// is narrower than the panel.
pub fn panel_position(button: Rect, panel: Vec2, screen: Rect) -> Pos2 {
    let mut x = button.max.x + PANEL_GAP;
    if x + panel.x > screen.max.x {
        x = button.min.x - panel.x - PANEL_GAP;
    }
    let x = x.min(screen.max.x - panel.x).max(screen.min.x);
    let y = (button.center().y - panel.y / 2.0)
        .min(screen.max.y - panel.y)
        .max(screen.min.y);
    Pos2::new(x, y)
}

pub fn opacity(hovered: bool, idle: f32, active: f32) -> f32 {
    if hovered {
        active
    } else {
        idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragRelease {
    /// Released without moving far enough.
    Click,
    /// A drag ended; the caller snaps the window.
    Dropped,
    /// Release with no matching press.
    Ignored,
}

/// Distinguishes a click on the button from a drag of the button.
#[derive(Debug, Default, Clone)]
pub struct DragTracker {
    press: Option<(Pos2, Vec2)>,
    dragging: bool,
}

impl DragTracker {
    /// `pointer` and `window` are in screen coordinates.
    pub fn press(&mut self, pointer: Pos2, window: Pos2) {
        self.press = Some((pointer, pointer - window));
        self.dragging = false;
    }

    /// New window position while dragging.
    pub fn drag_to(&mut self, pointer: Pos2) -> Option<Pos2> {
        let (start, grab) = self.press?;
        if !self.dragging {
            let d = pointer - start;
            if d.x.abs() + d.y.abs() > DRAG_THRESHOLD {
                self.dragging = true;
            }
        }
        self.dragging.then(|| pointer - grab)
    }

    pub fn release(&mut self) -> DragRelease {
        let result = match (self.press.take(), self.dragging) {
            (None, _) => DragRelease::Ignored,
            (Some(_), true) => DragRelease::Dropped,
            (Some(_), false) => DragRelease::Click,
        };
        self.dragging = false;
        result
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}
