// Display geometry and left-to-right ordering.
//
// Each overlay gets a 1-based "slot" from its display's position on the
// virtual desktop: slot 1 is the leftmost display. The per-display shortcut
// for slot N is the toggle prefix plus the digit N.

use std::fmt;

/// A display rectangle in virtual-desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Zero-area rectangles come from disconnected or mirrored outputs.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} at ({}, {})", self.width, self.height, self.x, self.y)
    }
}

/// One connected display as reported by the windowing system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    /// Platform identifier (monitor index on Windows, CGDirectDisplayID on macOS).
    pub id: u32,
    pub name: String,
    pub bounds: Bounds,
    pub primary: bool,
}

/// Stable sort by left edge. Displays sharing an x position keep the order
/// the windowing system enumerated them in.
pub fn sort_left_to_right<T>(items: &mut [T], bounds: impl Fn(&T) -> Bounds) {
    items.sort_by_key(|item| bounds(item).x);
}

/// Drop empty displays and put the rest in slot order.
pub fn arrange(displays: Vec<DisplayInfo>) -> Vec<DisplayInfo> {
    let mut displays: Vec<DisplayInfo> = displays
        .into_iter()
        .filter(|d| {
            if d.bounds.is_empty() {
                tracing::debug!(display = d.id, name = %d.name, "skipping display with empty bounds");
                false
            } else {
                true
            }
        })
        .collect();
    sort_left_to_right(&mut displays, |d| d.bounds);
    displays
}
