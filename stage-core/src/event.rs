//! Pointer input delivered by the host.

use serde::{Deserialize, Serialize};

use crate::Point;

/// Kind of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerEventKind {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released.
    Up,
    /// Pointer entered the viewport.
    Enter,
    /// Pointer left the viewport.
    Leave,
    /// The host took the pointer away (e.g. touch interrupted).
    Cancel,
}

impl PointerEventKind {
    /// Every kind, in the order listeners are attached.
    pub const ALL: [Self; 6] = [
        Self::Down,
        Self::Move,
        Self::Up,
        Self::Enter,
        Self::Leave,
        Self::Cancel,
    ];
}

/// Which button an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Left mouse button, pen tip or first touch.
    #[default]
    Primary,
    /// Middle mouse button.
    Auxiliary,
    /// Right mouse button.
    Secondary,
}

/// A pointer event in physical pixels relative to the mounted surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Event kind.
    pub kind: PointerEventKind,
    /// Position in physical pixels, relative to the surface's top-left.
    pub position: Point,
    /// Button involved.
    #[serde(default)]
    pub button: PointerButton,
}

impl PointerEvent {
    /// Create a primary-button event.
    #[must_use]
    pub const fn new(kind: PointerEventKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            position: Point::new(x, y),
            button: PointerButton::Primary,
        }
    }

    /// Primary button pressed at `(x, y)`.
    #[must_use]
    pub const fn down(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Down, x, y)
    }

    /// Pointer moved to `(x, y)`.
    #[must_use]
    pub const fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Move, x, y)
    }

    /// Primary button released at `(x, y)`.
    #[must_use]
    pub const fn up(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Up, x, y)
    }

    /// Pointer entered at `(x, y)`.
    #[must_use]
    pub const fn enter(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Enter, x, y)
    }

    /// Pointer left the viewport.
    #[must_use]
    pub const fn leave() -> Self {
        Self::new(PointerEventKind::Leave, 0.0, 0.0)
    }

    /// Pointer interaction cancelled by the host.
    #[must_use]
    pub const fn cancel() -> Self {
        Self::new(PointerEventKind::Cancel, 0.0, 0.0)
    }

    /// Same event with a different button.
    #[must_use]
    pub const fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }
}
