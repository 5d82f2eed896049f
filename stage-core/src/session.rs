//! Session-wide tool, pointer and surface state.
//!
//! There is one active viewport and one active tool per editor session. The
//! state lives in a [`Session`] handle: hosts use [`Session::current`] for the
//! process-wide instance, tests construct a fresh [`Session::new`] per case.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{Point, SurfaceRegistry};

/// The active editing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Paint on the selected region layer.
    Brush,
    /// Erase from the selected region layer.
    Eraser,
    /// Drag the selected layer.
    Move,
    /// Resize the selected layer's bounding box.
    Bbox,
    /// Inspect only.
    #[default]
    None,
}

impl Tool {
    /// Whether this tool paints strokes.
    #[must_use]
    pub const fn paints(self) -> bool {
        matches!(self, Self::Brush | Self::Eraser)
    }
}

/// Last known pointer state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    /// Cursor in content space, `None` while the pointer is outside.
    pub cursor: Option<Point>,
    /// Whether the pointer is inside the viewport.
    pub inside: bool,
}

impl PointerState {
    /// Record a position observed inside the viewport.
    pub fn track(&mut self, at: Point) {
        self.cursor = Some(at);
        self.inside = true;
    }

    /// Forget the cursor after the pointer left.
    pub fn leave(&mut self) {
        self.cursor = None;
        self.inside = false;
    }
}

/// Mutable session state.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Active tool, mirrored from the latest snapshot.
    pub tool: Tool,
    /// Pointer tracking.
    pub pointer: PointerState,
    /// Mounted surfaces.
    pub surfaces: SurfaceRegistry,
}

/// Shared handle to session state.
#[derive(Debug, Clone, Default)]
pub struct Session(Rc<RefCell<SessionState>>);

thread_local! {
    static CURRENT: Session = Session::new();
}

impl Session {
    /// Fresh, empty session state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide session for the UI thread.
    #[must_use]
    pub fn current() -> Self {
        CURRENT.with(Clone::clone)
    }

    /// Borrow the state.
    ///
    /// # Panics
    ///
    /// Panics if the state is currently borrowed mutably.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, SessionState> {
        self.0.borrow()
    }

    /// Borrow the state mutably.
    ///
    /// # Panics
    ///
    /// Panics if the state is currently borrowed.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, SessionState> {
        self.0.borrow_mut()
    }

    /// Active tool.
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.borrow().tool
    }

    /// Cursor in content space.
    #[must_use]
    pub fn cursor(&self) -> Option<Point> {
        self.borrow().pointer.cursor
    }

    /// Whether the pointer is inside the viewport.
    #[must_use]
    pub fn pointer_inside(&self) -> bool {
        self.borrow().pointer.inside
    }

    /// Number of live surfaces in this session.
    #[must_use]
    pub fn live_surfaces(&self) -> usize {
        self.borrow().surfaces.live()
    }

    /// Whether two handles share the same state.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
