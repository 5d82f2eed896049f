//! Bounding-box editor.
//!
//! Draws the selected region layer's bounding box with eight resize handles
//! while the bbox tool is active, and computes resized rectangles for the
//! pointer router. Resizing clamps against the fixed opposite edge: a handle
//! dragged past its anchor stops at `min_size` instead of flipping.

use serde::{Deserialize, Serialize};

use crate::{
    LayerId, NodeId, NodeKind, Point, Rect, StageConfig, StageResult, StageSnapshot, Surface, Tool,
};

/// One of the eight resize handles around a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeHandle {
    /// Top-left corner.
    TopLeft,
    /// Middle of the top edge.
    Top,
    /// Top-right corner.
    TopRight,
    /// Middle of the right edge.
    Right,
    /// Bottom-right corner.
    BottomRight,
    /// Middle of the bottom edge.
    Bottom,
    /// Bottom-left corner.
    BottomLeft,
    /// Middle of the left edge.
    Left,
}

impl ResizeHandle {
    /// Every handle, corners first so they win hit tests on tiny boxes.
    pub const ALL: [Self; 8] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
        Self::Top,
        Self::Right,
        Self::Bottom,
        Self::Left,
    ];

    /// CSS cursor shown while hovering the handle.
    #[must_use]
    pub const fn cursor(self) -> &'static str {
        match self {
            Self::TopLeft | Self::BottomRight => "nwse-resize",
            Self::TopRight | Self::BottomLeft => "nesw-resize",
            Self::Top | Self::Bottom => "ns-resize",
            Self::Left | Self::Right => "ew-resize",
        }
    }

    /// Where the handle sits on `rect`.
    #[must_use]
    pub fn position(self, rect: &Rect) -> Point {
        let c = rect.center();
        match self {
            Self::TopLeft => Point::new(rect.x, rect.y),
            Self::Top => Point::new(c.x, rect.y),
            Self::TopRight => Point::new(rect.right(), rect.y),
            Self::Right => Point::new(rect.right(), c.y),
            Self::BottomRight => Point::new(rect.right(), rect.bottom()),
            Self::Bottom => Point::new(c.x, rect.bottom()),
            Self::BottomLeft => Point::new(rect.x, rect.bottom()),
            Self::Left => Point::new(rect.x, c.y),
        }
    }

    const fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::Left | Self::BottomLeft)
    }

    const fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::Right | Self::BottomRight)
    }

    const fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::Top | Self::TopRight)
    }

    const fn moves_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::Bottom | Self::BottomRight)
    }

    fn name(self) -> &'static str {
        match self {
            Self::TopLeft => "handle-top-left",
            Self::Top => "handle-top",
            Self::TopRight => "handle-top-right",
            Self::Right => "handle-right",
            Self::BottomRight => "handle-bottom-right",
            Self::Bottom => "handle-bottom",
            Self::BottomLeft => "handle-bottom-left",
            Self::Left => "handle-left",
        }
    }
}

/// The handle whose hit square (side `hit_size`) contains `point`.
#[must_use]
pub fn hit_test(rect: &Rect, point: Point, hit_size: f64) -> Option<ResizeHandle> {
    ResizeHandle::ALL
        .into_iter()
        .find(|h| Rect::centered(h.position(rect), hit_size).contains(point))
}

/// Resize `origin` by dragging `handle` to `pointer`.
///
/// The edges opposite the handle stay fixed. Moving edges stop `min_size`
/// short of their anchor, so the result is never narrower or shorter than
/// `min_size`.
#[must_use]
pub fn resize(origin: &Rect, handle: ResizeHandle, pointer: Point, min_size: f64) -> Rect {
    let (mut left, mut top) = (origin.x, origin.y);
    let (mut right, mut bottom) = (origin.right(), origin.bottom());

    if handle.moves_left() {
        left = pointer.x.min(right - min_size);
    }
    if handle.moves_right() {
        right = pointer.x.max(left + min_size);
    }
    if handle.moves_top() {
        top = pointer.y.min(bottom - min_size);
    }
    if handle.moves_bottom() {
        bottom = pointer.y.max(top + min_size);
    }
    Rect::new(left, top, (right - left).max(min_size), (bottom - top).max(min_size))
}

/// Bounding-box editor pass.
#[derive(Debug, Default)]
pub struct BboxEditor {
    outline: Option<NodeId>,
    handles: Vec<(ResizeHandle, NodeId)>,
}

impl BboxEditor {
    /// Create an editor with no nodes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget node ids after the surface was replaced.
    pub fn reset(&mut self) {
        self.outline = None;
        self.handles.clear();
    }

    /// Whether the editor currently has nodes in the scene.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.outline.is_some()
    }

    /// Draw or clear the editor.
    ///
    /// `transient` overrides the selected layer's rectangle while a resize is
    /// in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is invalid or a scene node the
    /// editor owns is missing.
    pub fn render(
        &mut self,
        surface: &mut Surface,
        snapshot: &StageSnapshot,
        tool: Tool,
        transient: Option<(LayerId, Rect)>,
        config: &StageConfig,
    ) -> StageResult<()> {
        let selected = match snapshot.selected_region() {
            Ok(selected) => selected,
            Err(e) => {
                self.clear(surface)?;
                return Err(e);
            }
        };
        let Some(layer) = selected.filter(|_| tool == Tool::Bbox) else {
            return self.clear(surface);
        };

        let rect = match transient {
            Some((id, rect)) if id == layer.id => rect,
            _ => layer.bbox,
        };
        let scale = surface.scale();
        let px = if scale > 0.0 { 1.0 / scale } else { 1.0 };
        let group = surface.bbox_group();
        let scene = surface.scene_mut();

        let outline_kind = NodeKind::Rect {
            rect,
            fill: None,
            stroke: Some(config.bbox_stroke_color.with_alpha(1.0)),
            stroke_width: px,
        };
        self.outline = Some(scene.upsert(group, self.outline, outline_kind, "bbox-outline")?);

        let handle_size = config.handle_size * px;
        for handle in ResizeHandle::ALL {
            let kind = NodeKind::Rect {
                rect: Rect::centered(handle.position(&rect), handle_size),
                fill: Some(config.handle_fill_color.with_alpha(1.0)),
                stroke: Some(config.bbox_stroke_color.with_alpha(1.0)),
                stroke_width: px,
            };
            let slot = self.handles.iter().position(|(h, _)| *h == handle);
            let id = scene.upsert(group, slot.map(|i| self.handles[i].1), kind, handle.name())?;
            if slot.is_none() {
                self.handles.push((handle, id));
            }
            scene.node_mut(id)?.cursor = Some(handle.cursor().to_string());
        }

        tracing::trace!(
            "Bbox editor for {} at ({}, {}) {}x{}",
            layer.id,
            rect.x,
            rect.y,
            rect.width,
            rect.height
        );
        Ok(())
    }

    fn clear(&mut self, surface: &mut Surface) -> StageResult<()> {
        if self.outline.is_none() && self.handles.is_empty() {
            return Ok(());
        }
        let group = surface.bbox_group();
        surface.scene_mut().clear_children(group)?;
        self.reset();
        Ok(())
    }
}
