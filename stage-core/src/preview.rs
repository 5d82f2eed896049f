//! Brush preview.
//!
//! A cursor-following circle showing the brush or eraser footprint. This is
//! the hottest path in the stage (it runs on every pointer move), so it keeps
//! two nodes alive and only rewrites their attributes.

use crate::{NodeId, NodeKind, PointerState, StageConfig, StageResult, StageSnapshot, Surface, Tool};

/// Brush preview pass.
#[derive(Debug, Default)]
pub struct BrushPreview {
    fill: Option<NodeId>,
    ring: Option<NodeId>,
}

impl BrushPreview {
    /// Create a preview with no nodes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget node ids after the surface was replaced.
    pub fn reset(&mut self) {
        self.fill = None;
        self.ring = None;
    }

    /// Draw, move or hide the preview.
    ///
    /// Visible only when a region layer is selected, the tool paints and the
    /// cursor is inside the viewport.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is invalid; the preview never falls
    /// back to a default color.
    pub fn render(
        &mut self,
        surface: &mut Surface,
        snapshot: &StageSnapshot,
        tool: Tool,
        pointer: &PointerState,
        config: &StageConfig,
    ) -> StageResult<()> {
        let selected = match snapshot.selected_region() {
            Ok(selected) => selected,
            Err(e) => {
                self.hide(surface)?;
                return Err(e);
            }
        };
        let target = match (selected, pointer.cursor) {
            (Some(layer), Some(cursor)) if tool.paints() => Some((layer, cursor)),
            _ => None,
        };

        let Some((layer, center)) = target else {
            return self.hide(surface);
        };

        let scale = surface.scale();
        let px = if scale > 0.0 { 1.0 / scale } else { 1.0 };
        let radius = snapshot.brush_size;
        let fill = match tool {
            Tool::Eraser => None,
            _ => Some(layer.color.with_alpha(config.preview_fill_alpha)),
        };
        let group = surface.preview_group();
        let scene = surface.scene_mut();

        let fill_kind = NodeKind::Circle {
            center,
            radius,
            fill,
            stroke: None,
            stroke_width: 0.0,
        };
        let ring_kind = NodeKind::Circle {
            center,
            radius,
            fill: None,
            stroke: Some(config.preview_ring_color.with_alpha(1.0)),
            stroke_width: config.preview_ring_width * px,
        };
        let fill_id = scene.upsert(group, self.fill, fill_kind, "brush-preview-fill")?;
        let ring_id = scene.upsert(group, self.ring, ring_kind, "brush-preview-ring")?;
        self.fill = Some(fill_id);
        self.ring = Some(ring_id);
        scene.node_mut(fill_id)?.visible = true;
        scene.node_mut(ring_id)?.visible = true;
        Ok(())
    }

    /// Whether the preview is currently drawn.
    #[must_use]
    pub fn is_visible(&self, surface: &Surface) -> bool {
        self.fill
            .and_then(|id| surface.scene().get(id))
            .is_some_and(|node| node.visible)
    }

    fn hide(&mut self, surface: &mut Surface) -> StageResult<()> {
        for id in [self.fill, self.ring].into_iter().flatten() {
            surface.scene_mut().node_mut(id)?.visible = false;
        }
        Ok(())
    }
}
