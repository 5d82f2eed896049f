//! Immutable state snapshots published by the external state owner.

use serde::{Deserialize, Serialize};

use crate::{Layer, LayerId, Point, StageCommand, StageError, StageResult, Tool};

/// Everything the stage reads from the application state, frozen at one
/// point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSnapshot {
    /// Layers in z-order, bottom first.
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// Selected layer, if any.
    #[serde(default)]
    pub selected_layer_id: Option<LayerId>,
    /// Active tool.
    #[serde(default)]
    pub tool: Tool,
    /// Brush radius in content units.
    #[serde(default = "StageSnapshot::default_brush_size")]
    pub brush_size: f64,
    /// Opacity multiplier for region layers, in `[0, 1]`.
    #[serde(default = "StageSnapshot::default_prompt_layer_opacity")]
    pub prompt_layer_opacity: f64,
    /// Width of the generation canvas.
    pub content_width: f64,
    /// Height of the generation canvas.
    pub content_height: f64,
}

impl StageSnapshot {
    /// Empty snapshot for a content canvas of the given size.
    #[must_use]
    pub fn new(content_width: f64, content_height: f64) -> Self {
        Self {
            layers: Vec::new(),
            selected_layer_id: None,
            tool: Tool::None,
            brush_size: Self::default_brush_size(),
            prompt_layer_opacity: Self::default_prompt_layer_opacity(),
            content_width,
            content_height,
        }
    }

    /// Append a layer.
    #[must_use]
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Set the selection.
    #[must_use]
    pub fn with_selection(mut self, id: Option<LayerId>) -> Self {
        self.selected_layer_id = id;
        self
    }

    /// Set the active tool.
    #[must_use]
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tool = tool;
        self
    }

    /// Set the brush size.
    #[must_use]
    pub fn with_brush_size(mut self, size: f64) -> Self {
        self.brush_size = size;
        self
    }

    /// Look up a layer.
    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// The selected layer, validated.
    ///
    /// `Ok(None)` when nothing is selected.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::DanglingSelection`] if the selection names a
    /// missing layer and [`StageError::SelectionNotRegion`] if it names a
    /// layer that is not a region layer.
    pub fn selected_region(&self) -> StageResult<Option<&Layer>> {
        let Some(id) = self.selected_layer_id else {
            return Ok(None);
        };
        let layer = self.layer(id).ok_or_else(|| {
            tracing::error!("Selection references missing layer {id}");
            StageError::DanglingSelection(id)
        })?;
        if !layer.kind.is_region() {
            tracing::error!("Selection references {:?} layer {id}", layer.kind);
            return Err(StageError::SelectionNotRegion {
                id,
                kind: layer.kind,
            });
        }
        Ok(Some(layer))
    }

    /// Apply a command, producing the next snapshot.
    ///
    /// Reference reducer for hosts that do not run their own store. Commands
    /// targeting a missing layer leave the snapshot unchanged.
    #[must_use]
    pub fn apply(&self, command: &StageCommand) -> Self {
        let mut next = self.clone();
        let Some(index) = next.layers.iter().position(|l| l.id == command.layer_id()) else {
            tracing::debug!("Ignoring command for missing layer {}", command.layer_id());
            return next;
        };
        let layer = &mut next.layers[index];
        match command {
            StageCommand::LayerTranslated { x, y, .. } => layer.position = Point::new(*x, *y),
            StageCommand::LayerBboxChanged { bbox, .. } => layer.bbox = *bbox,
            StageCommand::StrokeAdded { stroke, .. } => layer.strokes.push(stroke.clone()),
        }
        next
    }

    /// Parse a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> StageResult<Self> {
        serde_json::from_str(json).map_err(StageError::Serialization)
    }

    /// Serialize the snapshot to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> StageResult<String> {
        serde_json::to_string(self).map_err(StageError::Serialization)
    }

    const fn default_brush_size() -> f64 {
        25.0
    }

    const fn default_prompt_layer_opacity() -> f64 {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LayerKind, Rect, Rgb, Stroke, StrokeMode};

    fn region() -> Layer {
        Layer::region(Rect::new(0.0, 0.0, 100.0, 100.0), Rgb::new(120, 40, 200))
    }

    #[test]
    fn test_selected_region_none() {
        let snapshot = StageSnapshot::new(512.0, 512.0).with_layer(region());
        assert!(snapshot.selected_region().expect("valid").is_none());
    }

    #[test]
    fn test_selected_region_dangling() {
        let snapshot = StageSnapshot::new(512.0, 512.0)
            .with_layer(region())
            .with_selection(Some(LayerId::new()));
        assert!(matches!(
            snapshot.selected_region(),
            Err(StageError::DanglingSelection(_))
        ));
    }

    #[test]
    fn test_selected_region_wrong_kind() {
        let raster = region().with_kind(LayerKind::Raster);
        let id = raster.id;
        let snapshot = StageSnapshot::new(512.0, 512.0)
            .with_layer(raster)
            .with_selection(Some(id));
        assert!(matches!(
            snapshot.selected_region(),
            Err(StageError::SelectionNotRegion { kind: LayerKind::Raster, .. })
        ));
    }

    #[test]
    fn test_apply_commands() {
        let layer = region();
        let id = layer.id;
        let snapshot = StageSnapshot::new(512.0, 512.0).with_layer(layer);

        let moved = snapshot.apply(&StageCommand::LayerTranslated {
            layer_id: id,
            x: 12.0,
            y: -3.0,
        });
        assert_eq!(moved.layer(id).map(|l| l.position), Some(Point::new(12.0, -3.0)));

        let resized = moved.apply(&StageCommand::LayerBboxChanged {
            layer_id: id,
            bbox: Rect::new(1.0, 2.0, 3.0, 4.0),
        });
        assert_eq!(resized.layer(id).map(|l| l.bbox), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));

        let stroke = Stroke::new(vec![Point::new(1.0, 1.0)], Rgb::new(0, 0, 0), 2.0, StrokeMode::Draw)
            .expect("stroke");
        let painted = resized.apply(&StageCommand::StrokeAdded {
            layer_id: id,
            stroke,
        });
        assert_eq!(painted.layer(id).map(|l| l.strokes.len()), Some(1));
        assert_eq!(snapshot.layer(id).map(|l| l.strokes.len()), Some(0));
    }

    #[test]
    fn test_json_defaults() {
        let snapshot =
            StageSnapshot::from_json(r#"{"content_width": 512, "content_height": 768}"#).expect("json");
        assert_eq!(snapshot.tool, Tool::None);
        assert!(snapshot.layers.is_empty());
        assert!((snapshot.prompt_layer_opacity - 0.5).abs() < f64::EPSILON);
    }
}
