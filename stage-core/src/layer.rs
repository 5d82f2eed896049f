//! Layer entities - the externally owned content the stage mirrors.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Point, Rect, Rgba, StageError, StageResult};

/// Unique identifier for a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(Uuid);

impl LayerId {
    /// Create a new unique layer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a layer ID from its hyphenated string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a layer represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// A spatial prompt region: bounding box plus stroke-painted mask.
    RegionalGuidance,
    /// A plain raster layer.
    Raster,
    /// A control adapter image layer.
    ControlAdapter,
}

impl LayerKind {
    /// Whether layers of this kind can be selected and painted on.
    #[must_use]
    pub const fn is_region(self) -> bool {
        matches!(self, Self::RegionalGuidance)
    }
}

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// Create a color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The same color at the given alpha.
    #[must_use]
    pub fn with_alpha(self, a: f64) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: a.clamp(0.0, 1.0),
        }
    }
}

/// How a stroke composites with what is underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeMode {
    /// Paint over (`source-over`).
    #[default]
    Draw,
    /// Cut away (`destination-out`).
    Erase,
}

/// A poly-line painted onto a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStroke")]
pub struct Stroke {
    points: Vec<Point>,
    /// Stroke color.
    pub color: Rgb,
    /// Line width in content units.
    pub width: f64,
    /// Composite mode.
    pub mode: StrokeMode,
}

impl Stroke {
    /// Create a stroke.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::EmptyStroke`] if `points` is empty.
    pub fn new(points: Vec<Point>, color: Rgb, width: f64, mode: StrokeMode) -> StageResult<Self> {
        if points.is_empty() {
            return Err(StageError::EmptyStroke);
        }
        Ok(Self {
            points,
            color,
            width,
            mode,
        })
    }

    /// The points of this stroke, never empty.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Append a point unless it coincides with the last one.
    ///
    /// Returns whether the point was added.
    pub(crate) fn push_point(&mut self, point: Point) -> bool {
        if self.points.last() == Some(&point) {
            return false;
        }
        self.points.push(point);
        true
    }

    /// Bounds of the painted area, including half the line width.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        Rect::bounding(&self.points).map(|r| r.inflate(self.width / 2.0))
    }
}

/// Wire form of [`Stroke`], checked on the way in.
#[derive(Deserialize)]
struct RawStroke {
    points: Vec<Point>,
    color: Rgb,
    width: f64,
    #[serde(default)]
    mode: StrokeMode,
}

impl TryFrom<RawStroke> for Stroke {
    type Error = StageError;

    fn try_from(raw: RawStroke) -> StageResult<Self> {
        Self::new(raw.points, raw.color, raw.width, raw.mode)
    }
}

/// A layer as published by the external state owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Unique identifier.
    pub id: LayerId,
    /// Layer kind.
    pub kind: LayerKind,
    /// Strokes in paint order.
    #[serde(default)]
    pub strokes: Vec<Stroke>,
    /// Region of effect.
    pub bbox: Rect,
    /// Layer opacity in `[0, 1]`.
    #[serde(default = "Layer::default_opacity")]
    pub opacity: f64,
    /// Tint used for the brush preview.
    pub color: Rgb,
    /// Whether the layer is shown.
    #[serde(default = "Layer::default_visible")]
    pub visible: bool,
    /// Translation applied to the strokes.
    #[serde(default)]
    pub position: Point,
}

impl Layer {
    /// Create an empty, visible, fully opaque region layer covering `bbox`.
    #[must_use]
    pub fn region(bbox: Rect, color: Rgb) -> Self {
        Self {
            id: LayerId::new(),
            kind: LayerKind::RegionalGuidance,
            strokes: Vec::new(),
            bbox,
            opacity: 1.0,
            color,
            visible: true,
            position: Point::ZERO,
        }
    }

    /// Set the kind.
    #[must_use]
    pub fn with_kind(mut self, kind: LayerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Append a stroke.
    #[must_use]
    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.strokes.push(stroke);
        self
    }

    /// Set the position.
    #[must_use]
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Painted area in content space, including the layer translation.
    /// `None` for a layer without strokes.
    #[must_use]
    pub fn content_bounds(&self) -> Option<Rect> {
        self.strokes
            .iter()
            .filter_map(Stroke::bounds)
            .reduce(|a, b| a.union(&b))
            .map(|r| r.translate(self.position))
    }

    const fn default_opacity() -> f64 {
        1.0
    }

    const fn default_visible() -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_rejects_empty_points() {
        let result = Stroke::new(Vec::new(), Rgb::new(0, 0, 0), 4.0, StrokeMode::Draw);
        assert!(matches!(result, Err(StageError::EmptyStroke)));
    }

    #[test]
    fn test_content_bounds_includes_position_and_width() {
        let stroke = Stroke::new(
            vec![Point::new(10.0, 10.0), Point::new(30.0, 20.0)],
            Rgb::new(255, 0, 0),
            4.0,
            StrokeMode::Draw,
        )
        .expect("stroke");
        let layer = Layer::region(Rect::new(0.0, 0.0, 64.0, 64.0), Rgb::new(255, 0, 0))
            .with_stroke(stroke)
            .with_position(Point::new(5.0, -5.0));

        assert_eq!(
            layer.content_bounds(),
            Some(Rect::new(13.0, 3.0, 24.0, 14.0))
        );
    }

    #[test]
    fn test_push_point_skips_coincident() {
        let mut stroke = Stroke::new(
            vec![Point::new(1.0, 1.0)],
            Rgb::new(0, 0, 0),
            2.0,
            StrokeMode::Erase,
        )
        .expect("stroke");
        assert!(!stroke.push_point(Point::new(1.0, 1.0)));
        assert!(stroke.push_point(Point::new(2.0, 1.0)));
        assert!(!stroke.push_point(Point::new(2.0, 1.0)));
        assert_eq!(stroke.points().len(), 2);
    }

    #[test]
    fn test_deserialize_rejects_empty_stroke() {
        let json = r#"{"points":[],"color":{"r":0,"g":0,"b":0},"width":4.0}"#;
        assert!(serde_json::from_str::<Stroke>(json).is_err());
    }

    #[test]
    fn test_layer_id_parse_roundtrip() {
        let id = LayerId::new();
        assert_eq!(LayerId::parse(&id.to_string()).expect("parse"), id);
    }

    #[test]
    fn test_only_regional_guidance_is_region() {
        assert!(LayerKind::RegionalGuidance.is_region());
        assert!(!LayerKind::Raster.is_region());
        assert!(!LayerKind::ControlAdapter.is_region());
    }
}
