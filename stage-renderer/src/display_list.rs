//! Scene graph flattening.
//!
//! Walks a surface's scene graph in z-order and emits [`DrawOp`]s in
//! physical pixels. Node translations (position plus drag offset) accumulate
//! down the tree; hidden subtrees are skipped entirely.

use serde::Serialize;
use stage_core::{NodeId, NodeKind, Point, Rect, Rgba, SceneGraph, StrokeMode, Surface};

use crate::{RenderError, RenderResult};

/// One drawing instruction, in physical pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    /// Fill the whole target.
    Clear {
        /// Target width.
        width: f64,
        /// Target height.
        height: f64,
        /// Fill color.
        color: Rgba,
    },
    /// Start an isolated group; erase strokes only affect their group.
    PushGroup {
        /// Node name, for debugging.
        name: String,
        /// Group opacity applied when the group is composited.
        opacity: f64,
    },
    /// Composite the innermost open group.
    PopGroup,
    /// An open poly-line.
    Polyline {
        /// Points.
        points: Vec<Point>,
        /// Stroke color.
        color: Rgba,
        /// Line width.
        width: f64,
        /// Composite mode.
        mode: StrokeMode,
        /// Node opacity.
        opacity: f64,
    },
    /// A circle.
    Circle {
        /// Centre.
        center: Point,
        /// Radius.
        radius: f64,
        /// Fill color.
        fill: Option<Rgba>,
        /// Outline color.
        stroke: Option<Rgba>,
        /// Outline width.
        stroke_width: f64,
        /// Node opacity.
        opacity: f64,
    },
    /// An axis-aligned rectangle.
    Rect {
        /// Geometry.
        rect: Rect,
        /// Fill color.
        fill: Option<Rgba>,
        /// Outline color.
        stroke: Option<Rgba>,
        /// Outline width.
        stroke_width: f64,
        /// Node opacity.
        opacity: f64,
    },
}

/// Flatten `surface` into draw operations.
///
/// # Errors
///
/// Returns [`RenderError::InvalidScene`] if a child id has no node.
pub fn flatten(surface: &Surface) -> RenderResult<Vec<DrawOp>> {
    let scene = surface.scene();
    let mut ops = Vec::with_capacity(scene.len() * 2);
    walk(scene, scene.root(), Point::ZERO, surface.scale(), &mut ops)?;
    Ok(ops)
}

fn walk(
    scene: &SceneGraph,
    id: NodeId,
    origin: Point,
    scale: f64,
    ops: &mut Vec<DrawOp>,
) -> RenderResult<()> {
    let node = scene
        .get(id)
        .ok_or_else(|| RenderError::InvalidScene(format!("child {id} has no node")))?;
    if !node.visible {
        return Ok(());
    }
    let origin = origin.offset(node.translation());
    let to_screen = |p: Point| p.offset(origin).scale(scale);

    match &node.kind {
        NodeKind::Group => {
            ops.push(DrawOp::PushGroup {
                name: node.name.clone(),
                opacity: node.opacity,
            });
            for child in node.children() {
                walk(scene, *child, origin, scale, ops)?;
            }
            ops.push(DrawOp::PopGroup);
        }
        NodeKind::Line {
            points,
            color,
            width,
            mode,
        } => ops.push(DrawOp::Polyline {
            points: points.iter().copied().map(to_screen).collect(),
            color: *color,
            width: width * scale,
            mode: *mode,
            opacity: node.opacity,
        }),
        NodeKind::Circle {
            center,
            radius,
            fill,
            stroke,
            stroke_width,
        } => ops.push(DrawOp::Circle {
            center: to_screen(*center),
            radius: radius * scale,
            fill: *fill,
            stroke: *stroke,
            stroke_width: stroke_width * scale,
            opacity: node.opacity,
        }),
        NodeKind::Rect {
            rect,
            fill,
            stroke,
            stroke_width,
        } => {
            let top_left = to_screen(Point::new(rect.x, rect.y));
            ops.push(DrawOp::Rect {
                rect: Rect::new(
                    top_left.x,
                    top_left.y,
                    rect.width * scale,
                    rect.height * scale,
                ),
                fill: *fill,
                stroke: *stroke,
                stroke_width: stroke_width * scale,
                opacity: node.opacity,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage_core::{ElementHandle, SurfaceRegistry};

    fn red() -> Rgba {
        Rgba {
            r: 255,
            g: 0,
            b: 0,
            a: 1.0,
        }
    }

    fn line(points: &[(f64, f64)]) -> NodeKind {
        NodeKind::Line {
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            color: red(),
            width: 4.0,
            mode: StrokeMode::Draw,
        }
    }

    #[test]
    fn test_empty_surface_emits_root_and_pass_groups() {
        let mut registry = SurfaceRegistry::default();
        let surface = registry.acquire(ElementHandle::next()).expect("acquire");
        let ops = flatten(surface).expect("flatten");

        let names: Vec<&str> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::PushGroup { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["root", "layers", "bbox", "preview"]);
        assert_eq!(
            ops.iter().filter(|op| matches!(op, DrawOp::PopGroup)).count(),
            4
        );
    }

    #[test]
    fn test_translation_and_drag_offset_accumulate() {
        let mut registry = SurfaceRegistry::default();
        let surface = registry.acquire(ElementHandle::next()).expect("acquire");
        surface.apply_fit(512.0, 512.0, 0.5);
        let layers = surface.layers_group();
        let scene = surface.scene_mut();
        let group = scene.create(layers, NodeKind::Group, "layer").expect("group");
        scene.create(group, line(&[(0.0, 0.0), (10.0, 20.0)]), "stroke").expect("line");
        let node = scene.get_mut(group).expect("node");
        node.position = Point::new(100.0, 40.0);
        node.drag_offset = Point::new(20.0, 0.0);

        let ops = flatten(surface).expect("flatten");
        let polyline = ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Polyline { points, width, .. } => Some((points.clone(), *width)),
                _ => None,
            })
            .expect("polyline");
        assert_eq!(polyline.0, vec![Point::new(60.0, 20.0), Point::new(65.0, 30.0)]);
        assert!((polyline.1 - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hidden_subtree_is_skipped() {
        let mut registry = SurfaceRegistry::default();
        let surface = registry.acquire(ElementHandle::next()).expect("acquire");
        let layers = surface.layers_group();
        let scene = surface.scene_mut();
        let group = scene.create(layers, NodeKind::Group, "layer").expect("group");
        scene.create(group, line(&[(0.0, 0.0)]), "stroke").expect("line");
        scene.get_mut(group).expect("node").visible = false;

        let ops = flatten(surface).expect("flatten");
        assert!(!ops.iter().any(|op| matches!(op, DrawOp::Polyline { .. })));
        assert!(!ops
            .iter()
            .any(|op| matches!(op, DrawOp::PushGroup { name, .. } if name == "layer")));
    }
}
