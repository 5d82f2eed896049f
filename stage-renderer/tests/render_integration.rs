//! Integration tests for rendering a live stage (stage-renderer).
//!
//! Mounts a viewport, drives it with snapshots and pointer input, and checks
//! the display list a host would draw.

use std::rc::Rc;
use std::sync::Arc;

use stage_core::{
    HeadlessElement, Layer, Point, PointerEvent, Rect, Rgb, Session, StageCommand, StageConfig,
    StageSnapshot, Stroke, StrokeMode, Tool, Viewport,
};
use stage_renderer::{BackendType, DrawOp, Renderer, RendererConfig};

/// Mount a viewport into a square container of the given size.
fn mounted(size: f64) -> Viewport {
    let mut viewport = Viewport::new(Session::new(), StageConfig::default()).expect("config");
    viewport
        .mount(
            Rc::new(HeadlessElement::new(size, size)),
            Rc::new(HeadlessElement::new(size, size)),
        )
        .expect("mount");
    viewport
}

/// A region layer with one horizontal stroke.
fn layer_with_stroke(mode: StrokeMode) -> Layer {
    let stroke = Stroke::new(
        vec![Point::new(100.0, 100.0), Point::new(200.0, 100.0)],
        Rgb::new(0, 128, 255),
        10.0,
        mode,
    )
    .expect("stroke");
    Layer::region(Rect::new(0.0, 0.0, 512.0, 512.0), Rgb::new(0, 128, 255)).with_stroke(stroke)
}

/// Render the viewport's surface once.
fn render(viewport: &Viewport, renderer: &mut Renderer) {
    viewport
        .with_surface(|surface| renderer.render(surface))
        .expect("mounted")
        .expect("render");
}

/// Every polyline in the last frame.
fn polylines(renderer: &Renderer) -> Vec<(Vec<Point>, f64, StrokeMode)> {
    renderer
        .last_frame()
        .iter()
        .filter_map(|op| match op {
            DrawOp::Polyline {
                points,
                width,
                mode,
                ..
            } => Some((points.clone(), *width, *mode)),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Layer Rendering Tests
// ============================================================================

#[test]
fn test_strokes_render_in_physical_pixels() {
    let mut viewport = mounted(256.0);
    let layer = layer_with_stroke(StrokeMode::Draw);
    viewport
        .sync(Arc::new(StageSnapshot::new(512.0, 512.0).with_layer(layer)))
        .expect("sync");

    let mut renderer = Renderer::new(RendererConfig::default());
    render(&viewport, &mut renderer);

    let lines = polylines(&renderer);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].0, vec![Point::new(50.0, 50.0), Point::new(100.0, 50.0)]);
    assert!((lines[0].1 - 5.0).abs() < f64::EPSILON);
    assert!(matches!(
        renderer.last_frame().first(),
        Some(DrawOp::Clear { width, .. }) if (*width - 256.0).abs() < f64::EPSILON
    ));
}

#[test]
fn test_region_layer_group_carries_prompt_opacity() {
    let mut viewport = mounted(512.0);
    let layer = layer_with_stroke(StrokeMode::Draw);
    let snapshot = StageSnapshot {
        prompt_layer_opacity: 0.3,
        ..StageSnapshot::new(512.0, 512.0).with_layer(layer.clone())
    };
    viewport.sync(Arc::new(snapshot)).expect("sync");

    let mut renderer = Renderer::new(RendererConfig::default());
    render(&viewport, &mut renderer);

    let name = format!("layer-{}", layer.id);
    let opacity = renderer
        .last_frame()
        .iter()
        .find_map(|op| match op {
            DrawOp::PushGroup { name: n, opacity } if *n == name => Some(*opacity),
            _ => None,
        })
        .expect("layer group");
    assert!((opacity - 0.3).abs() < 1e-9);
}

#[test]
fn test_hidden_layer_is_not_drawn() {
    let mut viewport = mounted(512.0);
    let mut layer = layer_with_stroke(StrokeMode::Erase);
    layer.visible = false;
    viewport
        .sync(Arc::new(StageSnapshot::new(512.0, 512.0).with_layer(layer)))
        .expect("sync");

    let mut renderer = Renderer::new(RendererConfig::default());
    render(&viewport, &mut renderer);
    assert!(polylines(&renderer).is_empty());
}

// ============================================================================
// Interactive Overlay Tests
// ============================================================================

#[test]
fn test_move_drag_renders_at_offset_before_commit() {
    let mut viewport = mounted(512.0);
    let layer = layer_with_stroke(StrokeMode::Draw);
    viewport
        .sync(Arc::new(
            StageSnapshot::new(512.0, 512.0)
                .with_layer(layer.clone())
                .with_selection(Some(layer.id))
                .with_tool(Tool::Move),
        ))
        .expect("sync");

    let mut sink: Vec<StageCommand> = Vec::new();
    for event in [PointerEvent::down(150.0, 100.0), PointerEvent::moved(170.0, 130.0)] {
        viewport.handle_pointer(event, &mut sink).expect("route");
    }

    let mut renderer = Renderer::new(RendererConfig::default());
    render(&viewport, &mut renderer);
    let lines = polylines(&renderer);
    assert_eq!(lines[0].0, vec![Point::new(120.0, 130.0), Point::new(220.0, 130.0)]);
    assert!(sink.is_empty());
}

#[test]
fn test_brush_preview_drawn_last() {
    let mut viewport = mounted(512.0);
    let layer = layer_with_stroke(StrokeMode::Draw);
    viewport
        .sync(Arc::new(
            StageSnapshot::new(512.0, 512.0)
                .with_layer(layer.clone())
                .with_selection(Some(layer.id))
                .with_tool(Tool::Brush)
                .with_brush_size(8.0),
        ))
        .expect("sync");
    let mut sink: Vec<StageCommand> = Vec::new();
    viewport
        .handle_pointer(PointerEvent::moved(64.0, 32.0), &mut sink)
        .expect("move");

    let mut renderer = Renderer::new(RendererConfig {
        preferred_backend: BackendType::Canvas2D,
        ..RendererConfig::default()
    });
    render(&viewport, &mut renderer);

    let frame = renderer.last_frame();
    let last_circle = frame
        .iter()
        .rposition(|op| matches!(op, DrawOp::Circle { .. }))
        .expect("preview circle");
    let last_polyline = frame
        .iter()
        .rposition(|op| matches!(op, DrawOp::Polyline { .. }))
        .expect("stroke");
    assert!(last_circle > last_polyline);
    assert!(matches!(
        &frame[last_circle],
        DrawOp::Circle { center, radius, .. }
            if *center == Point::new(64.0, 32.0) && (*radius - 8.0).abs() < f64::EPSILON
    ));
}
