//! 2D Canvas backend.
//!
//! Translates the display list into a line-oriented script of Canvas 2D
//! context calls. A browser host replays the script against a
//! `CanvasRenderingContext2D`; one group maps to one `save`/`restore` pair
//! drawn into its own layer so erase strokes stay inside it.

use std::fmt::Write;

use stage_core::{Point, Rgba, StrokeMode, Surface};

use crate::display_list::flatten;
use crate::{BackendType, DrawOp, RenderError, RenderResult};

use super::RenderBackend;

/// 2D Canvas script renderer.
#[derive(Debug)]
pub struct Canvas2DBackend {
    width: u32,
    height: u32,
    background: Rgba,
    frame: Vec<DrawOp>,
    script: String,
}

impl Canvas2DBackend {
    /// Create a new 2D canvas backend.
    #[must_use]
    pub fn new(background: Rgba) -> Self {
        Self {
            width: 800,
            height: 600,
            background,
            frame: Vec::new(),
            script: String::new(),
        }
    }

    /// Script produced by the last frame.
    #[must_use]
    pub fn script(&self) -> &str {
        &self.script
    }

    fn write_op(out: &mut String, op: &DrawOp) -> std::fmt::Result {
        match op {
            DrawOp::Clear {
                width,
                height,
                color,
            } => {
                writeln!(out, "fillStyle {}", color.to_css())?;
                writeln!(out, "fillRect 0 0 {width} {height}")
            }
            DrawOp::PushGroup { name, opacity } => {
                writeln!(out, "save {name}")?;
                writeln!(out, "globalAlpha {opacity}")
            }
            DrawOp::PopGroup => writeln!(out, "restore"),
            DrawOp::Polyline {
                points,
                color,
                width,
                mode,
                opacity,
            } => {
                let composite = match mode {
                    StrokeMode::Draw => "source-over",
                    StrokeMode::Erase => "destination-out",
                };
                writeln!(out, "globalCompositeOperation {composite}")?;
                writeln!(out, "strokeStyle {}", color.to_css())?;
                writeln!(out, "lineWidth {width}")?;
                writeln!(out, "lineCap round")?;
                writeln!(out, "polyline {opacity} {}", Self::path(points))
            }
            DrawOp::Circle {
                center,
                radius,
                fill,
                stroke,
                stroke_width,
                opacity,
            } => {
                writeln!(out, "arc {} {} {radius} {opacity}", center.x, center.y)?;
                Self::write_paint(out, fill.as_ref(), stroke.as_ref(), *stroke_width)
            }
            DrawOp::Rect {
                rect,
                fill,
                stroke,
                stroke_width,
                opacity,
            } => {
                writeln!(
                    out,
                    "rect {} {} {} {} {opacity}",
                    rect.x, rect.y, rect.width, rect.height
                )?;
                Self::write_paint(out, fill.as_ref(), stroke.as_ref(), *stroke_width)
            }
        }
    }

    fn write_paint(
        out: &mut String,
        fill: Option<&Rgba>,
        stroke: Option<&Rgba>,
        stroke_width: f64,
    ) -> std::fmt::Result {
        writeln!(out, "globalCompositeOperation source-over")?;
        if let Some(fill) = fill {
            writeln!(out, "fill {}", fill.to_css())?;
        }
        if let Some(stroke) = stroke {
            writeln!(out, "stroke {} {stroke_width}", stroke.to_css())?;
        }
        Ok(())
    }

    fn path(points: &[Point]) -> String {
        points
            .iter()
            .map(|p| format!("{},{}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl RenderBackend for Canvas2DBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Canvas2D
    }

    fn render(&mut self, surface: &Surface) -> RenderResult<()> {
        let mut frame = vec![DrawOp::Clear {
            width: f64::from(self.width),
            height: f64::from(self.height),
            color: self.background,
        }];
        frame.extend(flatten(surface)?);

        let mut script = String::new();
        for op in &frame {
            Self::write_op(&mut script, op).map_err(|e| RenderError::Frame(e.to_string()))?;
        }
        tracing::trace!(
            "Canvas2D render: {} ops, {} script bytes, viewport {}x{}",
            frame.len(),
            script.len(),
            self.width,
            self.height
        );

        self.frame = frame;
        self.script = script;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.width = width;
        self.height = height;
        tracing::debug!("Canvas2D resized to {}x{}", width, height);
        Ok(())
    }

    fn last_frame(&self) -> &[DrawOp] {
        &self.frame
    }
}
