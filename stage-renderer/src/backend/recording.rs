//! Recording backend.
//!
//! Keeps the flattened display list of the last frame so hosts can replay it
//! on their own drawing surface, and tests can inspect it.

use stage_core::{Rgba, Surface};

use crate::display_list::flatten;
use crate::{BackendType, DrawOp, RenderResult};

use super::RenderBackend;

/// Backend that records draw operations.
#[derive(Debug)]
pub struct RecordingBackend {
    width: u32,
    height: u32,
    background: Rgba,
    frame: Vec<DrawOp>,
}

impl RecordingBackend {
    /// Create a recording backend that clears to `background`.
    #[must_use]
    pub fn new(background: Rgba) -> Self {
        Self {
            width: 0,
            height: 0,
            background,
            frame: Vec::new(),
        }
    }
}

impl RenderBackend for RecordingBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Recording
    }

    fn render(&mut self, surface: &Surface) -> RenderResult<()> {
        let mut frame = vec![DrawOp::Clear {
            width: f64::from(self.width),
            height: f64::from(self.height),
            color: self.background,
        }];
        frame.extend(flatten(surface)?);
        tracing::trace!(
            "Recorded {} ops for {} at {}x{}",
            frame.len(),
            surface.id(),
            self.width,
            self.height
        );
        self.frame = frame;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.width = width;
        self.height = height;
        tracing::debug!("Recording target resized to {}x{}", width, height);
        Ok(())
    }

    fn last_frame(&self) -> &[DrawOp] {
        &self.frame
    }
}
