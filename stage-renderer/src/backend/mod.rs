//! Rendering backend implementations.

pub mod canvas2d;
pub mod recording;

use stage_core::Surface;

use crate::{BackendType, DrawOp, RenderResult};

/// Trait for rendering backends.
pub trait RenderBackend {
    /// Get the backend type.
    fn backend_type(&self) -> BackendType;

    /// Render a surface.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, surface: &Surface) -> RenderResult<()>;

    /// Resize the rendering target.
    ///
    /// # Errors
    ///
    /// Returns an error if resizing fails.
    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()>;

    /// Operations drawn by the last frame.
    fn last_frame(&self) -> &[DrawOp];
}
