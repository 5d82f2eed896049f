//! # Regional Stage Renderer
//!
//! Turns a mounted stage surface into something a host can draw.
//!
//! ## Rendering Backends
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            RenderBackend Trait              │
//! ├──────────────────────┬──────────────────────┤
//! │ Recording            │ Canvas2D             │
//! │ (display list)       │ (context script)     │
//! └──────────────────────┴──────────────────────┘
//! ```
//!
//! Both backends share one flattening pass ([`display_list::flatten`]) that
//! resolves translations, drag offsets, visibility and the fit scale.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod display_list;
pub mod error;

pub use backend::RenderBackend;
pub use display_list::DrawOp;
pub use error::{RenderError, RenderResult};

use stage_core::{Rgba, Surface};

/// Configuration for the renderer.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Backend to draw with.
    pub preferred_backend: BackendType,
    /// Background color.
    pub background_color: Rgba,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            preferred_backend: BackendType::Recording,
            background_color: Rgba {
                r: 255,
                g: 255,
                b: 255,
                a: 1.0,
            }, // White
        }
    }
}

/// Available rendering backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Keep the display list for the host to replay.
    Recording,
    /// Emit a Canvas 2D context script.
    Canvas2D,
}

/// The main renderer interface.
pub struct Renderer {
    config: RendererConfig,
    backend: Box<dyn RenderBackend>,
    frame_count: u64,
    target_size: (u32, u32),
}

impl Renderer {
    /// Create a new renderer with the given configuration.
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        let backend = Self::create_backend(&config);
        Self {
            config,
            backend,
            frame_count: 0,
            target_size: (0, 0),
        }
    }

    fn create_backend(config: &RendererConfig) -> Box<dyn RenderBackend> {
        match config.preferred_backend {
            BackendType::Recording => Box::new(backend::recording::RecordingBackend::new(
                config.background_color,
            )),
            BackendType::Canvas2D => Box::new(backend::canvas2d::Canvas2DBackend::new(
                config.background_color,
            )),
        }
    }

    /// Render a frame of `surface`.
    ///
    /// The target follows the surface's display size; a change resizes the
    /// backend before drawing.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn render(&mut self, surface: &Surface) -> RenderResult<()> {
        let (width, height) = surface.display_size();
        let size = (pixels(width), pixels(height));
        if size != self.target_size {
            self.resize(size.0, size.1)?;
        }
        self.backend.render(surface)?;
        self.frame_count += 1;
        Ok(())
    }

    /// Get the current frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the active backend type.
    #[must_use]
    pub fn active_backend(&self) -> BackendType {
        self.backend.backend_type()
    }

    /// Get the renderer configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Operations drawn by the last frame.
    #[must_use]
    pub fn last_frame(&self) -> &[DrawOp] {
        self.backend.last_frame()
    }

    /// The last frame serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn last_frame_json(&self) -> RenderResult<String> {
        Ok(serde_json::to_string(self.backend.last_frame())?)
    }

    /// Resize the rendering target.
    ///
    /// # Errors
    ///
    /// Returns an error if resize fails.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.target_size = (width, height);
        self.backend.resize(width, height)
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("backend", &self.backend.backend_type())
            .field("frame_count", &self.frame_count)
            .field("target_size", &self.target_size)
            .finish()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pixels(length: f64) -> u32 {
    if length.is_finite() && length > 0.0 {
        length.round().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}
