//! Viewport lifecycle and pass orchestration.
//!
//! A [`Viewport`] is the mounted stage. It owns the four reconciliation
//! passes (fit, layers, bounding box, brush preview) and the pointer router,
//! and drives them from two inputs: state snapshots via [`Viewport::sync`]
//! and host pointer events via [`Viewport::handle_pointer`].
//!
//! ```text
//!  snapshot ──► sync ──► fit ─► layers ─► bbox ─► preview ──► Surface
//!                                                               ▲
//!  pointer ───► handle_pointer ──► PointerRouter ──► transients ┘
//!                                        │
//!                                        └──► CommandSink (durable)
//! ```
//!
//! The surface itself lives in the session's [`SurfaceRegistry`](crate::SurfaceRegistry),
//! keyed by the container element.

use std::rc::Rc;
use std::sync::Arc;

use crate::{
    compute_fit_scale, BboxEditor, BrushPreview, CommandSink, DragState, ElementHandle,
    HostElement, LayerId, LayerPassInput, LayerReconciler, ListenerId, NodeId, ObserverId,
    PointerEvent, PointerEventKind, PointerRouter, RouteContext, Session, StageConfig,
    StageResult, StageSnapshot, Surface,
};

struct Mount {
    container: Rc<dyn HostElement>,
    wrapper: Rc<dyn HostElement>,
    handle: ElementHandle,
    listeners: Vec<ListenerId>,
    observer: ObserverId,
    measured: (f64, f64),
}

impl std::fmt::Debug for Mount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mount")
            .field("handle", &self.handle)
            .field("listeners", &self.listeners.len())
            .field("observer", &self.observer)
            .field("measured", &self.measured)
            .finish_non_exhaustive()
    }
}

/// The mounted stage.
#[derive(Debug)]
pub struct Viewport {
    session: Session,
    config: StageConfig,
    mount: Option<Mount>,
    snapshot: Arc<StageSnapshot>,
    layers: LayerReconciler,
    preview: BrushPreview,
    bbox: BboxEditor,
    router: PointerRouter,
}

impl Viewport {
    /// Create an unmounted viewport bound to `session`.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::InvalidConfig`](crate::StageError::InvalidConfig)
    /// if `config` is out of range.
    pub fn new(session: Session, config: StageConfig) -> StageResult<Self> {
        config.validate()?;
        Ok(Self {
            session,
            config,
            mount: None,
            snapshot: Arc::new(StageSnapshot::new(0.0, 0.0)),
            layers: LayerReconciler::new(),
            preview: BrushPreview::new(),
            bbox: BboxEditor::new(),
            router: PointerRouter::new(),
        })
    }

    /// Mount into `container`, measuring size on `wrapper`.
    ///
    /// Mounting an already mounted viewport unmounts it first, so at most
    /// one surface is ever live for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be built or the first render
    /// hits a contract violation. The viewport stays mounted in the latter
    /// case.
    pub fn mount(
        &mut self,
        container: Rc<dyn HostElement>,
        wrapper: Rc<dyn HostElement>,
    ) -> StageResult<()> {
        self.unmount();

        let handle = container.element_handle();
        self.session.borrow_mut().surfaces.acquire(handle)?;

        let listeners = PointerEventKind::ALL
            .iter()
            .map(|&kind| container.add_listener(kind))
            .collect();
        let observer = wrapper.observe_resize();
        let measured = wrapper.client_size();
        tracing::debug!("Mounted viewport on {handle}, wrapper {measured:?}");

        self.mount = Some(Mount {
            container,
            wrapper,
            handle,
            listeners,
            observer,
            measured,
        });
        self.run_passes(true)
    }

    /// Detach listeners, stop observing, then destroy the surface.
    ///
    /// Returns whether the viewport was mounted. Safe to call repeatedly.
    pub fn unmount(&mut self) -> bool {
        let Some(mount) = self.mount.take() else {
            return false;
        };
        for id in &mount.listeners {
            mount.container.remove_listener(*id);
        }
        mount.wrapper.unobserve_resize(mount.observer);
        self.session.borrow_mut().surfaces.release(mount.handle);

        self.router.abort("viewport unmounted");
        self.layers.reset();
        self.preview.reset();
        self.bbox.reset();
        tracing::debug!("Unmounted viewport from {}", mount.handle);
        true
    }

    /// Whether a surface is mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mount.is_some()
    }

    /// Resize notification from the wrapper element.
    ///
    /// # Errors
    ///
    /// Returns an error if re-rendering the scale-dependent passes fails.
    pub fn resize(&mut self, width: f64, height: f64) -> StageResult<()> {
        let Some(mount) = self.mount.as_mut() else {
            return Ok(());
        };
        mount.measured = (width, height);
        self.run_passes(false)
    }

    /// Consume a new snapshot and re-render every pass.
    ///
    /// A tool change aborts any interaction in progress, as does the removal
    /// of the layer being dragged. Every pass runs even if an earlier one
    /// fails; the first error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first contract violation reported by a pass.
    pub fn sync(&mut self, snapshot: Arc<StageSnapshot>) -> StageResult<()> {
        let previous = self.session.tool();
        self.router.tool_changed(previous, snapshot.tool);
        self.session.borrow_mut().tool = snapshot.tool;
        self.router.retain_target(&snapshot);
        self.snapshot = snapshot;
        self.run_passes(true)
    }

    /// Route a host pointer event whose position is in physical pixels.
    ///
    /// Durable commands go to `sink`. The sink must not re-enter this
    /// viewport; hosts buffer commands and publish the next snapshot
    /// afterwards. Events arriving while unmounted are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is invalid when an interaction
    /// starts, or if refreshing the transient visuals fails.
    pub fn handle_pointer(
        &mut self,
        event: PointerEvent,
        sink: &mut dyn CommandSink,
    ) -> StageResult<()> {
        let Some(handle) = self.mount.as_ref().map(|m| m.handle) else {
            return Ok(());
        };
        let (local, scale) = {
            let state = self.session.borrow();
            let Some(surface) = state.surfaces.get(handle) else {
                return Ok(());
            };
            let local = PointerEvent {
                position: surface.to_content(event.position),
                ..event
            };
            (local, surface.scale())
        };

        {
            let mut state = self.session.borrow_mut();
            let ctx = RouteContext {
                snapshot: &self.snapshot,
                tool: state.tool,
                scale,
                config: &self.config,
            };
            self.router.handle(&local, &ctx, &mut state.pointer, sink)?;
        }
        self.run_passes(false)
    }

    /// Session this viewport renders into.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &Arc<StageSnapshot> {
        &self.snapshot
    }

    /// Stage tunables.
    #[must_use]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Current interaction.
    #[must_use]
    pub fn drag_state(&self) -> &DragState {
        self.router.state()
    }

    /// Scene group for `layer`, if reconciled.
    #[must_use]
    pub fn layer_node(&self, layer: LayerId) -> Option<NodeId> {
        self.layers.node_for(layer)
    }

    /// Whether the brush preview is drawn.
    #[must_use]
    pub fn preview_visible(&self) -> bool {
        self.with_surface(|s| self.preview.is_visible(s))
            .unwrap_or_default()
    }

    /// Whether the bounding-box editor is drawn.
    #[must_use]
    pub fn bbox_shown(&self) -> bool {
        self.bbox.is_shown()
    }

    /// Run `f` against the mounted surface.
    pub fn with_surface<R>(&self, f: impl FnOnce(&Surface) -> R) -> Option<R> {
        let handle = self.mount.as_ref()?.handle;
        let state = self.session.borrow();
        state.surfaces.get(handle).map(f)
    }

    fn run_passes(&mut self, with_layers: bool) -> StageResult<()> {
        let Some(mount) = self.mount.as_ref() else {
            return Ok(());
        };
        let (handle, (width, height)) = (mount.handle, mount.measured);

        let mut guard = self.session.borrow_mut();
        let state = &mut *guard;
        let Some(surface) = state.surfaces.get_mut(handle) else {
            return Ok(());
        };
        let snapshot = &*self.snapshot;
        let tool = state.tool;

        let scale = compute_fit_scale(
            snapshot.content_width,
            snapshot.content_height,
            width,
            height,
        );
        if (scale - surface.scale()).abs() > f64::EPSILON {
            tracing::debug!(
                "Fit {}x{} into {width}x{height}: scale {scale}",
                snapshot.content_width,
                snapshot.content_height
            );
        }
        surface.apply_fit(snapshot.content_width, snapshot.content_height, scale);

        let layers = if with_layers {
            let input = LayerPassInput {
                layers: &snapshot.layers,
                selected: snapshot.selected_layer_id,
                prompt_layer_opacity: snapshot.prompt_layer_opacity,
                tool,
            };
            self.layers.reconcile(surface, &input).map(|_| ())
        } else {
            Ok(())
        };
        let transients = render_transients(&mut self.layers, self.router.state(), surface);
        let bbox = self.bbox.render(
            surface,
            snapshot,
            tool,
            self.router.state().resize_preview(),
            &self.config,
        );
        let preview = self
            .preview
            .render(surface, snapshot, tool, &state.pointer, &self.config);

        layers.and(transients).and(bbox).and(preview)
    }
}

impl Drop for Viewport {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn render_transients(
    layers: &mut LayerReconciler,
    drag: &DragState,
    surface: &mut Surface,
) -> StageResult<()> {
    match drag.pending_stroke() {
        Some((layer, stroke)) => {
            layers.clear_pending(surface, Some(layer))?;
            layers.render_pending(surface, layer, stroke)?;
        }
        None => layers.clear_pending(surface, None)?,
    }
    layers.reset_drag_offsets(surface)?;
    if let Some((layer, offset)) = drag.move_offset() {
        layers.set_drag_offset(surface, layer, offset)?;
    }
    Ok(())
}
