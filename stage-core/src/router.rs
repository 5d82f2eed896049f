//! Pointer event router.
//!
//! Interprets pointer events according to the active tool. In-progress work
//! lives in an explicit [`DragState`]; durable commands are dispatched only
//! when an interaction commits (pointer-up, or a new pointer-down while one
//! is still active). Aborts (tool switch, cancel, target layer vanished)
//! dispatch nothing.

use crate::{
    bbox, CommandSink, LayerId, Point, PointerButton, PointerEvent, PointerEventKind,
    PointerState, Rect, ResizeHandle, StageCommand, StageConfig, StageResult, StageSnapshot,
    Stroke, StrokeMode, Tool,
};

/// What the router is doing between pointer-down and pointer-up.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    /// No interaction in progress.
    #[default]
    Idle,
    /// Painting a stroke.
    Stroking {
        /// Target layer.
        layer: LayerId,
        /// Layer position at stroke start; points are stored relative to it.
        origin: Point,
        /// Points collected so far, layer-local.
        stroke: Stroke,
    },
    /// Dragging a layer.
    Moving {
        /// Dragged layer.
        layer: LayerId,
        /// Pointer position at drag start.
        grab: Point,
        /// Layer position at drag start.
        start: Point,
        /// Latest pointer position.
        pointer: Point,
    },
    /// Dragging a bounding-box handle.
    Resizing {
        /// Layer whose box is resized.
        layer: LayerId,
        /// Dragged handle.
        handle: ResizeHandle,
        /// Box at drag start.
        origin: Rect,
        /// Box as it would be committed now.
        current: Rect,
    },
}

impl DragState {
    /// Whether nothing is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Layer targeted by the current interaction.
    #[must_use]
    pub fn layer(&self) -> Option<LayerId> {
        match self {
            Self::Idle => None,
            Self::Stroking { layer, .. }
            | Self::Moving { layer, .. }
            | Self::Resizing { layer, .. } => Some(*layer),
        }
    }

    /// Offset to show on the dragged layer while moving.
    #[must_use]
    pub fn move_offset(&self) -> Option<(LayerId, Point)> {
        match self {
            Self::Moving {
                layer,
                grab,
                pointer,
                ..
            } => Some((*layer, pointer.delta_from(*grab))),
            _ => None,
        }
    }

    /// Rectangle to show while resizing.
    #[must_use]
    pub fn resize_preview(&self) -> Option<(LayerId, Rect)> {
        match self {
            Self::Resizing { layer, current, .. } => Some((*layer, *current)),
            _ => None,
        }
    }

    /// Stroke being painted.
    #[must_use]
    pub fn pending_stroke(&self) -> Option<(LayerId, &Stroke)> {
        match self {
            Self::Stroking { layer, stroke, .. } => Some((*layer, stroke)),
            _ => None,
        }
    }
}

/// What the router reads besides the event itself.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    /// Latest published state.
    pub snapshot: &'a StageSnapshot,
    /// Active tool.
    pub tool: Tool,
    /// Current fit scale, used to size handle hit regions.
    pub scale: f64,
    /// Stage tunables.
    pub config: &'a StageConfig,
}

/// Pointer event router.
#[derive(Debug, Default)]
pub struct PointerRouter {
    state: DragState,
}

impl PointerRouter {
    /// Create an idle router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current interaction.
    #[must_use]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Handle one event whose position is already in content space.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is invalid when an interaction
    /// starts.
    pub fn handle(
        &mut self,
        event: &PointerEvent,
        ctx: &RouteContext<'_>,
        pointer: &mut PointerState,
        sink: &mut dyn CommandSink,
    ) -> StageResult<()> {
        let at = event.position;
        match event.kind {
            PointerEventKind::Enter => pointer.track(at),
            PointerEventKind::Leave => pointer.leave(),
            PointerEventKind::Cancel => self.abort("pointer cancelled"),
            PointerEventKind::Move => {
                pointer.track(at);
                self.drag_to(at, ctx);
            }
            PointerEventKind::Down => {
                pointer.track(at);
                if event.button != PointerButton::Primary {
                    return Ok(());
                }
                if !self.state.is_idle() {
                    self.commit(sink);
                }
                self.begin(at, ctx)?;
            }
            PointerEventKind::Up => {
                pointer.track(at);
                if event.button == PointerButton::Primary {
                    self.drag_to(at, ctx);
                    self.commit(sink);
                }
            }
        }
        Ok(())
    }

    /// Drop the current interaction without dispatching anything.
    pub fn abort(&mut self, reason: &str) {
        if !self.state.is_idle() {
            tracing::debug!("Aborting interaction on {:?}: {reason}", self.state.layer());
            self.state = DragState::Idle;
        }
    }

    /// Abort if the active tool changed underneath an interaction.
    pub fn tool_changed(&mut self, from: Tool, to: Tool) {
        if from != to {
            self.abort("tool switched");
        }
    }

    /// Abort if the targeted layer was removed or is no longer selected in
    /// `snapshot`.
    pub fn retain_target(&mut self, snapshot: &StageSnapshot) {
        let Some(layer) = self.state.layer() else {
            return;
        };
        if snapshot.layer(layer).is_none() {
            self.abort("target layer removed");
        } else if snapshot.selected_layer_id != Some(layer) {
            self.abort("target layer deselected");
        }
    }

    fn begin(&mut self, at: Point, ctx: &RouteContext<'_>) -> StageResult<()> {
        let Some(layer) = ctx.snapshot.selected_region()? else {
            return Ok(());
        };

        self.state = match ctx.tool {
            Tool::Brush | Tool::Eraser => {
                let mode = if ctx.tool == Tool::Eraser {
                    StrokeMode::Erase
                } else {
                    StrokeMode::Draw
                };
                let stroke = Stroke::new(
                    vec![at.delta_from(layer.position)],
                    layer.color,
                    ctx.snapshot.brush_size * 2.0,
                    mode,
                )?;
                DragState::Stroking {
                    layer: layer.id,
                    origin: layer.position,
                    stroke,
                }
            }
            Tool::Move => {
                let hit = layer.visible && layer.content_bounds().is_some_and(|b| b.contains(at));
                if !hit {
                    return Ok(());
                }
                DragState::Moving {
                    layer: layer.id,
                    grab: at,
                    start: layer.position,
                    pointer: at,
                }
            }
            Tool::Bbox => {
                let hit_size = if ctx.scale > 0.0 {
                    ctx.config.handle_size / ctx.scale
                } else {
                    ctx.config.handle_size
                };
                let Some(handle) = bbox::hit_test(&layer.bbox, at, hit_size) else {
                    return Ok(());
                };
                DragState::Resizing {
                    layer: layer.id,
                    handle,
                    origin: layer.bbox,
                    current: layer.bbox,
                }
            }
            Tool::None => return Ok(()),
        };
        tracing::trace!("Began {:?} on {}", ctx.tool, layer.id);
        Ok(())
    }

    fn drag_to(&mut self, at: Point, ctx: &RouteContext<'_>) {
        match &mut self.state {
            DragState::Idle => {}
            DragState::Stroking { origin, stroke, .. } => {
                stroke.push_point(at.delta_from(*origin));
            }
            DragState::Moving { pointer, .. } => *pointer = at,
            DragState::Resizing {
                handle,
                origin,
                current,
                ..
            } => *current = bbox::resize(origin, *handle, at, ctx.config.min_bbox_size),
        }
    }

    fn commit(&mut self, sink: &mut dyn CommandSink) {
        match std::mem::take(&mut self.state) {
            DragState::Idle => {}
            DragState::Stroking { layer, stroke, .. } => {
                tracing::debug!("Committing {}-point stroke on {layer}", stroke.points().len());
                sink.dispatch(StageCommand::StrokeAdded {
                    layer_id: layer,
                    stroke,
                });
            }
            DragState::Moving {
                layer,
                grab,
                start,
                pointer,
            } => {
                if pointer != grab {
                    let end = start.offset(pointer.delta_from(grab));
                    tracing::debug!("Committing move of {layer} to ({}, {})", end.x, end.y);
                    sink.dispatch(StageCommand::LayerTranslated {
                        layer_id: layer,
                        x: end.x,
                        y: end.y,
                    });
                }
            }
            DragState::Resizing {
                layer,
                origin,
                current,
                ..
            } => {
                if current != origin {
                    tracing::debug!("Committing bbox of {layer}: {current:?}");
                    sink.dispatch(StageCommand::LayerBboxChanged {
                        layer_id: layer,
                        bbox: current,
                    });
                }
            }
        }
    }
}
