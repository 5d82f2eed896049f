//! Durable commands produced for the external state owner.

use serde::{Deserialize, Serialize};

use crate::{LayerId, Rect, Stroke};

/// A durable state change requested by the stage.
///
/// Commands are only produced when a pointer interaction commits; nothing is
/// dispatched while a drag is in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StageCommand {
    /// A layer was dragged to a new position.
    LayerTranslated {
        /// The moved layer.
        layer_id: LayerId,
        /// Final x position.
        x: f64,
        /// Final y position.
        y: f64,
    },
    /// A layer's bounding box was resized.
    LayerBboxChanged {
        /// The resized layer.
        layer_id: LayerId,
        /// Final rectangle.
        bbox: Rect,
    },
    /// A stroke was completed on a layer.
    StrokeAdded {
        /// The painted layer.
        layer_id: LayerId,
        /// The stroke, in layer-local coordinates.
        stroke: Stroke,
    },
}

impl StageCommand {
    /// The layer this command targets.
    #[must_use]
    pub fn layer_id(&self) -> LayerId {
        match self {
            Self::LayerTranslated { layer_id, .. }
            | Self::LayerBboxChanged { layer_id, .. }
            | Self::StrokeAdded { layer_id, .. } => *layer_id,
        }
    }
}

/// Receiver of durable commands.
pub trait CommandSink {
    /// Deliver one command.
    fn dispatch(&mut self, command: StageCommand);
}

impl CommandSink for Vec<StageCommand> {
    fn dispatch(&mut self, command: StageCommand) {
        self.push(command);
    }
}

/// Adapts a closure into a [`CommandSink`].
pub struct CallbackSink<F>(pub F);

impl<F: FnMut(StageCommand)> CommandSink for CallbackSink<F> {
    fn dispatch(&mut self, command: StageCommand) {
        (self.0)(command);
    }
}
