//! Error types for stage operations.

use thiserror::Error;

use crate::{LayerId, LayerKind, NodeId};

/// Result type for stage operations.
pub type StageResult<T> = Result<T, StageError>;

/// Errors that can occur in stage operations.
///
/// Every variant is a contract violation by the caller or the external state
/// owner. Expected absences (no surface mounted, nothing selected, cursor
/// outside the viewport) are never reported as errors.
#[derive(Debug, Error)]
pub enum StageError {
    /// The selection references a layer that is not in the layer list.
    #[error("Selected layer does not exist: {0}")]
    DanglingSelection(LayerId),

    /// The selection references a layer that is not a region layer.
    #[error("Selected layer {id} is a {kind:?} layer, expected a region layer")]
    SelectionNotRegion {
        /// The offending layer.
        id: LayerId,
        /// Its actual kind.
        kind: LayerKind,
    },

    /// The layer list contains the same id twice.
    #[error("Layer appears more than once: {0}")]
    DuplicateLayer(LayerId),

    /// A scene node the stage owns has gone missing from the graph.
    #[error("Scene node not found: {0}")]
    NodeNotFound(NodeId),

    /// A stroke was constructed without any points.
    #[error("Stroke must contain at least one point")]
    EmptyStroke,

    /// Configuration values are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Snapshot or command serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
