//! # Regional Stage Core
//!
//! Synchronization engine between application state and a retained-mode
//! scene graph for a regional-prompting canvas. Compiles to WASM.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  stage-core                      │
//! ├──────────────────────────────────────────────────┤
//! │  SnapshotStore ──► Viewport                      │
//! │  - Snapshots      │ - fit      │ - layers        │
//! │  - Commands       │ - bbox     │ - brush preview │
//! ├──────────────────────────────────────────────────┤
//! │  PointerRouter     │  Session                    │
//! │  - Drag state      │  - Tool, cursor             │
//! │  - Commit / abort  │  - Surface registry         │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! State flows one way: snapshot → passes → scene graph. Pointer input flows
//! back only as durable [`StageCommand`]s, which the host applies and
//! publishes as the next snapshot.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bbox;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod host;
pub mod layer;
pub mod preview;
pub mod reconcile;
pub mod router;
pub mod scale;
pub mod scene;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod surface;
pub mod viewport;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use bbox::{BboxEditor, ResizeHandle};
pub use command::{CallbackSink, CommandSink, StageCommand};
pub use config::StageConfig;
pub use error::{StageError, StageResult};
pub use event::{PointerButton, PointerEvent, PointerEventKind};
pub use geometry::{Point, Rect};
pub use host::{ElementHandle, HeadlessElement, HostElement, ListenerId, ObserverId};
pub use layer::{Layer, LayerId, LayerKind, Rgb, Stroke, StrokeMode};
pub use preview::BrushPreview;
pub use reconcile::{LayerPassInput, LayerReconciler, ReconcileReport};
pub use router::{DragState, PointerRouter, RouteContext};
pub use scale::compute_fit_scale;
pub use scene::{Node, NodeId, NodeKind, Rgba, SceneGraph};
pub use session::{PointerState, Session, SessionState, Tool};
pub use snapshot::StageSnapshot;
pub use store::{SnapshotStore, SubscriptionId};
pub use surface::{Surface, SurfaceId, SurfaceRegistry};
pub use viewport::Viewport;

/// Stage core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
