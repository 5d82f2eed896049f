//! Scene graph surfaces and their per-container registry.

use std::collections::HashMap;

use serde::Serialize;

use crate::{ElementHandle, NodeId, NodeKind, Point, SceneGraph, StageResult};

/// Identity of one surface instance; a re-acquired surface gets a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SurfaceId(u64);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// The root drawing surface bound to one container element.
///
/// The root group holds three subtrees in z-order: layers, the bounding-box
/// editor and the brush preview. Each subtree is written by exactly one pass.
#[derive(Debug, Clone, Serialize)]
pub struct Surface {
    id: SurfaceId,
    container: ElementHandle,
    scene: SceneGraph,
    layers_group: NodeId,
    bbox_group: NodeId,
    preview_group: NodeId,
    width: f64,
    height: f64,
    scale: f64,
}

impl Surface {
    fn new(id: SurfaceId, container: ElementHandle) -> StageResult<Self> {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let layers_group = scene.create(root, NodeKind::Group, "layers")?;
        let bbox_group = scene.create(root, NodeKind::Group, "bbox")?;
        let preview_group = scene.create(root, NodeKind::Group, "preview")?;
        Ok(Self {
            id,
            container,
            scene,
            layers_group,
            bbox_group,
            preview_group,
            width: 0.0,
            height: 0.0,
            scale: 1.0,
        })
    }

    /// Surface identity.
    #[must_use]
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Container this surface is mounted into.
    #[must_use]
    pub fn container(&self) -> ElementHandle {
        self.container
    }

    /// The scene graph.
    #[must_use]
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// The scene graph, mutably.
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// Group owned by the layer reconciler.
    #[must_use]
    pub fn layers_group(&self) -> NodeId {
        self.layers_group
    }

    /// Group owned by the bounding-box editor.
    #[must_use]
    pub fn bbox_group(&self) -> NodeId {
        self.bbox_group
    }

    /// Group owned by the brush preview.
    #[must_use]
    pub fn preview_group(&self) -> NodeId {
        self.preview_group
    }

    /// Displayed size in physical pixels.
    #[must_use]
    pub fn display_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Content-to-physical scale factor (same on both axes).
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Apply a fitted size: display size becomes `content * scale` and the
    /// internal coordinate scale becomes `scale`.
    pub fn apply_fit(&mut self, content_width: f64, content_height: f64, scale: f64) {
        self.width = content_width * scale;
        self.height = content_height * scale;
        self.scale = scale;
    }

    /// Convert a physical position on the surface into content space.
    ///
    /// A degenerate (zero) scale maps everything to the origin.
    #[must_use]
    pub fn to_content(&self, physical: Point) -> Point {
        if self.scale > 0.0 {
            physical.scale(1.0 / self.scale)
        } else {
            Point::ZERO
        }
    }
}

/// Live surfaces, at most one per container.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    surfaces: HashMap<ElementHandle, Surface>,
    next_id: u64,
    created: u64,
    destroyed: u64,
}

impl SurfaceRegistry {
    /// Create a surface for `container`, destroying any surface already bound
    /// to it.
    ///
    /// # Errors
    ///
    /// Propagates scene graph failures while building the root tree.
    pub fn acquire(&mut self, container: ElementHandle) -> StageResult<&mut Surface> {
        self.release(container);
        self.next_id += 1;
        let surface = Surface::new(SurfaceId(self.next_id), container)?;
        tracing::debug!("Acquired {} for {container}", surface.id());
        self.created += 1;
        Ok(self.surfaces.entry(container).or_insert(surface))
    }

    /// Destroy the surface bound to `container`, if any.
    ///
    /// Returns whether a surface was destroyed.
    pub fn release(&mut self, container: ElementHandle) -> bool {
        match self.surfaces.remove(&container) {
            Some(surface) => {
                tracing::debug!("Released {} for {container}", surface.id());
                self.destroyed += 1;
                true
            }
            None => false,
        }
    }

    /// The live surface for `container`.
    #[must_use]
    pub fn get(&self, container: ElementHandle) -> Option<&Surface> {
        self.surfaces.get(&container)
    }

    /// The live surface for `container`, mutably.
    pub fn get_mut(&mut self, container: ElementHandle) -> Option<&mut Surface> {
        self.surfaces.get_mut(&container)
    }

    /// Number of live surfaces.
    #[must_use]
    pub fn live(&self) -> usize {
        self.surfaces.len()
    }

    /// Total surfaces created over the registry's lifetime.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Total surfaces destroyed over the registry's lifetime.
    #[must_use]
    pub fn destroyed(&self) -> u64 {
        self.destroyed
    }
}
