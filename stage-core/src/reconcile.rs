//! Layer reconciler.
//!
//! Keeps one scene group per layer, keyed by layer id, in list order. Each
//! pass is a three-way diff: groups for vanished ids are removed, groups for
//! new ids are created, and every other group is updated in place so that
//! node-local state (drag offsets, attributes) survives.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::{
    Layer, LayerId, LayerKind, NodeId, NodeKind, Point, StageError, StageResult, Stroke, Surface,
    Tool,
};

/// What one layer pass reads.
#[derive(Debug, Clone, Copy)]
pub struct LayerPassInput<'a> {
    /// Layers in z-order.
    pub layers: &'a [Layer],
    /// Selected layer.
    pub selected: Option<LayerId>,
    /// Opacity multiplier for region layers.
    pub prompt_layer_opacity: f64,
    /// Active tool.
    pub tool: Tool,
}

/// Counts from one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Groups created for new layers.
    pub created: usize,
    /// Groups updated in place.
    pub updated: usize,
    /// Groups removed for vanished layers.
    pub removed: usize,
}

#[derive(Debug)]
struct LayerNodes {
    group: NodeId,
    strokes: Vec<NodeId>,
    pending: Option<NodeId>,
}

/// Layer reconciler pass.
#[derive(Debug, Default)]
pub struct LayerReconciler {
    nodes: HashMap<LayerId, LayerNodes>,
}

impl LayerReconciler {
    /// Create a reconciler with no nodes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget node ids after the surface was replaced.
    pub fn reset(&mut self) {
        self.nodes.clear();
    }

    /// Group node for `layer`, if reconciled.
    #[must_use]
    pub fn node_for(&self, layer: LayerId) -> Option<NodeId> {
        self.nodes.get(&layer).map(|n| n.group)
    }

    /// Number of layers with nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no layer has nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bring the layers subtree in line with `input`.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::DuplicateLayer`] if an id appears twice, or
    /// [`StageError::NodeNotFound`] if a node this reconciler created has
    /// been removed behind its back.
    pub fn reconcile(
        &mut self,
        surface: &mut Surface,
        input: &LayerPassInput<'_>,
    ) -> StageResult<ReconcileReport> {
        let mut desired = HashSet::with_capacity(input.layers.len());
        for layer in input.layers {
            if !desired.insert(layer.id) {
                tracing::error!("Layer {} appears more than once", layer.id);
                return Err(StageError::DuplicateLayer(layer.id));
            }
        }

        let mut report = ReconcileReport::default();
        let group = surface.layers_group();
        let scene = surface.scene_mut();

        let stale: Vec<LayerId> = self
            .nodes
            .keys()
            .filter(|id| !desired.contains(id))
            .copied()
            .collect();
        for id in stale {
            if let Some(nodes) = self.nodes.remove(&id) {
                scene.remove(nodes.group)?;
                report.removed += 1;
            }
        }

        for (index, layer) in input.layers.iter().enumerate() {
            let nodes = match self.nodes.entry(layer.id) {
                Entry::Occupied(entry) => {
                    report.updated += 1;
                    entry.into_mut()
                }
                Entry::Vacant(entry) => {
                    let id = scene.create(group, NodeKind::Group, &format!("layer-{}", layer.id))?;
                    report.created += 1;
                    entry.insert(LayerNodes {
                        group: id,
                        strokes: Vec::new(),
                        pending: None,
                    })
                }
            };
            scene.move_child(group, nodes.group, index)?;

            let opacity = match layer.kind {
                LayerKind::RegionalGuidance => layer.opacity * input.prompt_layer_opacity,
                LayerKind::Raster | LayerKind::ControlAdapter => layer.opacity,
            };
            let node = scene.node_mut(nodes.group)?;
            node.position = layer.position;
            node.opacity = opacity.clamp(0.0, 1.0);
            node.visible = layer.visible;
            node.draggable = input.tool == Tool::Move && input.selected == Some(layer.id);

            for (i, stroke) in layer.strokes.iter().enumerate() {
                let existing = nodes.strokes.get(i).copied();
                let id = scene.upsert(nodes.group, existing, line_kind(stroke), "stroke")?;
                if existing.is_none() {
                    nodes.strokes.push(id);
                }
            }
            for surplus in nodes.strokes.drain(layer.strokes.len()..) {
                scene.remove(surplus)?;
            }
            if let Some(pending) = nodes.pending {
                scene.move_child(nodes.group, pending, usize::MAX)?;
            }
        }

        tracing::trace!(
            "Reconciled layers: {} created, {} updated, {} removed",
            report.created,
            report.updated,
            report.removed
        );
        Ok(report)
    }

    /// Draw the in-progress stroke on top of `layer`'s strokes.
    ///
    /// No-op if the layer has no nodes yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer's group has gone missing.
    pub fn render_pending(
        &mut self,
        surface: &mut Surface,
        layer: LayerId,
        stroke: &Stroke,
    ) -> StageResult<()> {
        let Some(nodes) = self.nodes.get_mut(&layer) else {
            return Ok(());
        };
        let id = surface
            .scene_mut()
            .upsert(nodes.group, nodes.pending, line_kind(stroke), "pending-stroke")?;
        nodes.pending = Some(id);
        Ok(())
    }

    /// Remove in-progress stroke nodes from every layer except `keep`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pending node has gone missing.
    pub fn clear_pending(
        &mut self,
        surface: &mut Surface,
        keep: Option<LayerId>,
    ) -> StageResult<()> {
        for (layer, nodes) in &mut self.nodes {
            if Some(*layer) == keep {
                continue;
            }
            if let Some(id) = nodes.pending.take() {
                surface.scene_mut().remove(id)?;
            }
        }
        Ok(())
    }

    /// Set the transient drag offset of `layer`'s group.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer's group has gone missing.
    pub fn set_drag_offset(
        &mut self,
        surface: &mut Surface,
        layer: LayerId,
        offset: Point,
    ) -> StageResult<()> {
        if let Some(nodes) = self.nodes.get(&layer) {
            surface.scene_mut().node_mut(nodes.group)?.drag_offset = offset;
        }
        Ok(())
    }

    /// Reset every group's drag offset to zero. Durable state, not the node,
    /// owns the position once a drag ends.
    ///
    /// # Errors
    ///
    /// Returns an error if a group has gone missing.
    pub fn reset_drag_offsets(&mut self, surface: &mut Surface) -> StageResult<()> {
        for nodes in self.nodes.values() {
            surface.scene_mut().node_mut(nodes.group)?.drag_offset = Point::ZERO;
        }
        Ok(())
    }
}

fn line_kind(stroke: &Stroke) -> NodeKind {
    NodeKind::Line {
        points: stroke.points().to_vec(),
        color: stroke.color.with_alpha(1.0),
        width: stroke.width,
        mode: stroke.mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementHandle, Rect, Rgb, StrokeMode, SurfaceRegistry};

    fn layer() -> Layer {
        Layer::region(Rect::new(0.0, 0.0, 64.0, 64.0), Rgb::new(200, 10, 10))
    }

    fn stroke(n: usize) -> Stroke {
        #[allow(clippy::cast_precision_loss)]
        let points = (0..n).map(|i| Point::new(i as f64, 0.0)).collect();
        Stroke::new(points, Rgb::new(200, 10, 10), 4.0, StrokeMode::Draw).expect("stroke")
    }

    fn input(layers: &[Layer]) -> LayerPassInput<'_> {
        LayerPassInput {
            layers,
            selected: None,
            prompt_layer_opacity: 0.5,
            tool: Tool::None,
        }
    }

    #[test]
    fn test_three_way_diff_counts() {
        let mut registry = SurfaceRegistry::default();
        let surface = registry.acquire(ElementHandle::next()).expect("acquire");
        let mut reconciler = LayerReconciler::new();

        let (a, b, c) = (layer(), layer(), layer());
        let report = reconciler
            .reconcile(surface, &input(&[a.clone(), b.clone()]))
            .expect("first");
        assert_eq!(report, ReconcileReport { created: 2, updated: 0, removed: 0 });

        let report = reconciler
            .reconcile(surface, &input(&[b.clone(), c.clone()]))
            .expect("second");
        assert_eq!(report, ReconcileReport { created: 1, updated: 1, removed: 1 });
        assert!(reconciler.node_for(a.id).is_none());

        let order: Vec<_> = [b.id, c.id]
            .iter()
            .filter_map(|id| reconciler.node_for(*id))
            .collect();
        assert_eq!(surface.scene().children(surface.layers_group()), order.as_slice());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut registry = SurfaceRegistry::default();
        let surface = registry.acquire(ElementHandle::next()).expect("acquire");
        let a = layer();
        let result = LayerReconciler::new().reconcile(surface, &input(&[a.clone(), a]));
        assert!(matches!(result, Err(StageError::DuplicateLayer(_))));
    }

    #[test]
    fn test_stroke_children_follow_stroke_list() {
        let mut registry = SurfaceRegistry::default();
        let surface = registry.acquire(ElementHandle::next()).expect("acquire");
        let mut reconciler = LayerReconciler::new();

        let mut l = layer().with_stroke(stroke(2)).with_stroke(stroke(3));
        reconciler.reconcile(surface, &input(std::slice::from_ref(&l))).expect("pass");
        let group = reconciler.node_for(l.id).expect("group");
        let first_children = surface.scene().children(group).to_vec();
        assert_eq!(first_children.len(), 2);

        l.strokes.truncate(1);
        reconciler.reconcile(surface, &input(std::slice::from_ref(&l))).expect("pass");
        assert_eq!(surface.scene().children(group), &first_children[..1]);
    }

    #[test]
    fn test_opacity_applies_prompt_multiplier_to_regions_only() {
        let mut registry = SurfaceRegistry::default();
        let surface = registry.acquire(ElementHandle::next()).expect("acquire");
        let mut reconciler = LayerReconciler::new();

        let mut region = layer();
        region.opacity = 0.8;
        let mut raster = layer().with_kind(LayerKind::Raster);
        raster.opacity = 0.8;
        reconciler
            .reconcile(surface, &input(&[region.clone(), raster.clone()]))
            .expect("pass");

        let opacity = |id| {
            reconciler
                .node_for(id)
                .and_then(|n| surface.scene().get(n))
                .map(|n| n.opacity)
                .expect("node")
        };
        assert!((opacity(region.id) - 0.4).abs() < 1e-12);
        assert!((opacity(raster.id) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_only_selected_layer_draggable_under_move() {
        let mut registry = SurfaceRegistry::default();
        let surface = registry.acquire(ElementHandle::next()).expect("acquire");
        let mut reconciler = LayerReconciler::new();
        let (a, b) = (layer(), layer());
        let layers = [a.clone(), b.clone()];

        let draggable = |reconciler: &LayerReconciler, surface: &Surface, id| {
            reconciler
                .node_for(id)
                .and_then(|n| surface.scene().get(n))
                .is_some_and(|n| n.draggable)
        };

        let mut pass = input(&layers);
        pass.selected = Some(a.id);
        pass.tool = Tool::Move;
        reconciler.reconcile(surface, &pass).expect("pass");
        assert!(draggable(&reconciler, &*surface, a.id));
        assert!(!draggable(&reconciler, &*surface, b.id));

        pass.tool = Tool::Brush;
        reconciler.reconcile(surface, &pass).expect("pass");
        assert!(!draggable(&reconciler, &*surface, a.id));
    }

    #[test]
    fn test_pending_stroke_stays_on_top_and_clears() {
        let mut registry = SurfaceRegistry::default();
        let surface = registry.acquire(ElementHandle::next()).expect("acquire");
        let mut reconciler = LayerReconciler::new();
        let mut l = layer().with_stroke(stroke(2));
        reconciler.reconcile(surface, &input(std::slice::from_ref(&l))).expect("pass");
        let group = reconciler.node_for(l.id).expect("group");

        reconciler.render_pending(surface, l.id, &stroke(4)).expect("pending");
        l = l.with_stroke(stroke(5));
        reconciler.reconcile(surface, &input(std::slice::from_ref(&l))).expect("pass");

        let children = surface.scene().children(group).to_vec();
        assert_eq!(children.len(), 3);
        let last = surface.scene().get(children[2]).expect("last");
        assert_eq!(last.name, "pending-stroke");

        reconciler.clear_pending(surface, None).expect("clear");
        assert_eq!(surface.scene().children(group).len(), 2);
    }
}
