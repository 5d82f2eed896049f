//! Retained-mode scene graph.
//!
//! A tree of drawable nodes owned by a [`Surface`](crate::Surface). The graph
//! is mutated in place by the stage passes; node identity is stable for as
//! long as a node is not removed, so node-local state (drag offsets, markers)
//! survives across passes.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{Point, Rect, StageError, StageResult, StrokeMode};

/// Identifier of a node within one scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// A color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha in `[0, 1]`.
    pub a: f64,
}

impl Rgba {
    /// CSS `rgba(...)` form.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// What a node draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum NodeKind {
    /// A container for other nodes.
    Group,
    /// An open poly-line.
    Line {
        /// Points in the parent's coordinate space.
        points: Vec<Point>,
        /// Stroke color.
        color: Rgba,
        /// Stroke width.
        width: f64,
        /// Composite mode.
        mode: StrokeMode,
    },
    /// A circle.
    Circle {
        /// Centre.
        center: Point,
        /// Radius.
        radius: f64,
        /// Fill color, if filled.
        fill: Option<Rgba>,
        /// Outline color, if outlined.
        stroke: Option<Rgba>,
        /// Outline width.
        stroke_width: f64,
    },
    /// An axis-aligned rectangle.
    Rect {
        /// Geometry.
        rect: Rect,
        /// Fill color, if filled.
        fill: Option<Rgba>,
        /// Outline color, if outlined.
        stroke: Option<Rgba>,
        /// Outline width.
        stroke_width: f64,
    },
}

/// A node in the scene graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Identifier.
    pub id: NodeId,
    /// Content.
    pub kind: NodeKind,
    /// Human-readable name, used for debugging and lookups.
    pub name: String,
    /// Translation relative to the parent.
    pub position: Point,
    /// Transient translation added on top of `position` while dragging.
    pub drag_offset: Point,
    /// Opacity multiplier in `[0, 1]`.
    pub opacity: f64,
    /// Whether the node (and its subtree) is drawn.
    pub visible: bool,
    /// Whether the node accepts drags.
    pub draggable: bool,
    /// Pointer cursor shown while hovering the node.
    pub cursor: Option<String>,
    /// Free-form attributes.
    pub attrs: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(id: NodeId, kind: NodeKind, name: &str, parent: Option<NodeId>) -> Self {
        Self {
            id,
            kind,
            name: name.to_string(),
            position: Point::ZERO,
            drag_offset: Point::ZERO,
            opacity: 1.0,
            visible: true,
            draggable: false,
            cursor: None,
            attrs: BTreeMap::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// Parent node, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in z-order (first is drawn first).
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Effective translation: `position + drag_offset`.
    #[must_use]
    pub fn translation(&self) -> Point {
        self.position.offset(self.drag_offset)
    }

    /// Set a free-form attribute.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        self.attrs.insert(key.to_string(), value.to_string());
    }

    /// Read a free-form attribute.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

/// A tree of nodes with a single root group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
}

impl SceneGraph {
    /// Create a graph containing only a root group.
    #[must_use]
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new(root, NodeKind::Group, "root", None));
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    /// The root group.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append a new node as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::NodeNotFound`] if `parent` does not exist.
    pub fn create(&mut self, parent: NodeId, kind: NodeKind, name: &str) -> StageResult<NodeId> {
        let id = NodeId(self.next_id);
        self.nodes
            .get_mut(&parent)
            .ok_or(StageError::NodeNotFound(parent))?
            .children
            .push(id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(id, kind, name, Some(parent)));
        Ok(id)
    }

    /// Update the content of `existing`, or create a new child of `parent`
    /// with `kind` when there is no existing node.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::NodeNotFound`] if `existing` names a node that
    /// is no longer in the graph, or `parent` does not exist.
    pub fn upsert(
        &mut self,
        parent: NodeId,
        existing: Option<NodeId>,
        kind: NodeKind,
        name: &str,
    ) -> StageResult<NodeId> {
        match existing {
            Some(id) => {
                self.node_mut(id)?.kind = kind;
                Ok(id)
            }
            None => self.create(parent, kind, name),
        }
    }

    /// Remove a node and its whole subtree. The root cannot be removed.
    ///
    /// Returns the number of nodes removed.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::NodeNotFound`] if `id` does not exist or is the
    /// root.
    pub fn remove(&mut self, id: NodeId) -> StageResult<usize> {
        let parent = self
            .nodes
            .get(&id)
            .and_then(Node::parent)
            .ok_or(StageError::NodeNotFound(id))?;
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.retain(|&child| child != id);
        }

        let mut removed = 0;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                pending.extend(node.children);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Remove every child of `parent`, keeping `parent` itself.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::NodeNotFound`] if `parent` does not exist.
    pub fn clear_children(&mut self, parent: NodeId) -> StageResult<usize> {
        let children = self
            .nodes
            .get(&parent)
            .ok_or(StageError::NodeNotFound(parent))?
            .children
            .clone();
        let mut removed = 0;
        for child in children {
            removed += self.remove(child)?;
        }
        Ok(removed)
    }

    /// Move `child` to `index` among its siblings, clamping to the last slot.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::NodeNotFound`] if `child` is not a child of
    /// `parent`.
    pub fn move_child(&mut self, parent: NodeId, child: NodeId, index: usize) -> StageResult<()> {
        let siblings = &mut self
            .nodes
            .get_mut(&parent)
            .ok_or(StageError::NodeNotFound(parent))?
            .children;
        let current = siblings
            .iter()
            .position(|&c| c == child)
            .ok_or(StageError::NodeNotFound(child))?;
        let target = index.min(siblings.len() - 1);
        if current != target {
            let node = siblings.remove(current);
            siblings.insert(target, node);
        }
        Ok(())
    }

    /// Get a node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Get a node mutably, treating absence as a broken invariant.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::NodeNotFound`] if `id` does not exist.
    pub fn node_mut(&mut self, id: NodeId) -> StageResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(StageError::NodeNotFound(id))
    }

    /// Children of `id` in z-order; empty if `id` does not exist.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(&id) {
            Some(node) => node.children(),
            None => &[],
        }
    }

    /// Whether `id` is in the graph.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds nothing but its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
