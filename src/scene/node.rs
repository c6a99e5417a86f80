use glam::Affine3A;

use crate::resources::mesh::{LineSegments, Mesh};
use crate::scene::light::{GridHelper, Light};
use crate::scene::transform::Transform;
use crate::scene::NodeHandle;

/// What a node carries besides its transform.
///
/// Renderability is a tag on the node, not a runtime property probe: only
/// [`NodeKind::Mesh`] nodes are candidates for part binding and picking.
#[derive(Debug, Clone, Default)]
pub enum NodeKind {
    /// Pure transform/grouping node.
    #[default]
    Group,
    /// Renderable triangle mesh.
    Mesh(Mesh),
    /// Edge overlay; rendered but never picked.
    Outline(LineSegments),
    Light(Light),
    Grid(GridHelper),
}

/// A scene node.
///
/// # Hierarchy
///
/// Nodes form a tree through parent-child relationships:
/// - `parent`: handle to the parent node (None for root nodes); used only for
///   upward traversal, the scene owns every node
/// - `children`: child node handles
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,

    // === Core Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    // === Core Spatial Data ===
    pub transform: Transform,

    pub visible: bool,
    pub kind: NodeKind,
}

impl Node {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            kind: NodeKind::Group,
        }
    }

    #[must_use]
    pub fn with_kind(name: &str, kind: NodeKind) -> Self {
        Self {
            kind,
            ..Self::new(name)
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }

    #[inline]
    #[must_use]
    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh(_))
    }

    #[inline]
    #[must_use]
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    #[inline]
    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("")
    }
}
