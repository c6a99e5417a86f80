use glam::Vec3;
use slotmap::SlotMap;

use crate::resources::geometry::BoundingBox;
use crate::scene::node::{Node, NodeKind};
use crate::scene::transform_system;
use crate::scene::NodeHandle;

/// Scene graph.
///
/// Owns every node in a slotmap; hierarchy is expressed through handles, so
/// removing a subtree never leaves dangling references behind in the map.
#[derive(Debug, Clone)]
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,
    /// Clear color (RGB).
    pub background: Vec3,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            background: Vec3::ZERO,
        }
    }

    // ========================================================================
    // Node creation & hierarchy
    // ========================================================================

    /// Adds a node at the root level.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    /// Inserts a detached node (neither root nor child) for later `attach`.
    pub fn create_node_with_name(&mut self, name: &str) -> NodeHandle {
        self.nodes.insert(Node::new(name))
    }

    pub fn add_to_parent(&mut self, mut child: Node, parent: NodeHandle) -> NodeHandle {
        child.parent = None;
        let handle = self.nodes.insert(child);
        self.attach(handle, parent);
        handle
    }

    /// Re-parents `child` under `parent`, detaching it from wherever it was.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent {
            log::warn!("Cannot attach node to itself");
            return;
        }
        if !self.nodes.contains_key(parent) {
            log::error!("Parent node not found during attach");
            return;
        }
        if self.ancestors(parent).any(|a| a == child) {
            log::warn!("Refusing to attach a node under its own descendant");
            return;
        }

        self.detach(child);

        self.nodes[parent].children.push(child);
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.mark_dirty();
        }
    }

    /// Unlinks `handle` from its parent (or the root list) without removing it.
    pub fn detach(&mut self, handle: NodeHandle) {
        let old_parent = self.nodes.get(handle).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(parent) = self.nodes.get_mut(p) {
                parent.children.retain(|&x| x != handle);
            }
        } else {
            self.root_nodes.retain(|&x| x != handle);
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            node.parent = None;
            node.transform.mark_dirty();
        }
    }

    /// Removes a node and its whole subtree.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        if !self.nodes.contains_key(handle) {
            return;
        }
        let subtree: Vec<NodeHandle> = self.descendants(handle).collect();
        self.detach(handle);
        for h in subtree {
            self.nodes.remove(h);
        }
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[inline]
    #[must_use]
    pub fn get_name(&self, handle: NodeHandle) -> Option<&str> {
        self.nodes.get(handle).map(|n| n.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Depth-first search from the roots for the first node named `name`.
    #[must_use]
    pub fn get_node_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.root_nodes
            .iter()
            .flat_map(|&root| self.descendants(root))
            .find(|&h| self.nodes[h].name == name)
    }

    /// Pre-order walk of `root` and everything below it.
    pub fn descendants(&self, root: NodeHandle) -> Descendants<'_> {
        let stack = if self.nodes.contains_key(root) {
            vec![root]
        } else {
            Vec::new()
        };
        Descendants { scene: self, stack }
    }

    /// Walks parent links upward, starting at `handle` itself.
    pub fn ancestors(&self, handle: NodeHandle) -> Ancestors<'_> {
        Ancestors {
            scene: self,
            next: self.nodes.contains_key(handle).then_some(handle),
        }
    }

    /// Mesh nodes in the subtree of `root`, in pre-order.
    pub fn meshes_under(&self, root: NodeHandle) -> impl Iterator<Item = NodeHandle> + '_ {
        self.descendants(root).filter(|&h| self.nodes[h].is_mesh())
    }

    // ========================================================================
    // Matrices & bounds
    // ========================================================================

    /// Updates world matrices for the whole scene. Call once per frame
    /// before reading world transforms.
    pub fn update_matrix_world(&mut self) {
        transform_system::update_hierarchy_iterative(&mut self.nodes, &self.root_nodes);
    }

    /// Forces a world-matrix refresh of one subtree.
    pub fn update_subtree(&mut self, root: NodeHandle) {
        transform_system::update_subtree(&mut self.nodes, root);
    }

    /// World-space bounds of every mesh under `root`, using the current
    /// world matrices.
    #[must_use]
    pub fn world_bounds(&self, root: NodeHandle) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        for handle in self.meshes_under(root) {
            let node = &self.nodes[handle];
            if let NodeKind::Mesh(mesh) = &node.kind {
                let local = mesh.geometry.bounding_box();
                bounds = bounds.union(&local.transform(node.world_matrix()));
            }
        }
        bounds
    }
}

/// Iterator returned by [`Scene::descendants`].
pub struct Descendants<'a> {
    scene: &'a Scene,
    stack: Vec<NodeHandle>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        let handle = self.stack.pop()?;
        if let Some(node) = self.scene.nodes.get(handle) {
            self.stack.extend(node.children.iter().rev().copied());
        }
        Some(handle)
    }
}

/// Iterator returned by [`Scene::ancestors`].
pub struct Ancestors<'a> {
    scene: &'a Scene,
    next: Option<NodeHandle>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        let current = self.next?;
        self.next = self.scene.nodes.get(current).and_then(|n| n.parent);
        Some(current)
    }
}
