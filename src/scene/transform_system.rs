//! Transform System
//!
//! World-matrix propagation for the scene graph, decoupled from [`Scene`] so
//! it only borrows the node map and a root list.
//!
//! [`Scene`]: crate::scene::Scene

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::node::Node;
use crate::scene::NodeHandle;

/// One node waiting for its world matrix.
struct Pending {
    node: NodeHandle,
    parent_world: Affine3A,
    parent_moved: bool,
}

/// Updates world matrices for every tree under `roots`.
///
/// Walks with an explicit stack, so hierarchy depth is bounded by memory
/// rather than the call stack. A node is recomputed only when its own TRS
/// or some ancestor's changed.
pub fn update_hierarchy_iterative(nodes: &mut SlotMap<NodeHandle, Node>, roots: &[NodeHandle]) {
    let stack = roots
        .iter()
        .rev()
        .map(|&node| Pending {
            node,
            parent_world: Affine3A::IDENTITY,
            parent_moved: false,
        })
        .collect();
    propagate(nodes, stack);
}

/// Recomputes `root` and all of its descendants unconditionally, starting
/// from the parent's current world matrix.
pub fn update_subtree(nodes: &mut SlotMap<NodeHandle, Node>, root: NodeHandle) {
    let Some(node) = nodes.get(root) else {
        return;
    };
    let parent_world = node
        .parent
        .and_then(|p| nodes.get(p))
        .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix);

    propagate(
        nodes,
        vec![Pending {
            node: root,
            parent_world,
            parent_moved: true,
        }],
    );
}

fn propagate(nodes: &mut SlotMap<NodeHandle, Node>, mut stack: Vec<Pending>) {
    while let Some(Pending {
        node,
        parent_world,
        parent_moved,
    }) = stack.pop()
    {
        let Some(node) = nodes.get_mut(node) else {
            continue;
        };

        let moved = node.transform.update_local_matrix() || parent_moved;
        if moved {
            node.transform.world_matrix = parent_world * node.transform.local_matrix;
        }

        let world = node.transform.world_matrix;
        stack.extend(node.children.iter().rev().map(|&child| Pending {
            node: child,
            parent_world: world,
            parent_moved: moved,
        }));
    }
}
