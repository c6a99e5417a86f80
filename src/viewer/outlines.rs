use log::debug;
use rustc_hash::FxHashMap;

use crate::resources::{LineMaterial, LineSegments};
use crate::scene::{Node, NodeHandle, NodeKind, Scene};
use crate::settings::{hex_to_rgb, OutlineSettings};

/// Per-mesh feature-edge overlays.
///
/// An overlay is a child of its mesh so it follows the part as it moves.
/// It is built the first time outlines are switched on for that mesh and
/// only shown or hidden afterwards.
#[derive(Debug, Clone, Default)]
pub struct OutlineOverlays {
    overlays: FxHashMap<NodeHandle, NodeHandle>,
}

impl OutlineOverlays {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of overlays built so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    #[must_use]
    pub fn overlay_for(&self, mesh: NodeHandle) -> Option<NodeHandle> {
        self.overlays.get(&mesh).copied()
    }

    /// Forgets overlays whose meshes went away with a previous model.
    pub fn prune(&mut self, scene: &Scene) {
        self.overlays
            .retain(|mesh, overlay| scene.get_node(*mesh).is_some() && scene.get_node(*overlay).is_some());
    }

    /// Shows or hides the overlay of every mesh under `model_root`, building
    /// missing ones when `show` is set.
    pub fn sync(&mut self, scene: &mut Scene, model_root: NodeHandle, show: bool, settings: &OutlineSettings) {
        self.prune(scene);

        let meshes: Vec<NodeHandle> = scene.meshes_under(model_root).collect();
        let mut built = 0usize;
        for mesh in meshes {
            let overlay = match self.overlays.get(&mesh) {
                Some(&overlay) => overlay,
                None if show => {
                    let Some(segments) = scene
                        .get_node(mesh)
                        .and_then(Node::mesh)
                        .map(|m| m.geometry.feature_edges(settings.threshold_degrees))
                    else {
                        continue;
                    };
                    let material = LineMaterial::new(hex_to_rgb(settings.color), settings.opacity);
                    let node = Node::with_kind(
                        "outline",
                        NodeKind::Outline(LineSegments::new(segments, material)),
                    );
                    let overlay = scene.add_to_parent(node, mesh);
                    self.overlays.insert(mesh, overlay);
                    built += 1;
                    overlay
                }
                None => continue,
            };
            if let Some(node) = scene.get_node_mut(overlay) {
                node.visible = show;
            }
        }

        if built > 0 {
            debug!("Built {built} outline overlays");
            scene.update_subtree(model_root);
        }
    }
}
