//! Highlighting the selected part and resolving clicks to parts.

use glam::{Vec2, Vec3};
use log::debug;
use rustc_hash::FxHashSet;

use crate::resources::Ray;
use crate::scene::{Camera, NodeHandle, NodeKind, Scene};
use crate::settings::{hex_to_rgb, HighlightSettings};
use crate::viewer::parts::{PartRecord, SelectionKey};
use crate::viewer::resolver::PartResolver;

/// The render surface's bounding rectangle in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    #[must_use]
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Client point → normalized device coordinates (y up). `None` for an
    /// empty rectangle.
    #[must_use]
    pub fn to_ndc(&self, client: Vec2) -> Option<Vec2> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            (client.x - self.left) / self.width * 2.0 - 1.0,
            -((client.y - self.top) / self.height) * 2.0 + 1.0,
        ))
    }
}

/// Clears every click target's emissive, then lights up the meshes of the
/// part `key` names. Returns the highlighted logical node, if any.
pub fn apply_highlight(
    scene: &mut Scene,
    resolver: &PartResolver,
    records: &[PartRecord],
    key: Option<&SelectionKey>,
    settings: &HighlightSettings,
) -> Option<NodeHandle> {
    for &mesh in resolver.click_targets() {
        if let Some(m) = scene.get_node_mut(mesh).and_then(|n| n.mesh_mut()) {
            m.material.clear_emissive();
        }
    }

    let (record, part) = resolver.find_record(records, key?)?;
    let node = part?.node;
    debug!("Highlighting part '{}'", record.mesh_name);

    let color = hex_to_rgb(settings.color);
    let meshes: Vec<NodeHandle> = scene.meshes_under(node).collect();
    for handle in meshes {
        if let Some(m) = scene.get_node_mut(handle).and_then(|n| n.mesh_mut()) {
            m.material.set_emissive(color, settings.intensity);
        }
    }
    Some(node)
}

/// The nearest mesh a pick ray hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub mesh: NodeHandle,
    pub distance: f32,
    pub point: Vec3,
}

/// Casts a ray through `ndc` against every click target and the meshes
/// beneath them. Outline overlays are never candidates.
#[must_use]
pub fn raycast_targets(scene: &Scene, camera: &Camera, resolver: &PartResolver, ndc: Vec2) -> Option<PickHit> {
    let ray = camera.ray_from_ndc(ndc);

    let mut seen = FxHashSet::default();
    let mut nearest: Option<PickHit> = None;

    for &target in resolver.click_targets() {
        for handle in scene.meshes_under(target) {
            if !seen.insert(handle) {
                continue;
            }
            if let Some(hit) = intersect_mesh(scene, handle, &ray) {
                if nearest.is_none_or(|n| hit.distance < n.distance) {
                    nearest = Some(hit);
                }
            }
        }
    }
    nearest
}

fn intersect_mesh(scene: &Scene, handle: NodeHandle, ray: &Ray) -> Option<PickHit> {
    let node = scene.get_node(handle)?;
    let NodeKind::Mesh(mesh) = &node.kind else {
        return None;
    };
    let world = *node.world_matrix();
    if world.matrix3.determinant().abs() <= f32::EPSILON {
        return None;
    }
    let local_ray = ray.transformed(&world.inverse());
    let t = mesh.geometry.raycast(&local_ray)?;
    let point = world.transform_point3(local_ray.at(t));
    Some(PickHit {
        mesh: handle,
        distance: point.distance(ray.origin),
        point,
    })
}

/// Resolves a click to the part record bound to the nearest hit mesh.
/// A miss, or a hit on something unbound, is `None`.
#[must_use]
pub fn pick<'a>(
    scene: &Scene,
    camera: &Camera,
    resolver: &PartResolver,
    records: &'a [PartRecord],
    ndc: Vec2,
) -> Option<&'a PartRecord> {
    let hit = raycast_targets(scene, camera, resolver, ndc)?;
    let part = scene
        .ancestors(hit.mesh)
        .find_map(|h| resolver.part_for_mesh(h))?;
    records.get(part.record_index)
}
