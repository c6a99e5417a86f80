//! Mesh ↔ part binding.
//!
//! A loaded model is a tree of anonymous meshes; the part list names some
//! of its nodes. The resolver finds, for every mesh, the nearest ancestor
//! (the mesh itself included) whose name is a part's `meshName`. That
//! ancestor is the *logical part*: it is what moves when the assembly
//! explodes, and every mesh beneath it is a click target reporting the part.

use glam::Vec3;
use log::{debug, warn};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::scene::{NodeHandle, Scene};
use crate::viewer::parts::{PartRecord, SelectionKey};

/// Explosion vectors shorter than this are treated as "not given".
const MIN_EXPLODE_LENGTH: f32 = 0.001;
/// A normalized home shorter than this (only the zero vector) cannot
/// supply a direction.
const MIN_HOME_LENGTH: f32 = 0.01;

/// A part record bound to a scene node.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalPart {
    pub node: NodeHandle,
    pub name: String,
    /// Index into the part list the resolver was built from.
    pub record_index: usize,
    /// Assembled position, in the parent's space.
    pub home: Vec3,
    /// Travel direction; never zero once the resolver has run.
    pub direction: Vec3,
    /// Meshes under `node` that report this part when clicked.
    pub targets: SmallVec<[NodeHandle; 4]>,
}

/// Derived binding state for the current model and part list.
///
/// Never patched incrementally: [`PartResolver::rebuild`] throws everything
/// away and starts over. Only the rest positions survive a rebuild.
#[derive(Debug, Clone, Default)]
pub struct PartResolver {
    parts: Vec<LogicalPart>,
    by_name: FxHashMap<String, usize>,
    by_mesh: FxHashMap<NodeHandle, usize>,
    click_targets: Vec<NodeHandle>,
    /// Local position of each node the first time it was bound, i.e. as
    /// installed. Fallback home for records without a `position`.
    rest: FxHashMap<NodeHandle, Vec3>,
}

impl PartResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.parts.clear();
        self.by_name.clear();
        self.by_mesh.clear();
        self.click_targets.clear();
    }

    /// Rebinds `records` against the model under `model_root`.
    ///
    /// Does nothing beyond clearing when there is no model or no records.
    /// Bound nodes are moved to their declared home positions.
    pub fn rebuild(&mut self, scene: &mut Scene, model_root: Option<NodeHandle>, records: &[PartRecord]) {
        self.clear();
        let Some(root) = model_root else {
            return;
        };
        if records.is_empty() || scene.get_node(root).is_none() {
            return;
        }

        self.rest.retain(|&node, _| scene.get_node(node).is_some());
        self.bind(scene, root, records);
        self.init_layout(scene, records);
        scene.update_subtree(root);

        debug!(
            "Bound {} logical parts covering {} meshes ({} records)",
            self.parts.len(),
            self.click_targets.len(),
            records.len()
        );
    }

    /// First pass: mesh → nearest named ancestor below the model root.
    fn bind(&mut self, scene: &Scene, root: NodeHandle, records: &[PartRecord]) {
        // Duplicate meshNames: the first record in list order wins.
        let mut lookup: FxHashMap<&str, usize> = FxHashMap::default();
        for (index, record) in records.iter().enumerate() {
            lookup.entry(record.mesh_name.as_str()).or_insert(index);
        }

        let meshes: Vec<NodeHandle> = scene.meshes_under(root).collect();
        for mesh in meshes {
            let matched = scene
                .ancestors(mesh)
                .take_while(|&h| h != root)
                .find_map(|h| {
                    let name = scene.get_name(h)?;
                    lookup.get(name).map(|&idx| (h, name, idx))
                });

            let Some((node, name, record_index)) = matched else {
                continue;
            };

            let part_index = match self.by_name.get(name) {
                Some(&existing) => existing,
                None => {
                    let current = scene
                        .get_node(node)
                        .map_or(Vec3::ZERO, |n| n.transform.position);
                    let home = *self.rest.entry(node).or_insert(current);
                    self.parts.push(LogicalPart {
                        node,
                        name: name.to_string(),
                        record_index,
                        home,
                        direction: Vec3::Y,
                        targets: SmallVec::new(),
                    });
                    let index = self.parts.len() - 1;
                    self.by_name.insert(name.to_string(), index);
                    index
                }
            };

            self.parts[part_index].targets.push(mesh);
            self.by_mesh.insert(mesh, part_index);
            self.click_targets.push(mesh);
        }
    }

    /// Second pass: declared home positions and explosion directions.
    fn init_layout(&mut self, scene: &mut Scene, records: &[PartRecord]) {
        for part in &mut self.parts {
            let record = &records[part.record_index];
            let (declared_home, declared_dir) = match record.metadata() {
                Ok(meta) => (meta.position.map(Vec3::from), meta.explode_vector.map(Vec3::from)),
                Err(err) => {
                    warn!("Part '{}' has unreadable content: {err}", record.mesh_name);
                    (None, None)
                }
            };

            match declared_home {
                Some(home) => {
                    part.home = home;
                    if let Some(node) = scene.get_node_mut(part.node) {
                        node.transform.position = home;
                    }
                }
                None => warn!(
                    "Part '{}' declares no position, keeping the model's own",
                    record.mesh_name
                ),
            }

            part.direction = explosion_direction(declared_dir.unwrap_or(Vec3::ZERO), part.home);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    #[must_use]
    pub fn parts(&self) -> &[LogicalPart] {
        &self.parts
    }

    /// Every bound mesh, in scene pre-order.
    #[must_use]
    pub fn click_targets(&self) -> &[NodeHandle] {
        &self.click_targets
    }

    #[must_use]
    pub fn part_for_mesh(&self, mesh: NodeHandle) -> Option<&LogicalPart> {
        self.by_mesh.get(&mesh).map(|&i| &self.parts[i])
    }

    #[must_use]
    pub fn logical_part_by_name(&self, name: &str) -> Option<&LogicalPart> {
        self.by_name.get(name).map(|&i| &self.parts[i])
    }

    /// The record a selection key names, then its logical part if bound.
    #[must_use]
    pub fn find_record<'a>(
        &self,
        records: &'a [PartRecord],
        key: &SelectionKey,
    ) -> Option<(&'a PartRecord, Option<&LogicalPart>)> {
        let record = key.find(records)?;
        Some((record, self.logical_part_by_name(&record.mesh_name)))
    }
}

/// Declared vector if usable, else the direction of the home position, else up.
#[must_use]
pub fn explosion_direction(declared: Vec3, home: Vec3) -> Vec3 {
    if declared.length() >= MIN_EXPLODE_LENGTH {
        return declared;
    }
    let from_home = home.normalize_or_zero();
    if from_home.length() < MIN_HOME_LENGTH {
        Vec3::Y
    } else {
        from_home
    }
}
