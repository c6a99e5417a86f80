//! glTF 2.0 import.
//!
//! Decoding is delegated to the `gltf` crate. The importer only resolves
//! buffers, reads node transforms, triangle positions/indices and PBR
//! factors, and packs them into an [`ImportedModel`] that owns no scene
//! handles. That keeps it `Send`, so it can be built on a worker thread and
//! instantiated later on the thread that owns the [`Scene`].

use std::sync::Arc;

use base64::Engine as _;
use glam::{Quat, Vec3, Vec4};
use log::{debug, warn};

use crate::assets::io::{resolve_relative, AssetReader};
use crate::errors::{Result, ViewerError};
use crate::resources::{Geometry, Material, Mesh};
use crate::scene::{Node, NodeHandle, NodeKind, Scene};

/// One triangle primitive of a glTF mesh.
#[derive(Debug, Clone)]
pub struct ImportedPrimitive {
    pub geometry: Arc<Geometry>,
    pub material: Material,
}

/// A glTF node, flattened into an index-addressed table.
#[derive(Debug, Clone)]
pub struct ImportedNode {
    pub name: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub primitives: Vec<ImportedPrimitive>,
    pub children: Vec<usize>,
}

/// A decoded model, independent of any scene.
#[derive(Debug, Clone, Default)]
pub struct ImportedModel {
    pub source: String,
    pub nodes: Vec<ImportedNode>,
    pub roots: Vec<usize>,
}

impl ImportedModel {
    #[must_use]
    pub fn primitive_count(&self) -> usize {
        self.nodes.iter().map(|n| n.primitives.len()).sum()
    }

    /// Creates the node tree under a fresh group named `root_name`, which is
    /// added as a scene root. Returns the group's handle.
    ///
    /// A node with one primitive becomes a mesh node carrying the glTF node
    /// name. A node with several becomes a group of mesh children.
    pub fn instantiate(&self, scene: &mut Scene, root_name: &str) -> NodeHandle {
        let root = scene.add_node(Node::new(root_name));

        let mut mapping = Vec::with_capacity(self.nodes.len());
        for imported in &self.nodes {
            let mut node = match imported.primitives.as_slice() {
                [single] => Node::with_kind(
                    &imported.name,
                    NodeKind::Mesh(Mesh::new(single.geometry.clone(), single.material.clone())),
                ),
                _ => Node::new(&imported.name),
            };
            node.transform.position = imported.translation;
            node.transform.rotation = imported.rotation;
            node.transform.scale = imported.scale;
            let handle = scene.add_node(node);

            if imported.primitives.len() > 1 {
                for (i, primitive) in imported.primitives.iter().enumerate() {
                    let child = Node::with_kind(
                        &format!("{}_primitive{i}", imported.name),
                        NodeKind::Mesh(Mesh::new(
                            primitive.geometry.clone(),
                            primitive.material.clone(),
                        )),
                    );
                    scene.add_to_parent(child, handle);
                }
            }
            mapping.push(handle);
        }

        for (index, imported) in self.nodes.iter().enumerate() {
            for &child in &imported.children {
                if let Some(&child_handle) = mapping.get(child) {
                    scene.attach(child_handle, mapping[index]);
                }
            }
        }
        for &root_index in &self.roots {
            if let Some(&handle) = mapping.get(root_index) {
                scene.attach(handle, root);
            }
        }

        // Nodes outside the selected glTF scene are not part of the model.
        for (index, &handle) in mapping.iter().enumerate() {
            let attached = scene.get_node(handle).is_some_and(|n| n.parent().is_some());
            if !attached {
                debug!("glTF node {index} is not reachable from the scene, dropping it");
                scene.remove_node(handle);
            }
        }

        scene.update_subtree(root);
        root
    }
}

/// glTF / GLB importer.
pub struct GltfLoader;

impl GltfLoader {
    /// Reads `uri` through `reader` and decodes it. External buffers are
    /// resolved relative to `uri` through the same reader.
    pub fn load(reader: &dyn AssetReader, uri: &str) -> Result<ImportedModel> {
        let bytes = reader.read_bytes(uri)?;
        Self::parse(&bytes, reader, uri)
    }

    /// Decodes already-fetched bytes.
    pub fn parse(bytes: &[u8], reader: &dyn AssetReader, uri: &str) -> Result<ImportedModel> {
        let gltf = gltf::Gltf::from_slice(bytes)?;
        let buffers = Self::load_buffers(&gltf, reader, uri)?;

        let materials: Vec<Material> = gltf.materials().map(|m| Self::convert_material(&m)).collect();

        let mut nodes = Vec::with_capacity(gltf.nodes().count());
        for node in gltf.nodes() {
            let name = node
                .name()
                .map_or_else(|| format!("Node_{}", node.index()), ToString::to_string);
            let (t, r, s) = node.transform().decomposed();

            let mut primitives = Vec::new();
            if let Some(mesh) = node.mesh() {
                for primitive in mesh.primitives() {
                    if let Some(imported) = Self::load_primitive(&primitive, &buffers, &materials)? {
                        primitives.push(imported);
                    }
                }
            }

            nodes.push(ImportedNode {
                name,
                translation: Vec3::from_array(t),
                rotation: Quat::from_array(r),
                scale: Vec3::from_array(s),
                primitives,
                children: node.children().map(|c| c.index()).collect(),
            });
        }

        let roots = match gltf.default_scene().or_else(|| gltf.scenes().next()) {
            Some(scene) => scene.nodes().map(|n| n.index()).collect(),
            None => {
                let mut is_child = vec![false; nodes.len()];
                for node in &nodes {
                    for &c in &node.children {
                        if let Some(flag) = is_child.get_mut(c) {
                            *flag = true;
                        }
                    }
                }
                (0..nodes.len()).filter(|&i| !is_child[i]).collect()
            }
        };

        let model = ImportedModel {
            source: uri.to_string(),
            nodes,
            roots,
        };
        debug!(
            "Decoded '{}': {} nodes, {} primitives",
            uri,
            model.nodes.len(),
            model.primitive_count()
        );
        Ok(model)
    }

    fn load_buffers(gltf: &gltf::Gltf, reader: &dyn AssetReader, uri: &str) -> Result<Vec<Vec<u8>>> {
        let mut buffer_data = Vec::new();
        for buffer in gltf.buffers() {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => gltf
                    .blob
                    .as_deref()
                    .map(<[u8]>::to_vec)
                    .ok_or_else(|| ViewerError::GltfError("Missing GLB binary chunk".into()))?,
                gltf::buffer::Source::Uri(buffer_uri) if buffer_uri.starts_with("data:") => {
                    Self::decode_data_uri(buffer_uri)?
                }
                gltf::buffer::Source::Uri(buffer_uri) => {
                    reader.read_bytes(&resolve_relative(uri, buffer_uri))?
                }
            };
            if data.len() < buffer.length() {
                return Err(ViewerError::GltfError(format!(
                    "Buffer {} holds {} bytes, expected {}",
                    buffer.index(),
                    data.len(),
                    buffer.length()
                )));
            }
            buffer_data.push(data);
        }
        Ok(buffer_data)
    }

    fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
        let (_, payload) = uri
            .split_once(";base64,")
            .ok_or_else(|| ViewerError::GltfError("Only base64 data URIs are supported".into()))?;
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ViewerError::GltfError(format!("Invalid base64 buffer: {e}")))
    }

    fn convert_material(material: &gltf::Material) -> Material {
        let pbr = material.pbr_metallic_roughness();
        let mut mat = Material::new_standard(Vec4::from_array(pbr.base_color_factor()));
        mat.name = material.name().map(ToString::to_string);
        mat.metalness = pbr.metallic_factor();
        mat.roughness = pbr.roughness_factor();
        let emissive = Vec3::from_array(material.emissive_factor());
        if emissive != Vec3::ZERO {
            mat.set_emissive(emissive, material.emissive_strength().unwrap_or(1.0));
        }
        mat
    }

    fn load_primitive(
        primitive: &gltf::Primitive,
        buffers: &[Vec<u8>],
        materials: &[Material],
    ) -> Result<Option<ImportedPrimitive>> {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            debug!("Skipping non-triangle primitive ({:?})", primitive.mode());
            return Ok(None);
        }

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
        let positions: Vec<Vec3> = match reader.read_positions() {
            Some(iter) => iter.map(Vec3::from_array).collect(),
            None => {
                warn!("Primitive without POSITION attribute skipped");
                return Ok(None);
            }
        };
        if positions.is_empty() {
            return Ok(None);
        }
        let indices = reader.read_indices().map(|iter| iter.into_u32().collect());

        let material = primitive
            .material()
            .index()
            .and_then(|idx| materials.get(idx).cloned())
            .unwrap_or_default();

        Ok(Some(ImportedPrimitive {
            geometry: Arc::new(Geometry::new(positions, indices)),
            material,
        }))
    }
}
