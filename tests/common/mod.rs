//! Shared fixtures: small glTF documents with embedded base64 buffers.

#![allow(dead_code)]

use base64::Engine as _;
use glam::Vec3;
use serde_json::{json, Value};

use partscope::resources::Geometry;

/// Routes crate logs to the test harness; `RUST_LOG` picks the level.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Unit cube positions (f32 xyz) followed by u32 triangle indices.
fn box_buffer() -> (Vec<u8>, usize, usize, usize, usize) {
    let geometry = Geometry::new_box(Vec3::ONE);
    let mut bytes = Vec::new();
    for p in geometry.positions() {
        for c in p.to_array() {
            bytes.extend_from_slice(&c.to_le_bytes());
        }
    }
    let positions_len = bytes.len();
    for i in geometry.indices() {
        bytes.extend_from_slice(&i.to_le_bytes());
    }
    let indices_len = bytes.len() - positions_len;
    (
        bytes,
        positions_len,
        indices_len,
        geometry.positions().len(),
        geometry.indices().len(),
    )
}

/// A glTF document whose `nodes` reference mesh 0 (one unit-cube primitive)
/// or mesh 1 (two unit-cube primitives). `roots` become scene 0.
pub fn gltf_document(nodes: Value, roots: &[usize]) -> Value {
    let (bytes, positions_len, indices_len, vertex_count, index_count) = box_buffer();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    let primitive = json!({ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 });

    json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": roots }],
        "nodes": nodes,
        "meshes": [
            { "primitives": [primitive.clone()] },
            { "primitives": [primitive.clone(), primitive] }
        ],
        "materials": [{
            "name": "steel",
            "pbrMetallicRoughness": {
                "baseColorFactor": [0.6, 0.6, 0.65, 1.0],
                "metallicFactor": 0.9,
                "roughnessFactor": 0.3
            }
        }],
        "buffers": [{
            "byteLength": bytes.len(),
            "uri": format!("data:application/octet-stream;base64,{encoded}")
        }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": positions_len, "target": 34962 },
            { "buffer": 0, "byteOffset": positions_len, "byteLength": indices_len, "target": 34963 }
        ],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": 5126,
                "count": vertex_count,
                "type": "VEC3",
                "min": [-0.5, -0.5, -0.5],
                "max": [0.5, 0.5, 0.5]
            },
            {
                "bufferView": 1,
                "componentType": 5125,
                "count": index_count,
                "type": "SCALAR"
            }
        ]
    })
}

pub fn gltf_bytes(nodes: Value, roots: &[usize]) -> Vec<u8> {
    serde_json::to_vec(&gltf_document(nodes, roots)).unwrap()
}

/// Three named parts under one assembly node:
///
/// ```text
/// Assembly
/// ├── Housing          (cube at origin)
/// ├── Gear             (cube at x = 2)
/// └── Shaft            (group at x = -2)
///     └── (unnamed)    (two-primitive cube)
/// ```
pub fn assembly_gltf() -> Vec<u8> {
    gltf_bytes(
        json!([
            { "name": "Assembly", "children": [1, 2, 3] },
            { "name": "Housing", "mesh": 0 },
            { "name": "Gear", "mesh": 0, "translation": [2.0, 0.0, 0.0] },
            { "name": "Shaft", "children": [4], "translation": [-2.0, 0.0, 0.0] },
            { "mesh": 1 }
        ]),
        &[0],
    )
}

pub const ASSEMBLY_PARTS_JSON: &str = r#"[
    {
        "id": 1,
        "meshName": "Housing",
        "content": { "name": "Housing", "position": { "x": 0, "y": 0, "z": 0 }, "explodeVector": { "x": 0, "y": 1, "z": 0 } }
    },
    {
        "id": "gear-7",
        "meshName": "Gear",
        "content": "{\"position\":{\"x\":2,\"y\":0,\"z\":0},\"explodeVector\":{\"x\":3,\"y\":0,\"z\":0}}"
    },
    {
        "id": 3,
        "meshName": "Shaft",
        "content": { "position": { "x": -2, "y": 0, "z": 0 } }
    }
]"#;
