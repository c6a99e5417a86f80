pub mod gltf;

pub use self::gltf::{GltfLoader, ImportedModel, ImportedNode, ImportedPrimitive};
