//! Asset Module
//!
//! - [`AssetReader`]: where bytes come from (files, memory)
//! - [`GltfLoader`]: glTF/GLB decoding into a scene-independent [`ImportedModel`]

pub mod io;
pub mod loaders;

pub use io::{model_stem, source_filename, AssetReader, FileAssetReader, MemoryAssetReader};
pub use loaders::{GltfLoader, ImportedModel};
