//! # Partscope
//!
//! Core of an interactive assembly/explosion viewer for glTF models.
//!
//! A model is loaded in the background and normalized into a canonical
//! cube; an external list of [`PartRecord`]s is bound to its meshes; each
//! bound part slides along its explosion direction as the assembly
//! progress moves between 0 (assembled) and 100 (exploded). Clicks are
//! resolved to parts, the selected part is highlighted, feature-edge
//! outlines can be toggled, and the camera pose plus progress are saved
//! per model.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use partscope::{FileAssetReader, MemorySessionStore, Viewer, ViewerSettings, SurfaceSize};
//!
//! let mut viewer = Viewer::mount(
//!     &ViewerSettings::default(),
//!     partscope::HeadlessRenderer::new(),
//!     SurfaceSize::new(1280, 720, 1.0),
//!     Arc::new(FileAssetReader::new("assets")),
//!     Box::new(MemorySessionStore::new()),
//! );
//! viewer.set_model_url(Some("gearbox.glb"));
//! viewer.set_parts(partscope::viewer::parts::parse_part_list(&json)?);
//! viewer.set_assembly_progress(100.0);
//! loop {
//!     viewer.frame(web_time::Instant::now());
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod app;
pub mod assets;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod settings;
pub mod utils;
pub mod viewer;

pub use app::{Input, PointerButton};
pub use assets::{AssetReader, FileAssetReader, GltfLoader, ImportedModel, MemoryAssetReader};
pub use errors::{Result, ViewerError};
pub use renderer::{FrameStats, HeadlessRenderer, RenderBackend};
pub use resources::{Geometry, Material, Mesh};
pub use scene::{Camera, Node, NodeHandle, NodeKind, Scene};
pub use settings::ViewerSettings;
pub use utils::OrbitControls;
pub use viewer::{
    AnimatorState, FileSessionStore, MemorySessionStore, PartRecord, ResizeSource, SceneHost,
    SelectionKey, SessionStore, SurfaceRect, SurfaceSize, Viewer,
};
