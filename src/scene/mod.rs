//! Scene Graph Module
//!
//! Manages the scene hierarchy:
//! - [`Node`]: scene node with a parent link, children and a [`NodeKind`] tag
//! - [`Transform`]: position, rotation, scale with cached matrices
//! - [`Scene`]: node container and traversal helpers
//! - [`Camera`]: perspective camera driven by orbit controls
//! - [`Light`] / [`GridHelper`]: the host's lighting rig and reference grid
//! - [`transform_system`]: world-matrix propagation

pub mod camera;
pub mod light;
pub mod node;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod transform;
pub mod transform_system;

pub use camera::Camera;
pub use light::{GridHelper, Light, LightKind};
pub use node::{Node, NodeKind};
pub use scene::Scene;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    /// Stable handle to a node in a [`Scene`].
    pub struct NodeHandle;
}
