//! Resource Module
//!
//! CPU-side data attached to scene nodes:
//!
//! - [`Geometry`]: triangle positions/indices with cached bounds
//! - [`Material`]: surface color and emissive state
//! - [`Mesh`] / [`LineSegments`]: what a node renders
//! - [`Ray`] / [`BoundingBox`]: picking primitives

pub mod geometry;
pub mod material;
pub mod mesh;
pub mod ray;

pub use geometry::{BoundingBox, Geometry, GeometryRef};
pub use material::{LineMaterial, Material};
pub use mesh::{LineSegments, Mesh};
pub use ray::Ray;
