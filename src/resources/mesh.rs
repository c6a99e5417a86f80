use glam::Vec3;

use crate::resources::geometry::GeometryRef;
use crate::resources::material::{LineMaterial, Material};

/// A renderable triangle mesh attached to a scene node.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: GeometryRef,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: GeometryRef, material: Material) -> Self {
        Self {
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

/// Line-segment overlay (pairs of endpoints in the parent's local space).
#[derive(Debug, Clone)]
pub struct LineSegments {
    pub segments: Vec<[Vec3; 2]>,
    pub material: LineMaterial,
}

impl LineSegments {
    #[must_use]
    pub fn new(segments: Vec<[Vec3; 2]>, material: LineMaterial) -> Self {
        Self { segments, material }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
