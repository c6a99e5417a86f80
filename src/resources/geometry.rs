use std::sync::Arc;

use glam::{Affine3A, Vec3};
use rustc_hash::FxHashMap;

use crate::resources::ray::Ray;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    /// An inverted box that any `expand_by_point` call will replace.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bbox = Self::empty();
        for &p in points {
            bbox.expand_by_point(p);
        }
        bbox
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Bounds of the eight transformed corners.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        if self.is_empty() {
            return *self;
        }
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut out = Self::empty();
        for point in corners {
            out.expand_by_point(matrix.transform_point3(point));
        }
        out
    }

    /// Slab test. Returns the entry distance along the ray, clamped to 0
    /// when the origin is inside the box.
    #[must_use]
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let inv = ray.direction.recip();
        let t1 = (self.min - ray.origin) * inv;
        let t2 = (self.max - ray.origin) * inv;
        let t_min = t1.min(t2).max_element();
        let t_max = t1.max(t2).min_element();
        if t_max >= t_min.max(0.0) {
            Some(t_min.max(0.0))
        } else {
            None
        }
    }
}

/// Triangle geometry in the mesh's local space.
///
/// Only positions and triangle indices are kept: that is all picking,
/// bounds and edge extraction need.
#[derive(Debug, Clone)]
pub struct Geometry {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    bounding_box: BoundingBox,
}

impl Geometry {
    /// Builds geometry from positions and optional indices. Without indices
    /// every three consecutive positions form a triangle. Indices pointing
    /// past the vertex list are dropped together with their triangle.
    #[must_use]
    pub fn new(positions: Vec<Vec3>, indices: Option<Vec<u32>>) -> Self {
        let vertex_count = positions.len() as u32;
        let indices = match indices {
            Some(list) => list
                .chunks_exact(3)
                .filter(|tri| tri.iter().all(|&i| i < vertex_count))
                .flatten()
                .copied()
                .collect(),
            None => (0..vertex_count - vertex_count % 3).collect(),
        };
        let bounding_box = BoundingBox::from_points(&positions);
        Self {
            positions,
            indices,
            bounding_box,
        }
    }

    /// Axis-aligned box of `size` centred on the origin.
    #[must_use]
    pub fn new_box(size: Vec3) -> Self {
        let h = size * 0.5;
        let positions = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // -z
            4, 5, 6, 4, 6, 7, // +z
            0, 1, 5, 0, 5, 4, // -y
            3, 7, 6, 3, 6, 2, // +y
            0, 4, 7, 0, 7, 3, // -x
            1, 2, 6, 1, 6, 5, // +x
        ];
        Self::new(positions, Some(indices))
    }

    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    #[must_use]
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }

    /// Nearest hit distance of a local-space ray against the triangles.
    /// Both faces count as hits.
    #[must_use]
    pub fn raycast(&self, ray: &Ray) -> Option<f32> {
        self.bounding_box.intersect_ray(ray)?;
        self.triangles()
            .filter_map(|[a, b, c]| ray.intersect_triangle(a, b, c))
            .min_by(f32::total_cmp)
    }

    /// Feature edges for outline overlays: boundary edges plus interior
    /// edges whose adjacent faces meet at more than `threshold_degrees`.
    /// Vertices are welded by position so split normals do not create
    /// spurious seams.
    #[must_use]
    pub fn feature_edges(&self, threshold_degrees: f32) -> Vec<[Vec3; 2]> {
        let threshold_dot = threshold_degrees.to_radians().cos();

        // Weld by exact position bits.
        let mut welded: FxHashMap<[u32; 3], u32> = FxHashMap::default();
        let mut remap = Vec::with_capacity(self.positions.len());
        for p in &self.positions {
            let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
            let next = welded.len() as u32;
            remap.push(*welded.entry(key).or_insert(next));
        }

        let mut edge_faces: FxHashMap<(u32, u32), Vec<Vec3>> = FxHashMap::default();
        let mut edge_ends: FxHashMap<(u32, u32), [Vec3; 2]> = FxHashMap::default();

        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ];
            let normal = (b - a).cross(c - a);
            if normal.length_squared() <= f32::EPSILON {
                continue;
            }
            let normal = normal.normalize();
            for (i, j) in [(0, 1), (1, 2), (2, 0)] {
                let (wi, wj) = (remap[tri[i] as usize], remap[tri[j] as usize]);
                let key = if wi < wj { (wi, wj) } else { (wj, wi) };
                edge_faces.entry(key).or_default().push(normal);
                edge_ends
                    .entry(key)
                    .or_insert([self.positions[tri[i] as usize], self.positions[tri[j] as usize]]);
            }
        }

        let mut edges: Vec<((u32, u32), [Vec3; 2])> = edge_faces
            .into_iter()
            .filter(|(_, normals)| match normals.as_slice() {
                [_] => true,
                [n0, n1] => n0.dot(*n1) <= threshold_dot,
                _ => true,
            })
            .filter_map(|(key, _)| edge_ends.get(&key).map(|ends| (key, *ends)))
            .collect();
        edges.sort_unstable_by_key(|(key, _)| *key);
        edges.into_iter().map(|(_, ends)| ends).collect()
    }
}

/// Shared geometry reference; meshes created from the same glTF mesh share it.
pub type GeometryRef = Arc<Geometry>;
