use glam::{Affine3A, Mat4, Vec2, Vec3};

use crate::resources::ray::Ray;
use crate::scene::transform::Transform;

/// Perspective camera.
///
/// The camera is not part of the node tree: the host owns it directly and
/// orbit controls drive its transform.
#[derive(Debug, Clone)]
pub struct Camera {
    pub transform: Transform,

    // === Projection ===
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Optical zoom; narrows the effective field of view.
    pub zoom: f32,

    // Cached matrices
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) view_projection_matrix: Mat4,
}

impl Camera {
    /// `fov` is given in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            transform: Transform::new(),
            fov: fov.to_radians(),
            aspect,
            near,
            far,
            zoom: 1.0,

            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        };
        cam.update_projection_matrix();
        cam
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Field of view after zoom is applied.
    #[must_use]
    pub fn effective_fov(&self) -> f32 {
        let zoom = if self.zoom > 0.0 { self.zoom } else { 1.0 };
        2.0 * ((self.fov * 0.5).tan() / zoom).atan()
    }

    pub fn update_projection_matrix(&mut self) {
        // glam's perspective_rh targets a [0, 1] depth range.
        self.projection_matrix =
            Mat4::perspective_rh(self.effective_fov(), self.aspect.max(f32::EPSILON), self.near, self.far);
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    /// Refreshes the view matrix from the transform. Call after moving the
    /// camera.
    pub fn update_matrix_world(&mut self) {
        self.transform.update_local_matrix();
        let world = *self.transform.local_matrix();
        self.transform.set_world_matrix(world);
        self.view_matrix = Mat4::from(world).inverse();
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        self.transform.world_matrix()
    }

    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_projection_matrix
    }

    /// Projects a world point to normalized device coordinates.
    #[must_use]
    pub fn project(&self, point: Vec3) -> Vec3 {
        self.view_projection_matrix.project_point3(point)
    }

    /// Ray from the camera through a point in normalized device coordinates
    /// (x right, y up, both in [-1, 1]).
    #[must_use]
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection_matrix.inverse();
        let through = inverse.project_point3(ndc.extend(0.5));
        let origin = Vec3::from(self.world_matrix().translation);
        Ray::new(origin, through - origin)
    }
}
