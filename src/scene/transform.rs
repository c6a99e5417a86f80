use glam::{Affine3A, Mat3, Quat, Vec3};

/// Position, rotation and scale of a node relative to its parent.
///
/// Callers mutate the TRS fields directly. The local matrix is rebuilt
/// lazily by [`Transform::update_local_matrix`], which compares the fields
/// against the values it last baked. The world matrix is written by the
/// transform system.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,

    /// TRS the local matrix was built from; `None` forces a rebuild.
    baked: Option<(Vec3, Quat, Vec3)>,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,
            baked: None,
        }
    }

    /// Rebuilds the local matrix when the TRS differs from the baked one.
    /// Returns whether it was rebuilt.
    pub fn update_local_matrix(&mut self) -> bool {
        let current = (self.position, self.rotation, self.scale);
        if self.baked == Some(current) {
            return false;
        }
        self.local_matrix =
            Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position);
        self.baked = Some(current);
        true
    }

    /// Whether the next [`Transform::update_local_matrix`] will rebuild.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.baked != Some((self.position, self.rotation, self.scale))
    }

    /// Forces a rebuild on the next pass, e.g. after reparenting.
    pub fn mark_dirty(&mut self) {
        self.baked = None;
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    /// World matrix as of the last transform-system pass.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        Vec3::from(self.world_matrix.translation)
    }

    pub fn set_world_matrix(&mut self, mat: Affine3A) {
        self.world_matrix = mat;
    }

    /// Turns -Z toward `target` (parent space). Leaves the rotation alone
    /// when `target` coincides with the position or lies along `up`.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        let right = forward.cross(up);
        if right.length_squared() < 1e-8 {
            return;
        }
        let right = right.normalize();
        let true_up = right.cross(forward).normalize();
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, true_up, -forward));
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
