use glam::{Vec3, Vec4};

/// Surface material of a mesh.
///
/// Each mesh node owns its own material instance, so emissive highlighting
/// of one part never bleeds into other parts that shared a glTF material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    /// Base color (RGBA, linear).
    pub color: Vec4,
    pub metalness: f32,
    pub roughness: f32,
    /// Self-illumination color; black means none.
    pub emissive: Vec3,
    pub emissive_intensity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self::new_standard(Vec4::ONE)
    }
}

impl Material {
    #[must_use]
    pub fn new_standard(color: Vec4) -> Self {
        Self {
            name: None,
            color,
            metalness: 0.0,
            roughness: 1.0,
            emissive: Vec3::ZERO,
            emissive_intensity: 0.0,
        }
    }

    pub fn set_emissive(&mut self, color: Vec3, intensity: f32) {
        self.emissive = color;
        self.emissive_intensity = intensity;
    }

    pub fn clear_emissive(&mut self) {
        self.set_emissive(Vec3::ZERO, 0.0);
    }

    #[must_use]
    pub fn is_emissive(&self) -> bool {
        self.emissive_intensity > 0.0 && self.emissive != Vec3::ZERO
    }
}

/// Flat-colored line material used by outline overlays and helpers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMaterial {
    pub color: Vec3,
    pub opacity: f32,
    pub transparent: bool,
}

impl LineMaterial {
    #[must_use]
    pub fn new(color: Vec3, opacity: f32) -> Self {
        Self {
            color,
            opacity,
            transparent: opacity < 1.0,
        }
    }
}
