use glam::Vec3;

use crate::settings::hex_to_rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    /// Uniform light from every direction.
    Ambient,
    /// Parallel light shining from the node position toward the origin.
    Directional,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    pub cast_shadows: bool,
}

impl Light {
    #[must_use]
    pub fn new_ambient(color: u32, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color: hex_to_rgb(color),
            intensity,
            cast_shadows: false,
        }
    }

    #[must_use]
    pub fn new_directional(color: u32, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            color: hex_to_rgb(color),
            intensity,
            cast_shadows: false,
        }
    }

    #[must_use]
    pub fn with_shadows(mut self) -> Self {
        self.cast_shadows = true;
        self
    }
}

/// Square reference grid on the XZ plane.
#[derive(Debug, Clone, PartialEq)]
pub struct GridHelper {
    pub size: f32,
    pub divisions: u32,
    pub center_color: Vec3,
    pub line_color: Vec3,
}

impl GridHelper {
    #[must_use]
    pub fn new(size: f32, divisions: u32, center_color: u32, line_color: u32) -> Self {
        Self {
            size,
            divisions,
            center_color: hex_to_rgb(center_color),
            line_color: hex_to_rgb(line_color),
        }
    }

    /// Line endpoints, `divisions + 1` lines per axis.
    #[must_use]
    pub fn segments(&self) -> Vec<[Vec3; 2]> {
        let half = self.size / 2.0;
        let step = self.size / self.divisions.max(1) as f32;
        let mut out = Vec::with_capacity(2 * (self.divisions as usize + 1));
        for i in 0..=self.divisions {
            let k = -half + i as f32 * step;
            out.push([Vec3::new(-half, 0.0, k), Vec3::new(half, 0.0, k)]);
            out.push([Vec3::new(k, 0.0, -half), Vec3::new(k, 0.0, half)]);
        }
        out
    }
}
