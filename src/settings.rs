//! Viewer Settings
//!
//! Global configuration consumed when a [`Viewer`](crate::viewer::Viewer) is
//! mounted. Every field has a default matching the stock viewer, so the usual
//! way to customise is struct-update syntax:
//!
//! ```rust,ignore
//! use partscope::settings::{AssemblySettings, ViewerSettings};
//!
//! let settings = ViewerSettings {
//!     assembly: AssemblySettings { explosion_strength: 0.25, ..Default::default() },
//!     ..Default::default()
//! };
//! ```
//!
//! Settings can also be read from a JSON file; missing fields fall back to
//! their defaults.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ViewerError};

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Perspective camera setup and the "home" view used on reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Camera position used at mount, on reset, and when no session exists.
    pub default_position: Vec3,
    /// Orbit target paired with `default_position`.
    pub default_target: Vec3,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 50.0,
            near: 0.1,
            far: 1000.0,
            default_position: Vec3::new(3.0, 2.0, 5.0),
            default_target: Vec3::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Orbit control tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub enable_damping: bool,
    /// Fraction of the pending rotation applied per 60Hz frame.
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: 2.0,
            max_distance: 20.0,
            rotate_speed: 1.0,
            zoom_speed: 0.05,
            pan_speed: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Assembly animation
// ---------------------------------------------------------------------------

/// Explode animation constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblySettings {
    /// Distance (scene units) a part travels along its direction at 100%.
    pub explosion_strength: f32,
    /// Per-frame exponential smoothing factor toward the target.
    pub lerp_factor: f32,
    /// Distance under which a part counts as converged.
    pub epsilon: f32,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            explosion_strength: 0.1,
            lerp_factor: 0.05,
            epsilon: 1e-4,
        }
    }
}

// ---------------------------------------------------------------------------
// Session persistence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Debounce applied after orbit control changes.
    pub controls_debounce_ms: u64,
    /// Debounce applied after assembly progress changes.
    pub progress_debounce_ms: u64,
    /// Prefix of the storage key; the model stem is appended.
    pub key_prefix: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            controls_debounce_ms: 300,
            progress_debounce_ms: 500,
            key_prefix: "viewer_".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Highlight & outlines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightSettings {
    /// Emissive color as 0xRRGGBB.
    pub color: u32,
    pub intensity: f32,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            color: 0x00e5ff,
            intensity: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineSettings {
    /// Minimum dihedral angle (degrees) for an interior edge to be drawn.
    pub threshold_degrees: f32,
    pub color: u32,
    pub opacity: f32,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            threshold_degrees: 15.0,
            color: 0x00e5ff,
            opacity: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// ViewerSettings
// ---------------------------------------------------------------------------

/// Top-level viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub camera: CameraSettings,
    pub controls: ControlSettings,
    pub assembly: AssemblySettings,
    pub session: SessionSettings,
    pub highlight: HighlightSettings,
    pub outline: OutlineSettings,
    /// Largest model dimension after normalization, in scene units.
    pub canonical_size: f32,
    /// Name given to the active model's root node.
    pub model_node_name: String,
    /// Device pixel ratios above this are clamped.
    pub max_pixel_ratio: f32,
    /// Clear color as 0xRRGGBB.
    pub background: u32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            camera: CameraSettings::default(),
            controls: ControlSettings::default(),
            assembly: AssemblySettings::default(),
            session: SessionSettings::default(),
            highlight: HighlightSettings::default(),
            outline: OutlineSettings::default(),
            canonical_size: 2.0,
            model_node_name: "loadedModel".to_string(),
            max_pixel_ratio: 2.0,
            background: 0x000a_1520,
        }
    }
}

impl ViewerSettings {
    /// Reads settings from a JSON file. Absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings: Self = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values that would make the viewer misbehave silently.
    pub fn validate(&self) -> Result<()> {
        if self.canonical_size <= 0.0 {
            return Err(ViewerError::SettingsError(format!(
                "canonical_size must be positive, got {}",
                self.canonical_size
            )));
        }
        if !(0.0..=1.0).contains(&self.assembly.lerp_factor) || self.assembly.lerp_factor == 0.0 {
            return Err(ViewerError::SettingsError(format!(
                "assembly.lerp_factor must be in (0, 1], got {}",
                self.assembly.lerp_factor
            )));
        }
        if self.controls.min_distance > self.controls.max_distance {
            return Err(ViewerError::SettingsError(
                "controls.min_distance exceeds controls.max_distance".to_string(),
            ));
        }
        if self.camera.near <= 0.0 || self.camera.far <= self.camera.near {
            return Err(ViewerError::SettingsError(
                "camera clip planes must satisfy 0 < near < far".to_string(),
            ));
        }
        Ok(())
    }
}

/// Splits 0xRRGGBB into linear-ish float channels.
#[must_use]
pub fn hex_to_rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}
