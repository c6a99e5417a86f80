use glam::{Vec2, Vec3};

use crate::app::input::{Input, PointerButton};
use crate::scene::camera::Camera;
use crate::settings::ControlSettings;

const EPS: f32 = 0.0001;

/// Orbit camera controller with damped rotation.
///
/// Holds the orbit target plus spherical coordinates of the camera around
/// it. Setting the camera position or target from outside (session restore,
/// reset) must be followed by [`OrbitControls::sync_from_camera`] so the
/// spherical state matches, the same contract as three.js' `controls.update()`.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping_factor: f32,
    pub enable_damping: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub enabled: bool,

    pub target: Vec3,
    radius: f32,
    theta: f32,
    phi: f32,

    rotate_delta: Vec2,
    last_position: Vec3,
    last_target: Vec3,
    disposed: bool,
}

impl OrbitControls {
    #[must_use]
    pub fn new(settings: &ControlSettings, camera: &Camera, target: Vec3) -> Self {
        let mut controls = Self {
            rotate_speed: settings.rotate_speed,
            zoom_speed: settings.zoom_speed,
            pan_speed: settings.pan_speed,
            damping_factor: settings.damping_factor,
            enable_damping: settings.enable_damping,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            enabled: true,

            target,
            radius: 1.0,
            theta: 0.0,
            phi: std::f32::consts::FRAC_PI_2,

            rotate_delta: Vec2::ZERO,
            last_position: camera.position(),
            last_target: target,
            disposed: false,
        };
        controls.sync_from_camera(camera);
        controls
    }

    /// Re-derives the spherical state from the camera's current position and
    /// `self.target`, dropping any pending inertia. The new pose is not
    /// reported as a change by the next [`OrbitControls::update`].
    pub fn sync_from_camera(&mut self, camera: &Camera) {
        let offset = camera.position() - self.target;
        self.radius = offset.length().max(EPS);
        self.theta = offset.x.atan2(offset.z);
        self.phi = (offset.y / self.radius).clamp(-1.0, 1.0).acos();
        self.rotate_delta = Vec2::ZERO;
        self.last_position = camera.position();
        self.last_target = self.target;
    }

    #[inline]
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.radius
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Stops reacting to input. Idempotent.
    pub fn dispose(&mut self) {
        self.enabled = false;
        self.disposed = true;
        self.rotate_delta = Vec2::ZERO;
    }

    /// Applies input and damping, then writes the camera transform.
    ///
    /// Returns `true` when the camera position or target moved, which is the
    /// "change" event session persistence listens to.
    pub fn update(&mut self, camera: &mut Camera, input: &Input, dt: f32) -> bool {
        let screen_height = input.screen_size.y.max(1.0);

        if self.enabled && input.is_button_pressed(PointerButton::Primary) {
            let rotate_per_pixel = 2.0 * std::f32::consts::PI / screen_height;
            self.rotate_delta -= input.cursor_delta * rotate_per_pixel * self.rotate_speed;
        }

        if self.enable_damping {
            let target_fps = 60.0;
            let retention = (1.0 - self.damping_factor).powf(dt * target_fps);
            let delta_apply = self.rotate_delta * (1.0 - retention);

            self.theta += delta_apply.x;
            self.phi += delta_apply.y;

            self.rotate_delta *= retention;
            if self.rotate_delta.length_squared() < 1e-12 {
                self.rotate_delta = Vec2::ZERO;
            }
        } else {
            self.theta += self.rotate_delta.x;
            self.phi += self.rotate_delta.y;
            self.rotate_delta = Vec2::ZERO;
        }

        self.phi = self.phi.clamp(EPS, std::f32::consts::PI - EPS);

        if self.enabled && input.scroll_delta.y != 0.0 {
            let scale = (1.0 - self.zoom_speed).powf(input.scroll_delta.y.abs());
            if input.scroll_delta.y > 0.0 {
                self.radius *= scale;
            } else {
                self.radius /= scale;
            }
        }
        self.radius = self.radius.clamp(self.min_distance, self.max_distance);

        if self.enabled && input.is_button_pressed(PointerButton::Secondary) {
            let half_fov = camera.effective_fov() / 2.0;
            let target_world_height = 2.0 * self.radius * half_fov.tan();
            let pixels_to_world_ratio = target_world_height / screen_height;

            let forward = -self.spherical_offset().normalize();
            let right = forward.cross(Vec3::Y).normalize_or_zero();
            let up = right.cross(forward).normalize_or_zero();

            self.target += (right * -input.cursor_delta.x + up * input.cursor_delta.y)
                * pixels_to_world_ratio
                * self.pan_speed;
        }

        camera.transform.position = self.target + self.spherical_offset() * self.radius;
        camera.transform.look_at(self.target, Vec3::Y);
        camera.update_matrix_world();

        let changed = camera.position().distance_squared(self.last_position) > 1e-12
            || self.target.distance_squared(self.last_target) > 1e-12;
        self.last_position = camera.position();
        self.last_target = self.target;
        changed
    }

    fn spherical_offset(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }
}
