//! Scene host: scene, camera, controls, lights and the render loop for one
//! mounted view.

use glam::Vec3;
use log::{debug, info};
use web_time::Instant;

use crate::app::input::Input;
use crate::renderer::RenderBackend;
use crate::scene::{Camera, GridHelper, Light, Node, NodeHandle, NodeKind, Scene};
use crate::settings::{hex_to_rgb, ViewerSettings};
use crate::utils::{OrbitControls, Timer};

/// Size of the mount element in CSS pixels plus the display's pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f32,
}

impl SurfaceSize {
    #[must_use]
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// The two independent size notifications a host listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeSource {
    /// Window resize events.
    Window,
    /// Layout (element size) observation.
    Layout,
}

/// Cancellable per-vsync loop state.
#[derive(Debug, Clone, Default)]
pub struct RenderLoop {
    running: bool,
    frames: u64,
}

impl RenderLoop {
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Result of the update half of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    pub dt: f32,
    /// The orbit controls moved the camera or target this frame.
    pub controls_changed: bool,
}

pub struct SceneHost<B: RenderBackend> {
    pub scene: Scene,
    pub camera: Camera,
    pub controls: OrbitControls,
    pub input: Input,
    settings: ViewerSettings,
    backend: B,
    timer: Timer,
    surface: SurfaceSize,
    render_loop: RenderLoop,
    window_subscribed: bool,
    layout_subscribed: bool,
    torn_down: bool,
}

impl<B: RenderBackend> SceneHost<B> {
    /// Builds the scene, subscribes to both resize sources, sizes the
    /// backend once and starts the render loop.
    pub fn mount(settings: &ViewerSettings, backend: B, size: SurfaceSize) -> Self {
        let cam = &settings.camera;
        let aspect = if size.is_zero() {
            1.0
        } else {
            size.width as f32 / size.height as f32
        };
        let mut camera = Camera::new_perspective(cam.fov_degrees, aspect, cam.near, cam.far);
        camera.transform.position = cam.default_position;
        camera.transform.look_at(cam.default_target, Vec3::Y);
        camera.update_matrix_world();

        let controls = OrbitControls::new(&settings.controls, &camera, cam.default_target);

        let mut scene = Scene::new();
        scene.background = hex_to_rgb(settings.background);
        Self::add_lighting(&mut scene);

        let mut host = Self {
            scene,
            camera,
            controls,
            input: Input::new(),
            settings: settings.clone(),
            backend,
            timer: Timer::new(),
            surface: size,
            render_loop: RenderLoop::default(),
            window_subscribed: true,
            layout_subscribed: true,
            torn_down: false,
        };
        host.resize_to_mount();
        host.render_loop.start();
        info!("Scene host mounted ({}x{})", size.width, size.height);
        host
    }

    fn add_lighting(scene: &mut Scene) {
        scene.add_node(Node::with_kind(
            "ambientLight",
            NodeKind::Light(Light::new_ambient(0xffffff, 2.0)),
        ));

        let mut key = Node::with_kind(
            "keyLight",
            NodeKind::Light(Light::new_directional(0xffffff, 2.0).with_shadows()),
        );
        key.transform.position = Vec3::new(8.0, 8.0, 5.0);
        scene.add_node(key);

        let mut fill = Node::with_kind(
            "fillLight",
            NodeKind::Light(Light::new_directional(0x4a8aff, 2.0)),
        );
        fill.transform.position = Vec3::new(-10.0, -5.0, -5.0);
        scene.add_node(fill);

        scene.add_node(Node::with_kind(
            "grid",
            NodeKind::Grid(GridHelper::new(10.0, 10, 0x444444, 0x222222)),
        ));
        scene.update_matrix_world();
    }

    // ========================================================================
    // Size observation
    // ========================================================================

    /// A size notification from `source`. Ignored once that subscription is
    /// gone.
    pub fn resize(&mut self, source: ResizeSource, size: SurfaceSize) {
        let subscribed = match source {
            ResizeSource::Window => self.window_subscribed,
            ResizeSource::Layout => self.layout_subscribed,
        };
        if !subscribed {
            return;
        }
        self.surface = size;
        self.resize_to_mount();
    }

    /// Shared recompute routine for both size sources.
    pub fn resize_to_mount(&mut self) {
        if self.torn_down || self.surface.is_zero() {
            return;
        }
        let SurfaceSize {
            width,
            height,
            device_pixel_ratio,
        } = self.surface;
        self.camera.aspect = width as f32 / height as f32;
        self.camera.update_projection_matrix();
        let pixel_ratio = device_pixel_ratio.min(self.settings.max_pixel_ratio);
        self.backend.set_size(width, height, pixel_ratio);
        self.input.handle_resize(width, height);
        debug!("Resized to {width}x{height} @{pixel_ratio}");
    }

    #[must_use]
    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Update half of a vsync tick: timing and damped controls. `None` once
    /// the loop is cancelled.
    pub fn begin_frame(&mut self, now: Instant) -> Option<FrameTick> {
        if !self.render_loop.is_running() {
            return None;
        }
        self.timer.tick(now);
        let dt = self.timer.dt_seconds();
        let controls_changed = self.controls.update(&mut self.camera, &self.input, dt);
        self.input.end_frame();
        Some(FrameTick { dt, controls_changed })
    }

    /// Draw half of a vsync tick.
    pub fn end_frame(&mut self) {
        if !self.render_loop.is_running() {
            return;
        }
        self.scene.update_matrix_world();
        self.backend.render(&self.scene, &self.camera);
        self.render_loop.frames += 1;
    }

    /// A full tick for hosts without anything else to animate.
    pub fn frame(&mut self, now: Instant) -> Option<FrameTick> {
        let tick = self.begin_frame(now)?;
        self.end_frame();
        Some(tick)
    }

    #[must_use]
    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    // ========================================================================
    // Camera
    // ========================================================================

    /// Puts camera and target back at the configured defaults, zoom 1.
    pub fn reset_view(&mut self) {
        let position = self.settings.camera.default_position;
        let target = self.settings.camera.default_target;
        self.apply_camera(position, target, 1.0);
    }

    /// Sets the camera pose and zoom, then re-syncs the controls.
    pub fn apply_camera(&mut self, position: Vec3, target: Vec3, zoom: f32) {
        self.camera.transform.position = position;
        self.camera.zoom = zoom;
        self.camera.update_projection_matrix();
        self.controls.target = target;
        self.controls.sync_from_camera(&self.camera);
        self.camera.transform.look_at(target, Vec3::Y);
        self.camera.update_matrix_world();
    }

    #[must_use]
    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    /// Mutable scene alongside the settings, for passes that need both.
    pub fn scene_and_settings(&mut self) -> (&mut Scene, &ViewerSettings) {
        (&mut self.scene, &self.settings)
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The loaded model's root, if one is installed.
    #[must_use]
    pub fn model_root(&self) -> Option<NodeHandle> {
        self.scene.get_node_by_name(&self.settings.model_node_name)
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Stops the loop, drops both size subscriptions and releases controls
    /// and backend. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.render_loop.cancel();
        self.window_subscribed = false;
        self.layout_subscribed = false;
        self.controls.dispose();
        self.backend.dispose();
        self.backend.detach_surface();
        self.torn_down = true;
        info!("Scene host torn down");
    }
}
