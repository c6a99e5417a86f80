//! Viewer Module
//!
//! The assembly viewer proper, built on the scene graph:
//!
//! - [`host`]: scene, camera, orbit controls, lights, render loop
//! - [`loader`]: background glTF loading and model normalization
//! - [`parts`] / [`resolver`]: part records and the mesh ↔ part binding
//! - [`animator`]: assembly ↔ explosion motion
//! - [`selection`]: highlight and click picking
//! - [`outlines`]: edge overlays
//! - [`session`] / [`scheduler`]: debounced per-model view sessions
//!
//! [`Viewer`] owns one of each and sequences them.
//!
//! # Frame order
//!
//! 1. Finished loads are installed; on a new model the part binding is
//!    rebuilt, outlines synced and the saved session restored.
//! 2. Orbit controls update; a camera change schedules a session save.
//! 3. The animator moves bound parts.
//! 4. A due session save is written.
//! 5. The frame is rendered.

pub mod animator;
pub mod host;
pub mod loader;
pub mod outlines;
pub mod parts;
pub mod resolver;
pub mod scheduler;
pub mod selection;
pub mod session;

use std::sync::Arc;

use glam::Vec2;
use log::{debug, warn};
use web_time::{Instant, SystemTime};

use crate::app::input::PointerButton;
use crate::assets::{model_stem, AssetReader};
use crate::errors::Result;
use crate::renderer::{HeadlessRenderer, RenderBackend};
use crate::scene::NodeHandle;
use crate::settings::ViewerSettings;

pub use animator::{AnimatorState, AssemblyAnimator};
pub use host::{ResizeSource, SceneHost, SurfaceSize};
pub use loader::{LoadEvent, ModelLoader};
pub use outlines::OutlineOverlays;
pub use parts::{PartContent, PartMetadata, PartRecord, SelectionKey, Vec3Record};
pub use resolver::{LogicalPart, PartResolver};
pub use selection::SurfaceRect;
pub use session::{FileSessionStore, MemorySessionStore, SaveTrigger, SessionPersistence, SessionRecord, SessionStore};

type PartClickHandler = Box<dyn FnMut(Option<&PartRecord>)>;
type ProgressHandler = Box<dyn FnMut(f32)>;

/// One mounted assembly viewer.
pub struct Viewer<B: RenderBackend = HeadlessRenderer> {
    host: SceneHost<B>,
    loader: ModelLoader,
    resolver: PartResolver,
    animator: AssemblyAnimator,
    outlines: OutlineOverlays,
    session: SessionPersistence,

    model_url: Option<String>,
    parts: Vec<PartRecord>,
    selected: Option<SelectionKey>,
    show_outlines: bool,
    progress_dirty: bool,

    on_part_click: Option<PartClickHandler>,
    on_progress_change: Option<ProgressHandler>,
}

impl<B: RenderBackend> Viewer<B> {
    /// Mounts a viewer on `backend`.
    pub fn mount(
        settings: &ViewerSettings,
        backend: B,
        size: SurfaceSize,
        reader: Arc<dyn AssetReader>,
        store: Box<dyn SessionStore>,
    ) -> Self {
        Self {
            host: SceneHost::mount(settings, backend, size),
            loader: ModelLoader::new(reader),
            resolver: PartResolver::new(),
            animator: AssemblyAnimator::new(&settings.assembly),
            outlines: OutlineOverlays::new(),
            session: SessionPersistence::new(store, &settings.session),
            model_url: None,
            parts: Vec::new(),
            selected: None,
            show_outlines: false,
            progress_dirty: false,
            on_part_click: None,
            on_progress_change: None,
        }
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    /// Starts loading a new model. The same URL twice, or no URL, does
    /// nothing.
    pub fn set_model_url(&mut self, url: Option<&str>) {
        if url == self.model_url.as_deref() {
            return;
        }
        self.model_url = url.map(ToString::to_string);
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            return;
        };

        self.session.set_model(&model_stem(url));
        self.resolver.clear();
        self.animator.stop();
        self.loader.request(Some(url));
    }

    /// Loads `url` on the calling thread and runs the model-ready sequence.
    pub fn load_model_blocking(&mut self, url: &str) -> Result<NodeHandle> {
        self.model_url = Some(url.to_string());
        self.session.set_model(&model_stem(url));
        self.resolver.clear();
        self.animator.stop();
        let (scene, settings) = self.host.scene_and_settings();
        let root = self.loader.load_blocking(url, scene, settings)?;
        self.on_model_ready();
        Ok(root)
    }

    pub fn set_parts(&mut self, parts: Vec<PartRecord>) {
        self.parts = parts;
        self.rebind();
    }

    /// `id:<id>` or `mesh:<meshName>`; anything else clears the highlight.
    pub fn set_selected_part_key(&mut self, key: Option<&str>) {
        self.selected = key.and_then(SelectionKey::parse);
        self.refresh_highlight();
    }

    /// Progress in [0, 100]; 0 is assembled.
    pub fn set_assembly_progress(&mut self, progress: f32) {
        if self.animator.set_progress(progress) {
            self.animator.wake(self.loader.is_ready(), &self.resolver);
            self.progress_dirty = true;
        }
    }

    pub fn set_show_outlines(&mut self, show: bool) {
        if self.show_outlines == show {
            return;
        }
        self.show_outlines = show;
        self.sync_outlines();
    }

    pub fn on_part_click(&mut self, handler: impl FnMut(Option<&PartRecord>) + 'static) {
        self.on_part_click = Some(Box::new(handler));
    }

    /// Called with the saved progress when a session is restored.
    pub fn on_assembly_progress_change(&mut self, handler: impl FnMut(f32) + 'static) {
        self.on_progress_change = Some(Box::new(handler));
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn resize(&mut self, source: ResizeSource, size: SurfaceSize) {
        self.host.resize(source, size);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.host.input.handle_cursor_move(x, y);
    }

    pub fn pointer_button(&mut self, button: PointerButton, pressed: bool) {
        self.host.input.handle_button(button, pressed);
    }

    pub fn wheel(&mut self, delta: f32) {
        self.host.input.handle_wheel(delta);
    }

    /// Resolves a click at `client` inside `rect` and reports the part (or
    /// `None` for empty space) to the click handler.
    pub fn pointer_click(&mut self, client: Vec2, rect: SurfaceRect) -> Option<&PartRecord> {
        if self.host.is_torn_down() {
            return None;
        }
        let ndc = rect.to_ndc(client)?;
        let picked = selection::pick(&self.host.scene, &self.host.camera, &self.resolver, &self.parts, ndc);
        match picked {
            Some(record) => debug!("Part clicked: {}", record.mesh_name),
            None => debug!("Empty space clicked"),
        }
        if let Some(handler) = self.on_part_click.as_mut() {
            handler(picked);
        }
        picked
    }

    /// One vsync tick. Returns `false` once the viewer is torn down.
    pub fn frame(&mut self, now: Instant) -> bool {
        if self.host.is_torn_down() {
            return false;
        }
        let (scene, settings) = self.host.scene_and_settings();
        if let Some(event) = self.loader.poll(scene, settings) {
            match event {
                LoadEvent::Ready(_) => self.on_model_ready(),
                LoadEvent::Failed(_) => self.resolver.clear(),
            }
        }

        let Some(tick) = self.host.begin_frame(now) else {
            return false;
        };

        if self.loader.is_ready() {
            if tick.controls_changed {
                self.session.schedule(SaveTrigger::Controls, now);
            }
            if self.progress_dirty {
                self.session.schedule(SaveTrigger::Progress, now);
            }
        }
        self.progress_dirty = false;

        self.animator.tick(&mut self.host.scene, &self.resolver);

        if self.session.poll_due(now).is_some() && self.loader.is_ready() {
            self.save_session();
        }

        self.host.end_frame();
        true
    }

    // ========================================================================
    // Imperative control
    // ========================================================================

    /// Camera back to the default pose; the saved session for this model is
    /// deleted.
    pub fn reset_view(&mut self) {
        self.host.reset_view();
        if let Err(err) = self.session.delete() {
            warn!("Could not delete saved session: {err}");
        }
    }

    /// Stops every loop and releases the host. Idempotent.
    pub fn teardown(&mut self) {
        self.animator.stop();
        self.session.cancel_pending();
        self.host.teardown();
    }

    // ========================================================================
    // Status
    // ========================================================================

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.loader.is_ready()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.loader.error()
    }

    #[must_use]
    pub fn animator_state(&self) -> AnimatorState {
        self.animator.state()
    }

    #[must_use]
    pub fn assembly_progress(&self) -> f32 {
        self.animator.progress()
    }

    #[must_use]
    pub fn parts(&self) -> &[PartRecord] {
        &self.parts
    }

    #[must_use]
    pub fn resolver(&self) -> &PartResolver {
        &self.resolver
    }

    #[must_use]
    pub fn outlines(&self) -> &OutlineOverlays {
        &self.outlines
    }

    #[must_use]
    pub fn session(&self) -> &SessionPersistence {
        &self.session
    }

    #[must_use]
    pub fn host(&self) -> &SceneHost<B> {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut SceneHost<B> {
        &mut self.host
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn on_model_ready(&mut self) {
        self.host.resize_to_mount();
        self.rebind();
        self.sync_outlines();
        self.restore_session();
    }

    /// Rebuilds the binding from scratch, then re-applies dependent state.
    fn rebind(&mut self) {
        let root = if self.loader.is_ready() {
            self.host.model_root()
        } else {
            None
        };
        self.resolver.rebuild(&mut self.host.scene, root, &self.parts);
        self.refresh_highlight();
        self.animator.wake(self.loader.is_ready(), &self.resolver);
    }

    fn refresh_highlight(&mut self) {
        let (scene, settings) = self.host.scene_and_settings();
        selection::apply_highlight(
            scene,
            &self.resolver,
            &self.parts,
            self.selected.as_ref(),
            &settings.highlight,
        );
    }

    fn sync_outlines(&mut self) {
        if !self.loader.is_ready() {
            return;
        }
        let Some(root) = self.host.model_root() else {
            return;
        };
        let (scene, settings) = self.host.scene_and_settings();
        self.outlines.sync(scene, root, self.show_outlines, &settings.outline);
    }

    fn restore_session(&mut self) {
        match self.session.restore() {
            Some(record) => {
                self.host.apply_camera(
                    record.camera.position.into(),
                    record.camera.target.into(),
                    record.effective_zoom(),
                );
                if let (Some(progress), Some(handler)) =
                    (record.progress, self.on_progress_change.as_mut())
                {
                    handler(progress);
                }
            }
            None => self.host.reset_view(),
        }
    }

    fn save_session(&mut self) {
        let record = SessionRecord::capture(
            self.host.camera.position(),
            self.host.controls.target,
            self.host.camera.zoom,
            self.animator.progress(),
            SystemTime::now(),
        );
        if let Err(err) = self.session.save(&record) {
            warn!("Could not save session: {err}");
        }
    }
}
