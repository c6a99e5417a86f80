//! Viewer Tests
//!
//! End-to-end behaviour of a mounted [`Viewer`] on the headless backend:
//! - Mount, sizing and pixel-ratio clamping
//! - Model loading (blocking and per-frame) and part binding
//! - Explosion through the frame loop
//! - Highlight, click reporting, outlines
//! - Session save/restore/reset
//! - Teardown

mod common;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use partscope::assets::MemoryAssetReader;
use partscope::renderer::HeadlessRenderer;
use partscope::settings::ViewerSettings;
use partscope::viewer::parts::parse_part_list;
use partscope::viewer::{
    AnimatorState, MemorySessionStore, ResizeSource, SessionRecord, SessionStore, SurfaceRect,
    SurfaceSize, Viewer,
};
use partscope::PointerButton;
use web_time::{Duration, Instant};

use common::{assembly_gltf, init_logging, ASSEMBLY_PARTS_JSON};

// ============================================================================
// Helper
// ============================================================================

const MODEL_URL: &str = "models/assembly.gltf";
const SESSION_KEY: &str = "viewer_assembly";
const FRAME: Duration = Duration::from_millis(16);

fn vec3_approx(a: Vec3, b: Vec3, eps: f32) -> bool {
    (a - b).abs().max_element() < eps
}

fn surface() -> SurfaceSize {
    SurfaceSize::new(800, 600, 1.0)
}

fn rect() -> SurfaceRect {
    SurfaceRect::new(0.0, 0.0, 800.0, 600.0)
}

fn mount() -> Viewer {
    mount_with_store(MemorySessionStore::new())
}

fn mount_with_store(store: MemorySessionStore) -> Viewer {
    init_logging();
    let reader = MemoryAssetReader::new().with(MODEL_URL, assembly_gltf());
    Viewer::mount(
        &ViewerSettings::default(),
        HeadlessRenderer::new(),
        surface(),
        Arc::new(reader),
        Box::new(store),
    )
}

/// Mounted viewer with the assembly loaded and its part list applied.
fn loaded() -> Viewer {
    let mut viewer = mount();
    let _ = viewer.load_model_blocking(MODEL_URL).unwrap();
    viewer.set_parts(parse_part_list(ASSEMBLY_PARTS_JSON).unwrap());
    viewer
}

fn position_of(viewer: &Viewer, name: &str) -> Vec3 {
    let scene = &viewer.host().scene;
    let handle = scene.get_node_by_name(name).unwrap();
    scene.get_node(handle).unwrap().transform.position
}

/// Client coordinates of a world point inside [`rect`].
fn client_of(viewer: &Viewer, world: Vec3) -> Vec2 {
    let ndc = viewer.host().camera.project(world);
    Vec2::new((ndc.x + 1.0) * 0.5 * 800.0, (1.0 - ndc.y) * 0.5 * 600.0)
}

fn world_center_of(viewer: &Viewer, name: &str) -> Vec3 {
    let scene = &viewer.host().scene;
    let handle = scene.get_node_by_name(name).unwrap();
    scene.world_bounds(handle).center()
}

/// Runs frames 16ms apart until the animator settles.
fn run_until_idle(viewer: &mut Viewer, mut now: Instant) -> Instant {
    for _ in 0..2_000 {
        now += FRAME;
        assert!(viewer.frame(now));
        if viewer.animator_state() == AnimatorState::Idle {
            return now;
        }
    }
    panic!("animation did not settle");
}

fn saved_record(viewer: &Viewer) -> Option<SessionRecord> {
    let raw = viewer.session().store().get(SESSION_KEY).unwrap()?;
    Some(serde_json::from_str(&raw).unwrap())
}

// ============================================================================
// Mount & sizing
// ============================================================================

#[test]
fn mount_builds_lights_grid_and_sizes_backend() {
    let mut viewer = mount();

    assert!(viewer.host().scene.get_node_by_name("ambientLight").is_some());
    assert!(viewer.host().scene.get_node_by_name("grid").is_some());
    assert_eq!(viewer.host().backend().width, 800);
    assert_eq!(viewer.host().backend().height, 600);
    assert!(viewer.host().render_loop().is_running());

    assert!(viewer.frame(Instant::now()));
    assert_eq!(viewer.host().backend().last_frame.lights, 3);
    assert_eq!(viewer.host().backend().last_frame.meshes, 0);
    assert_eq!(viewer.host().render_loop().frames(), 1);
}

#[test]
fn pixel_ratio_is_clamped() {
    let mut viewer = mount();
    viewer.resize(ResizeSource::Window, SurfaceSize::new(400, 300, 3.0));

    let backend = viewer.host().backend();
    assert_eq!(backend.pixel_ratio, 2.0);
    assert_eq!(backend.drawing_buffer_size(), (800, 600));
    assert!((viewer.host().camera.aspect - 4.0 / 3.0).abs() < 1e-6);
}

#[test]
fn zero_size_is_ignored() {
    let mut viewer = mount();
    viewer.resize(ResizeSource::Layout, SurfaceSize::new(0, 300, 1.0));

    assert_eq!(viewer.host().backend().width, 800);

    viewer.resize(ResizeSource::Layout, SurfaceSize::new(1000, 500, 1.0));
    assert_eq!(viewer.host().backend().width, 1000);
    assert!((viewer.host().camera.aspect - 2.0).abs() < 1e-6);
}

// ============================================================================
// Loading & binding
// ============================================================================

#[test]
fn blocking_load_binds_parts() {
    let viewer = loaded();

    assert!(viewer.is_ready());
    assert!(!viewer.is_loading());
    assert_eq!(viewer.error(), None);
    assert_eq!(viewer.resolver().len(), 3);
    assert_eq!(viewer.resolver().click_targets().len(), 4);
    assert!(viewer.resolver().logical_part_by_name("Shaft").is_some());
}

#[test]
fn parts_set_before_the_model_bind_once_it_lands() {
    let mut viewer = mount();
    viewer.set_parts(parse_part_list(ASSEMBLY_PARTS_JSON).unwrap());
    viewer.set_model_url(Some(MODEL_URL));
    assert!(viewer.is_loading());
    assert!(viewer.resolver().is_empty());

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
    let mut now = Instant::now();
    while !viewer.is_ready() {
        assert!(std::time::Instant::now() < deadline, "model never became ready");
        now += FRAME;
        viewer.frame(now);
        std::thread::sleep(std::time::Duration::from_millis(2));
    }

    assert_eq!(viewer.resolver().len(), 3);
    assert!(viewer.host().model_root().is_some());
}

#[test]
fn failed_load_reports_error() {
    let mut viewer = mount();
    viewer.set_model_url(Some("models/missing.glb"));

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
    let mut now = Instant::now();
    while viewer.is_loading() {
        assert!(std::time::Instant::now() < deadline, "load never finished");
        now += FRAME;
        viewer.frame(now);
        std::thread::sleep(std::time::Duration::from_millis(2));
    }

    assert!(!viewer.is_ready());
    assert!(viewer.error().unwrap().contains("missing.glb"));
    assert!(viewer.host().model_root().is_none());
}

#[test]
fn same_or_missing_url_does_not_reload() {
    let mut viewer = mount();
    viewer.set_model_url(None);
    assert!(!viewer.is_loading());

    viewer.set_model_url(Some(MODEL_URL));
    assert!(viewer.is_loading());
    viewer.set_model_url(Some(MODEL_URL));
    assert_eq!(viewer.session().key(), Some(SESSION_KEY));
}

// ============================================================================
// Explosion
// ============================================================================

#[test]
fn explode_and_reassemble_through_frames() {
    let mut viewer = loaded();
    let now = Instant::now();

    viewer.set_assembly_progress(100.0);
    assert_eq!(viewer.animator_state(), AnimatorState::Animating);
    let now = run_until_idle(&mut viewer, now);

    assert!(vec3_approx(position_of(&viewer, "Housing"), Vec3::new(0.0, 0.1, 0.0), 1e-3));
    assert!(vec3_approx(position_of(&viewer, "Gear"), Vec3::new(2.1, 0.0, 0.0), 1e-3));
    // No declared vector: travels away from the origin.
    assert!(vec3_approx(position_of(&viewer, "Shaft"), Vec3::new(-2.1, 0.0, 0.0), 1e-3));

    viewer.set_assembly_progress(0.0);
    run_until_idle(&mut viewer, now);

    assert_eq!(position_of(&viewer, "Housing"), Vec3::ZERO);
    assert_eq!(position_of(&viewer, "Gear"), Vec3::new(2.0, 0.0, 0.0));
    assert_eq!(position_of(&viewer, "Shaft"), Vec3::new(-2.0, 0.0, 0.0));
}

#[test]
fn progress_before_model_is_kept() {
    let mut viewer = mount();
    viewer.set_assembly_progress(100.0);
    assert_eq!(viewer.animator_state(), AnimatorState::Idle);
    assert_eq!(viewer.assembly_progress(), 100.0);

    let _ = viewer.load_model_blocking(MODEL_URL).unwrap();
    viewer.set_parts(parse_part_list(ASSEMBLY_PARTS_JSON).unwrap());
    assert_eq!(viewer.animator_state(), AnimatorState::Animating);
}

#[test]
fn rebinding_an_exploded_part_keeps_its_model_home() -> anyhow::Result<()> {
    let mut viewer = mount();
    viewer.load_model_blocking(MODEL_URL)?;
    let parts = r#"[{"meshName":"Gear","content":{"explodeVector":{"x":1,"y":0,"z":0}}}]"#;
    viewer.set_parts(parse_part_list(parts)?);
    let installed = position_of(&viewer, "Gear");

    viewer.set_assembly_progress(100.0);
    let now = run_until_idle(&mut viewer, Instant::now());
    assert!(!vec3_approx(position_of(&viewer, "Gear"), installed, 1e-3));

    viewer.set_parts(parse_part_list(parts)?);
    let home = viewer.resolver().logical_part_by_name("Gear").unwrap().home;
    assert_eq!(home, installed);

    viewer.set_assembly_progress(0.0);
    run_until_idle(&mut viewer, now);
    assert_eq!(position_of(&viewer, "Gear"), installed);
    Ok(())
}

// ============================================================================
// Highlight & clicks
// ============================================================================

#[test]
fn selected_part_is_highlighted() {
    let mut viewer = loaded();

    viewer.set_selected_part_key(Some("id:gear-7"));
    assert!(viewer.frame(Instant::now()));
    assert_eq!(viewer.host().backend().last_frame.meshes, 4);
    assert_eq!(viewer.host().backend().last_frame.highlighted_meshes, 1);

    viewer.set_selected_part_key(Some("mesh:Shaft"));
    assert!(viewer.frame(Instant::now() + FRAME));
    assert_eq!(viewer.host().backend().last_frame.highlighted_meshes, 2);

    viewer.set_selected_part_key(Some("bogus"));
    assert!(viewer.frame(Instant::now() + FRAME * 2));
    assert_eq!(viewer.host().backend().last_frame.highlighted_meshes, 0);
}

#[test]
fn highlight_survives_a_new_part_list() {
    let mut viewer = loaded();
    viewer.set_selected_part_key(Some("mesh:Housing"));

    viewer.set_parts(parse_part_list(ASSEMBLY_PARTS_JSON).unwrap());
    assert!(viewer.frame(Instant::now()));

    assert_eq!(viewer.host().backend().last_frame.highlighted_meshes, 1);
}

#[test]
fn click_reports_part_to_handler() {
    let mut viewer = loaded();
    let clicks: Rc<RefCell<Vec<Option<String>>>> = Rc::default();
    let sink = Rc::clone(&clicks);
    viewer.on_part_click(move |record| {
        sink.borrow_mut().push(record.map(|r| r.mesh_name.clone()));
    });

    let gear = client_of(&viewer, world_center_of(&viewer, "Gear"));
    let record = viewer.pointer_click(gear, rect()).unwrap();
    assert_eq!(record.id.as_deref(), Some("gear-7"));

    viewer.pointer_click(Vec2::new(1.0, 1.0), rect());

    assert_eq!(*clicks.borrow(), vec![Some("Gear".to_string()), None]);
}

#[test]
fn click_on_sub_mesh_reports_owning_part() {
    let mut viewer = loaded();
    let shaft = client_of(&viewer, world_center_of(&viewer, "Node_4_primitive0"));

    let record = viewer.pointer_click(shaft, rect()).unwrap();
    assert_eq!(record.mesh_name, "Shaft");
    assert_eq!(record.id.as_deref(), Some("3"));
}

// ============================================================================
// Outlines
// ============================================================================

#[test]
fn outlines_are_built_on_first_show_and_toggled_after() {
    let mut viewer = loaded();
    assert!(viewer.outlines().is_empty());

    viewer.set_show_outlines(true);
    assert_eq!(viewer.outlines().len(), 4);
    assert!(viewer.frame(Instant::now()));
    assert_eq!(viewer.host().backend().last_frame.outlines, 4);

    viewer.set_show_outlines(false);
    assert_eq!(viewer.outlines().len(), 4);
    assert!(viewer.frame(Instant::now() + FRAME));
    assert_eq!(viewer.host().backend().last_frame.outlines, 0);
}

#[test]
fn outlines_follow_a_reload() {
    let mut viewer = loaded();
    viewer.set_show_outlines(true);

    let _ = viewer.load_model_blocking(MODEL_URL).unwrap();

    assert_eq!(viewer.outlines().len(), 4);
    assert!(viewer.frame(Instant::now()));
    assert_eq!(viewer.host().backend().last_frame.outlines, 4);
}

// ============================================================================
// Session
// ============================================================================

#[test]
fn camera_change_is_saved_after_debounce() {
    let mut viewer = loaded();
    let t0 = Instant::now();
    assert!(viewer.frame(t0));
    viewer.frame(t0 + Duration::from_secs(1));

    viewer.wheel(2.0);
    let t1 = t0 + Duration::from_secs(2);
    assert!(viewer.frame(t1));
    let camera = viewer.host().camera.position();
    viewer.frame(t1 + Duration::from_millis(100));
    let early = saved_record(&viewer).map(|r| Vec3::from(r.camera.position));
    assert!(early.map_or(true, |p| !vec3_approx(p, camera, 1e-3)));

    viewer.frame(t1 + Duration::from_millis(400));
    let record = saved_record(&viewer).unwrap();
    assert!(vec3_approx(record.camera.position.into(), camera, 1e-4));
    assert_eq!(record.progress, Some(0.0));
}

#[test]
fn progress_change_is_saved() {
    let mut viewer = loaded();
    let t0 = Instant::now();

    viewer.set_assembly_progress(60.0);
    let mut now = t0;
    while now < t0 + Duration::from_millis(700) {
        now += FRAME;
        viewer.frame(now);
    }

    assert_eq!(saved_record(&viewer).unwrap().progress, Some(60.0));
}

#[test]
fn reload_restores_camera_and_reports_progress() {
    let mut viewer = loaded();
    let reported: Rc<RefCell<Vec<f32>>> = Rc::default();
    let sink = Rc::clone(&reported);
    viewer.on_assembly_progress_change(move |p| sink.borrow_mut().push(p));

    viewer.set_assembly_progress(40.0);
    viewer.pointer_move(400.0, 300.0);
    viewer.pointer_button(PointerButton::Primary, true);
    viewer.pointer_move(460.0, 300.0);
    let t0 = Instant::now();
    viewer.frame(t0);
    viewer.pointer_button(PointerButton::Primary, false);
    let mut now = t0;
    // Damped rotation keeps rescheduling the save until it settles.
    while now < t0 + Duration::from_secs(10) {
        now += FRAME;
        viewer.frame(now);
    }
    let saved = saved_record(&viewer).unwrap();

    let _ = viewer.load_model_blocking(MODEL_URL).unwrap();

    assert_eq!(*reported.borrow(), vec![40.0]);
    assert!(vec3_approx(
        viewer.host().camera.position(),
        saved.camera.position.into(),
        1e-3
    ));
    assert!(vec3_approx(
        viewer.host().controls.target,
        saved.camera.target.into(),
        1e-4
    ));
}

#[test]
fn reset_view_restores_default_pose_and_deletes_session() {
    let mut viewer = loaded();
    viewer.set_assembly_progress(20.0);
    let t0 = Instant::now();
    let mut now = t0;
    while now < t0 + Duration::from_millis(700) {
        now += FRAME;
        viewer.frame(now);
    }
    assert!(saved_record(&viewer).is_some());

    viewer.reset_view();

    assert!(saved_record(&viewer).is_none());
    let defaults = ViewerSettings::default().camera;
    assert!(vec3_approx(viewer.host().camera.position(), defaults.default_position, 1e-4));
    assert!(vec3_approx(viewer.host().controls.target, defaults.default_target, 1e-6));
    assert_eq!(viewer.host().camera.zoom, 1.0);
}

#[test]
fn fresh_model_without_session_starts_at_default_pose() {
    let mut viewer = mount();
    viewer.host_mut().apply_camera(Vec3::new(0.0, 9.0, 1.0), Vec3::ONE, 2.0);

    let _ = viewer.load_model_blocking(MODEL_URL).unwrap();

    let defaults = ViewerSettings::default().camera;
    assert!(vec3_approx(viewer.host().camera.position(), defaults.default_position, 1e-4));
    assert_eq!(viewer.host().camera.zoom, 1.0);
}

#[test]
fn session_without_progress_leaves_progress_alone() -> anyhow::Result<()> {
    let mut store = MemorySessionStore::new();
    store.set(
        SESSION_KEY,
        r#"{"camera":{"position":{"x":0,"y":3,"z":4},"target":{"x":0,"y":0,"z":0},"zoom":1}}"#,
    )?;
    let mut viewer = mount_with_store(store);
    let reported: Rc<RefCell<Vec<f32>>> = Rc::default();
    let sink = Rc::clone(&reported);
    viewer.on_assembly_progress_change(move |p| sink.borrow_mut().push(p));

    viewer.load_model_blocking(MODEL_URL)?;

    assert!(reported.borrow().is_empty());
    assert!(vec3_approx(viewer.host().camera.position(), Vec3::new(0.0, 3.0, 4.0), 1e-3));
    Ok(())
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn teardown_is_idempotent_and_stops_everything() {
    let mut viewer = loaded();
    viewer.set_assembly_progress(100.0);

    viewer.teardown();
    viewer.teardown();

    let backend = viewer.host().backend();
    assert_eq!(backend.dispose_count, 1);
    assert_eq!(backend.detach_count, 1);
    assert!(viewer.host().is_torn_down());
    assert!(viewer.host().controls.is_disposed());
    assert_eq!(viewer.animator_state(), AnimatorState::Idle);

    assert!(!viewer.frame(Instant::now()));
    assert_eq!(viewer.host().render_loop().frames(), 0);

    viewer.resize(ResizeSource::Window, SurfaceSize::new(1920, 1080, 1.0));
    assert_eq!(viewer.host().backend().width, 800);

    let gear = client_of(&viewer, world_center_of(&viewer, "Gear"));
    assert!(viewer.pointer_click(gear, rect()).is_none());
    assert!(!viewer.session().has_pending_save());
}

#[test]
fn load_finishing_after_teardown_is_dropped() {
    let mut viewer = mount();
    let reported: Rc<RefCell<Vec<f32>>> = Rc::default();
    let sink = Rc::clone(&reported);
    viewer.on_assembly_progress_change(move |p| sink.borrow_mut().push(p));
    viewer.set_parts(parse_part_list(ASSEMBLY_PARTS_JSON).unwrap());
    viewer.set_model_url(Some(MODEL_URL));

    viewer.teardown();
    std::thread::sleep(std::time::Duration::from_millis(200));
    let mut now = Instant::now();
    for _ in 0..10 {
        now += FRAME;
        assert!(!viewer.frame(now));
    }

    assert!(viewer.host().model_root().is_none());
    assert!(viewer.resolver().is_empty());
    assert!(reported.borrow().is_empty());
}
