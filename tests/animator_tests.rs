//! Assembly Animator Tests
//!
//! Tests for:
//! - Progress clamping and change detection
//! - Target positions along the explosion direction
//! - Exponential easing per tick and convergence to idle
//! - Exact return to home at progress 0
//! - Wake conditions

use std::sync::Arc;

use glam::Vec3;
use partscope::resources::{Geometry, Material, Mesh};
use partscope::scene::{Node, NodeHandle, NodeKind, Scene};
use partscope::settings::AssemblySettings;
use partscope::viewer::animator::{AnimatorState, AssemblyAnimator};
use partscope::viewer::parts::PartRecord;
use partscope::viewer::resolver::PartResolver;

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;
const MAX_TICKS: usize = 2_000;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

fn cube(name: &str) -> Node {
    Node::with_kind(
        name,
        NodeKind::Mesh(Mesh::new(
            Arc::new(Geometry::new_box(Vec3::ONE)),
            Material::default(),
        )),
    )
}

struct Rig {
    scene: Scene,
    resolver: PartResolver,
    lid: NodeHandle,
    base: NodeHandle,
}

/// Two parts: `Lid` homed at (0, 1, 0) exploding along +Y, `Base` homed at
/// the origin exploding along (-3, 0, 0).
fn rig() -> Rig {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("loadedModel"));
    let lid = scene.add_to_parent(cube("Lid"), root);
    let base = scene.add_to_parent(cube("Base"), root);
    scene.update_matrix_world();

    let records = vec![
        PartRecord::new("Lid").with_layout(Vec3::new(0.0, 1.0, 0.0), Vec3::Y),
        PartRecord::new("Base").with_layout(Vec3::ZERO, Vec3::new(-3.0, 0.0, 0.0)),
    ];
    let mut resolver = PartResolver::new();
    resolver.rebuild(&mut scene, Some(root), &records);

    Rig {
        scene,
        resolver,
        lid,
        base,
    }
}

fn position_of(scene: &Scene, handle: NodeHandle) -> Vec3 {
    scene.get_node(handle).unwrap().transform.position
}

/// Ticks until idle; returns the number of ticks taken.
fn run_to_idle(animator: &mut AssemblyAnimator, rig: &mut Rig) -> usize {
    for n in 1..=MAX_TICKS {
        if animator.tick(&mut rig.scene, &rig.resolver) == AnimatorState::Idle {
            return n;
        }
    }
    panic!("animator did not converge within {MAX_TICKS} ticks");
}

// ============================================================================
// Progress
// ============================================================================

#[test]
fn progress_is_clamped() {
    let mut animator = AssemblyAnimator::new(&AssemblySettings::default());

    assert!(animator.set_progress(150.0));
    assert_eq!(animator.progress(), 100.0);

    assert!(animator.set_progress(-20.0));
    assert_eq!(animator.progress(), 0.0);

    assert!(animator.set_progress(55.5));
    assert!(!animator.set_progress(55.5));
}

#[test]
fn non_finite_progress_reads_as_assembled() {
    let mut animator = AssemblyAnimator::new(&AssemblySettings::default());
    animator.set_progress(40.0);
    assert!(animator.set_progress(f32::NAN));
    assert_eq!(animator.progress(), 0.0);
}

#[test]
fn targets_scale_with_progress() {
    let r = rig();
    let animator = AssemblyAnimator::new(&AssemblySettings::default());
    let base = r.resolver.logical_part_by_name("Base").unwrap();
    let lid = r.resolver.logical_part_by_name("Lid").unwrap();

    assert!(vec3_approx(animator.target_for(base, 0.0), Vec3::ZERO));
    assert!(vec3_approx(animator.target_for(base, 100.0), Vec3::new(-0.3, 0.0, 0.0)));
    assert!(vec3_approx(animator.target_for(lid, 50.0), Vec3::new(0.0, 1.05, 0.0)));
    // Out-of-range progress is clamped here too.
    assert!(vec3_approx(animator.target_for(lid, 400.0), Vec3::new(0.0, 1.1, 0.0)));
}

#[test]
fn explosion_strength_is_configurable() {
    let r = rig();
    let animator = AssemblyAnimator::new(&AssemblySettings {
        explosion_strength: 2.0,
        ..Default::default()
    });
    let lid = r.resolver.logical_part_by_name("Lid").unwrap();
    assert!(vec3_approx(animator.target_for(lid, 100.0), Vec3::new(0.0, 3.0, 0.0)));
}

// ============================================================================
// Ticking
// ============================================================================

#[test]
fn wake_requires_ready_model_and_parts() {
    let r = rig();
    let mut animator = AssemblyAnimator::new(&AssemblySettings::default());

    animator.wake(false, &r.resolver);
    assert_eq!(animator.state(), AnimatorState::Idle);

    animator.wake(true, &PartResolver::new());
    assert_eq!(animator.state(), AnimatorState::Idle);

    animator.wake(true, &r.resolver);
    assert_eq!(animator.state(), AnimatorState::Animating);
}

#[test]
fn idle_animator_leaves_scene_alone() {
    let mut r = rig();
    let mut animator = AssemblyAnimator::new(&AssemblySettings::default());
    animator.set_progress(100.0);

    assert_eq!(animator.tick(&mut r.scene, &r.resolver), AnimatorState::Idle);
    assert!(vec3_approx(position_of(&r.scene, r.lid), Vec3::new(0.0, 1.0, 0.0)));
}

#[test]
fn first_tick_moves_five_percent_of_the_way() {
    let mut r = rig();
    let mut animator = AssemblyAnimator::new(&AssemblySettings::default());
    animator.set_progress(100.0);
    animator.wake(true, &r.resolver);

    assert_eq!(animator.tick(&mut r.scene, &r.resolver), AnimatorState::Animating);

    // Base: 0 → -0.3, 5% is -0.015.
    assert!(vec3_approx(position_of(&r.scene, r.base), Vec3::new(-0.015, 0.0, 0.0)));
    assert!(vec3_approx(position_of(&r.scene, r.lid), Vec3::new(0.0, 1.005, 0.0)));
}

#[test]
fn explode_converges_and_goes_idle() {
    let mut r = rig();
    let mut animator = AssemblyAnimator::new(&AssemblySettings::default());
    animator.set_progress(100.0);
    animator.wake(true, &r.resolver);

    let ticks = run_to_idle(&mut animator, &mut r);

    assert!(ticks > 10, "converged suspiciously fast ({ticks} ticks)");
    let base = position_of(&r.scene, r.base);
    assert!(base.distance(Vec3::new(-0.3, 0.0, 0.0)) <= 1e-4);
    let lid = position_of(&r.scene, r.lid);
    assert!(lid.distance(Vec3::new(0.0, 1.1, 0.0)) <= 1e-4);
    assert_eq!(animator.state(), AnimatorState::Idle);
}

#[test]
fn reassembly_snaps_exactly_home() {
    let mut r = rig();
    let mut animator = AssemblyAnimator::new(&AssemblySettings::default());
    animator.set_progress(100.0);
    animator.wake(true, &r.resolver);
    run_to_idle(&mut animator, &mut r);

    animator.set_progress(0.0);
    animator.wake(true, &r.resolver);
    run_to_idle(&mut animator, &mut r);

    assert_eq!(position_of(&r.scene, r.base), Vec3::ZERO);
    assert_eq!(position_of(&r.scene, r.lid), Vec3::new(0.0, 1.0, 0.0));
}

#[test]
fn retarget_mid_flight_continues_from_current_position() {
    let mut r = rig();
    let mut animator = AssemblyAnimator::new(&AssemblySettings::default());
    animator.set_progress(100.0);
    animator.wake(true, &r.resolver);
    for _ in 0..20 {
        animator.tick(&mut r.scene, &r.resolver);
    }
    let midway = position_of(&r.scene, r.base);
    assert!(midway.x < 0.0 && midway.x > -0.3);

    animator.set_progress(50.0);
    animator.tick(&mut r.scene, &r.resolver);
    let next = position_of(&r.scene, r.base);
    let expected = midway.lerp(Vec3::new(-0.15, 0.0, 0.0), 0.05);
    assert!(vec3_approx(next, expected));
}

#[test]
fn stop_freezes_parts() {
    let mut r = rig();
    let mut animator = AssemblyAnimator::new(&AssemblySettings::default());
    animator.set_progress(100.0);
    animator.wake(true, &r.resolver);
    animator.tick(&mut r.scene, &r.resolver);
    let frozen = position_of(&r.scene, r.base);

    animator.stop();
    animator.tick(&mut r.scene, &r.resolver);

    assert_eq!(position_of(&r.scene, r.base), frozen);
}

#[test]
fn removed_nodes_are_skipped() {
    let mut r = rig();
    let mut animator = AssemblyAnimator::new(&AssemblySettings::default());
    animator.set_progress(100.0);
    animator.wake(true, &r.resolver);

    r.scene.remove_node(r.lid);
    run_to_idle(&mut animator, &mut r);

    assert!(position_of(&r.scene, r.base).distance(Vec3::new(-0.3, 0.0, 0.0)) <= 1e-4);
}
