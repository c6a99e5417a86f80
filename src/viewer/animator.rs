//! Assembly ↔ explosion motion.
//!
//! Progress 0 is the assembled state (every part at home), progress 100 is
//! fully exploded (`home + direction × strength`). Parts ease toward their
//! target by a fixed fraction per tick, and the animator goes idle by itself
//! once every part has arrived.

use glam::Vec3;
use log::trace;

use crate::scene::Scene;
use crate::settings::AssemblySettings;
use crate::viewer::resolver::{LogicalPart, PartResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimatorState {
    #[default]
    Idle,
    Animating,
}

#[derive(Debug, Clone)]
pub struct AssemblyAnimator {
    progress: f32,
    state: AnimatorState,
    explosion_strength: f32,
    lerp_factor: f32,
    epsilon: f32,
}

impl AssemblyAnimator {
    #[must_use]
    pub fn new(settings: &AssemblySettings) -> Self {
        Self {
            progress: 0.0,
            state: AnimatorState::Idle,
            explosion_strength: settings.explosion_strength,
            lerp_factor: settings.lerp_factor,
            epsilon: settings.epsilon,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> AnimatorState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Stores the clamped progress. Returns whether it changed.
    pub fn set_progress(&mut self, progress: f32) -> bool {
        let clamped = if progress.is_finite() {
            progress.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let changed = clamped != self.progress;
        self.progress = clamped;
        changed
    }

    /// Starts the loop if there is anything to move.
    pub fn wake(&mut self, model_ready: bool, resolver: &PartResolver) {
        if model_ready && !resolver.is_empty() {
            self.state = AnimatorState::Animating;
        }
    }

    pub fn stop(&mut self) {
        self.state = AnimatorState::Idle;
    }

    /// Where `part` heads for a given progress in [0, 100].
    #[must_use]
    pub fn target_for(&self, part: &LogicalPart, progress: f32) -> Vec3 {
        let p = progress.clamp(0.0, 100.0) / 100.0;
        part.home + part.direction * (p * self.explosion_strength)
    }

    /// One animation frame. Moves every bound part and returns the state
    /// after the tick; the loop ends on the tick where nothing is still
    /// further than epsilon from its target.
    pub fn tick(&mut self, scene: &mut Scene, resolver: &PartResolver) -> AnimatorState {
        if self.state == AnimatorState::Idle {
            return self.state;
        }

        let mut moving = false;
        let at_home = self.progress == 0.0;

        for part in resolver.parts() {
            let target = self.target_for(part, self.progress);
            let Some(node) = scene.get_node_mut(part.node) else {
                continue;
            };
            let position = &mut node.transform.position;
            *position = position.lerp(target, self.lerp_factor);

            if position.distance(target) > self.epsilon {
                moving = true;
            } else if at_home {
                *position = part.home;
            }
        }

        if !moving {
            trace!("Assembly animation converged at progress {}", self.progress);
            self.state = AnimatorState::Idle;
        }
        self.state
    }
}
