//! Rendering seam.
//!
//! The viewer core never rasterizes. Everything that draws goes through
//! [`RenderBackend`]; a GPU frontend implements it, and [`HeadlessRenderer`]
//! stands in when no surface exists (tools, tests, server-side validation).

pub mod headless;

pub use headless::{FrameStats, HeadlessRenderer};

use crate::scene::{Camera, Scene};

/// What the scene host needs from a renderer.
pub trait RenderBackend {
    /// Resizes the drawing buffer. `width`/`height` are CSS pixels, the
    /// backing store is `size * pixel_ratio`.
    fn set_size(&mut self, width: u32, height: u32, pixel_ratio: f32);

    /// Draws one frame. World matrices are up to date when this is called.
    fn render(&mut self, scene: &Scene, camera: &Camera);

    /// Releases GPU resources.
    fn dispose(&mut self);

    /// Removes the drawing surface from its mount point.
    fn detach_surface(&mut self);
}
