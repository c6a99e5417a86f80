use log::debug;

use crate::renderer::RenderBackend;
use crate::scene::{Camera, NodeKind, Scene};

/// Counts gathered from the last rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub meshes: usize,
    pub highlighted_meshes: usize,
    pub outlines: usize,
    pub lights: usize,
}

/// Backend that walks the visible scene instead of drawing it.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
    pub frames_rendered: u64,
    pub last_frame: FrameStats,
    pub dispose_count: u32,
    pub detach_count: u32,
}

impl HeadlessRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pixel_ratio: 1.0,
            ..Default::default()
        }
    }

    /// Backing-store size in physical pixels.
    #[must_use]
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.pixel_ratio).round() as u32,
            (self.height as f32 * self.pixel_ratio).round() as u32,
        )
    }
}

impl RenderBackend for HeadlessRenderer {
    fn set_size(&mut self, width: u32, height: u32, pixel_ratio: f32) {
        self.width = width;
        self.height = height;
        self.pixel_ratio = pixel_ratio;
    }

    fn render(&mut self, scene: &Scene, _camera: &Camera) {
        let mut stats = FrameStats::default();
        // Hidden nodes hide their whole subtree.
        let mut stack: Vec<_> = scene.root_nodes.clone();
        while let Some(handle) = stack.pop() {
            let Some(node) = scene.get_node(handle) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            match &node.kind {
                NodeKind::Mesh(mesh) => {
                    stats.meshes += 1;
                    if mesh.material.is_emissive() {
                        stats.highlighted_meshes += 1;
                    }
                }
                NodeKind::Outline(_) => stats.outlines += 1,
                NodeKind::Light(_) => stats.lights += 1,
                NodeKind::Group | NodeKind::Grid(_) => {}
            }
            stack.extend_from_slice(node.children());
        }
        self.last_frame = stats;
        self.frames_rendered += 1;
    }

    fn dispose(&mut self) {
        debug!("Headless renderer disposed");
        self.dispose_count += 1;
    }

    fn detach_surface(&mut self) {
        self.detach_count += 1;
    }
}
