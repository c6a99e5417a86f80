//! Headless assembly inspector.
//!
//! ```text
//! assembly_inspector <model.glb|model.gltf> [parts.json] [--progress N] [--settings settings.json]
//! ```
//!
//! Loads the model through a file reader, binds the part list, drives the
//! explosion to the requested progress and prints where every part ended
//! up. Sessions are stored under `.partscope/sessions` in the working
//! directory, so a second run restores the camera of the first.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use glam::Vec2;
use log::info;
use partscope::viewer::parts::parse_part_list;
use partscope::{
    AnimatorState, FileAssetReader, FileSessionStore, HeadlessRenderer, SurfaceRect, SurfaceSize,
    Viewer, ViewerSettings,
};
use web_time::Instant;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const FRAME: Duration = Duration::from_millis(16);
const MAX_FRAMES: usize = 5_000;

struct Args {
    model: PathBuf,
    parts: Option<PathBuf>,
    progress: f32,
    settings: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut model = None;
    let mut parts = None;
    let mut progress = 100.0;
    let mut settings = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--progress" => {
                let value = args.next().context("--progress needs a value")?;
                progress = value
                    .parse()
                    .with_context(|| format!("invalid progress '{value}'"))?;
            }
            "--settings" => {
                settings = Some(PathBuf::from(args.next().context("--settings needs a path")?));
            }
            _ if model.is_none() => model = Some(PathBuf::from(arg)),
            _ if parts.is_none() => parts = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument '{arg}'"),
        }
    }

    let Some(model) = model else {
        bail!("usage: assembly_inspector <model> [parts.json] [--progress N] [--settings file]");
    };
    Ok(Args {
        model,
        parts,
        progress,
        settings,
    })
}

fn file_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(ToString::to_string)
        .with_context(|| format!("'{}' has no file name", path.display()))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let settings = match &args.settings {
        Some(path) => ViewerSettings::from_json_file(path)?,
        None => ViewerSettings::default(),
    };

    let reader = FileAssetReader::new(&args.model);
    let mut viewer = Viewer::mount(
        &settings,
        HeadlessRenderer::new(),
        SurfaceSize::new(WIDTH, HEIGHT, 1.0),
        Arc::new(reader),
        Box::new(FileSessionStore::new(".partscope/sessions")),
    );
    viewer.on_assembly_progress_change(|p| info!("Saved session had progress {p}"));

    let uri = file_name(&args.model)?;
    let _ = viewer
        .load_model_blocking(&uri)
        .with_context(|| format!("loading {}", args.model.display()))?;

    if let Some(path) = &args.parts {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        viewer.set_parts(parse_part_list(&json)?);
    }

    println!(
        "{}: {} parts listed, {} bound, {} click targets",
        uri,
        viewer.parts().len(),
        viewer.resolver().len(),
        viewer.resolver().click_targets().len()
    );

    viewer.set_assembly_progress(args.progress);
    let mut now = Instant::now();
    let mut frames = 0;
    loop {
        now += FRAME;
        if !viewer.frame(now) {
            break;
        }
        frames += 1;
        if viewer.animator_state() == AnimatorState::Idle || frames >= MAX_FRAMES {
            break;
        }
    }
    println!("Progress {} reached after {frames} frames", viewer.assembly_progress());

    let scene = &viewer.host().scene;
    for part in viewer.resolver().parts() {
        let record = &viewer.parts()[part.record_index];
        let position = scene
            .get_node(part.node)
            .map(|n| n.transform.position)
            .unwrap_or(part.home);
        println!(
            "  {:<24} id={:<10} home={:.3?} dir={:.3?} now={:.3?} meshes={}",
            part.name,
            record.id.as_deref().unwrap_or("-"),
            part.home.to_array(),
            part.direction.to_array(),
            position.to_array(),
            part.targets.len()
        );
    }

    let rect = SurfaceRect::new(0.0, 0.0, WIDTH as f32, HEIGHT as f32);
    let center = Vec2::new(WIDTH as f32 / 2.0, HEIGHT as f32 / 2.0);
    match viewer.pointer_click(center, rect) {
        Some(record) => println!("Centre of view shows '{}'", record.mesh_name),
        None => println!("Centre of view is empty"),
    }

    viewer.set_show_outlines(true);
    now += FRAME;
    viewer.frame(now);
    let stats = viewer.host().backend().last_frame;
    println!(
        "Last frame: {} meshes, {} outlines, {} lights",
        stats.meshes, stats.outlines, stats.lights
    );

    // Let the debounced session save land before tearing down.
    now += Duration::from_secs(1);
    viewer.frame(now);
    viewer.teardown();
    Ok(())
}
