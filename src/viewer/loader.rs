//! Model loading.
//!
//! Fetching and decoding run on a worker thread; the decoded
//! [`ImportedModel`] comes back over a channel and is installed into the
//! scene by [`ModelLoader::poll`] on the thread that owns the scene. Each
//! request bumps a generation counter so a slow, superseded load can never
//! replace a newer one.

use std::sync::Arc;
use std::thread::JoinHandle;

use glam::Vec3;
use log::{debug, error, info, warn};

use crate::assets::{AssetReader, GltfLoader, ImportedModel};
use crate::errors::{Result, ViewerError};
use crate::scene::{NodeHandle, Scene};
use crate::settings::ViewerSettings;

struct LoadResult {
    generation: u64,
    url: String,
    result: Result<ImportedModel>,
}

/// What a [`ModelLoader::poll`] call changed.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// A model was installed under the returned root.
    Ready(NodeHandle),
    /// The current request failed; the message is user-facing.
    Failed(String),
}

pub struct ModelLoader {
    reader: Arc<dyn AssetReader>,
    url: Option<String>,
    generation: u64,
    loading: bool,
    ready: bool,
    error: Option<String>,
    sender: flume::Sender<LoadResult>,
    receiver: flume::Receiver<LoadResult>,
    worker: Option<JoinHandle<()>>,
}

impl ModelLoader {
    pub fn new(reader: Arc<dyn AssetReader>) -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            reader,
            url: None,
            generation: 0,
            loading: false,
            ready: false,
            error: None,
            sender,
            receiver,
            worker: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn begin(&mut self, url: &str) -> u64 {
        self.generation += 1;
        self.url = Some(url.to_string());
        self.ready = false;
        self.loading = true;
        self.error = None;
        self.generation
    }

    /// Starts loading `url` in the background. An absent or empty URL is
    /// a no-op and returns `false`.
    pub fn request(&mut self, url: Option<&str>) -> bool {
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            return false;
        };
        let generation = self.begin(url);
        info!("Loading model '{url}'");

        let reader = Arc::clone(&self.reader);
        let sender = self.sender.clone();
        let owned_url = url.to_string();
        let spawned = std::thread::Builder::new()
            .name("model-loader".into())
            .spawn(move || {
                let result = GltfLoader::load(reader.as_ref(), &owned_url);
                // The viewer may be gone already; nothing to report to.
                let _ = sender.send(LoadResult {
                    generation,
                    url: owned_url,
                    result,
                });
            });

        match spawned {
            Ok(handle) => self.worker = Some(handle),
            Err(err) => {
                self.fail(url, &ViewerError::IoError(err));
            }
        }
        true
    }

    /// Applies finished loads. Results from superseded requests are dropped.
    pub fn poll(&mut self, scene: &mut Scene, settings: &ViewerSettings) -> Option<LoadEvent> {
        // Sampled before draining: a finished worker has already sent.
        let worker_done = self.worker.as_ref().is_some_and(JoinHandle::is_finished);

        let mut event = None;
        while let Ok(message) = self.receiver.try_recv() {
            if message.generation != self.generation {
                debug!("Discarding stale load of '{}'", message.url);
                continue;
            }
            self.worker = None;
            event = Some(match message.result.and_then(|model| install(scene, &model, settings)) {
                Ok(root) => self.succeed(&message.url, root),
                Err(err) => self.fail(&message.url, &err),
            });
        }

        // A worker that finished without sending has panicked.
        if event.is_none() && self.loading && worker_done && self.worker.is_some() {
            self.worker = None;
            let url = self.url.clone().unwrap_or_default();
            let err = ViewerError::LoaderDisconnected(url.clone());
            event = Some(self.fail(&url, &err));
        }
        event
    }

    /// Loads and installs `url` on the calling thread. Any background load in
    /// flight is superseded.
    pub fn load_blocking(&mut self, url: &str, scene: &mut Scene, settings: &ViewerSettings) -> Result<NodeHandle> {
        self.begin(url);
        self.worker = None;
        match GltfLoader::load(self.reader.as_ref(), url).and_then(|model| install(scene, &model, settings)) {
            Ok(root) => {
                self.succeed(url, root);
                Ok(root)
            }
            Err(err) => {
                self.fail(url, &err);
                Err(err)
            }
        }
    }

    fn succeed(&mut self, url: &str, root: NodeHandle) -> LoadEvent {
        self.loading = false;
        self.ready = true;
        info!("Model '{url}' ready");
        LoadEvent::Ready(root)
    }

    fn fail(&mut self, url: &str, err: &ViewerError) -> LoadEvent {
        error!("Failed to load model '{url}': {err}");
        let message = err.to_string();
        self.loading = false;
        self.ready = false;
        self.error = Some(message.clone());
        LoadEvent::Failed(message)
    }
}

/// Replaces the previous model and fits the new one into a cube of
/// `canonical_size`, centred on the origin.
pub fn install(scene: &mut Scene, model: &ImportedModel, settings: &ViewerSettings) -> Result<NodeHandle> {
    if model.primitive_count() == 0 {
        return Err(ViewerError::EmptyModel(model.source.clone()));
    }

    while let Some(previous) = scene.get_node_by_name(&settings.model_node_name) {
        scene.remove_node(previous);
    }

    let root = model.instantiate(scene, &settings.model_node_name);
    let bounds = scene.world_bounds(root);
    let max_dim = bounds.size().max_element();
    let scale = if max_dim.is_finite() && max_dim > f32::EPSILON {
        settings.canonical_size / max_dim
    } else {
        warn!("Model '{}' has degenerate bounds, keeping scale 1", model.source);
        1.0
    };

    if let Some(node) = scene.get_node_mut(root) {
        node.transform.scale = Vec3::splat(scale);
        node.transform.position = if bounds.is_empty() {
            Vec3::ZERO
        } else {
            -bounds.center() * scale
        };
    }
    scene.update_subtree(root);
    debug!("Normalized '{}' by {scale}", model.source);
    Ok(root)
}
