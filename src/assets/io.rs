use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::errors::{Result, ViewerError};

/// Source of raw asset bytes.
///
/// Readers are shared with the background loader thread, hence
/// `Send + Sync`.
pub trait AssetReader: Send + Sync {
    /// Reads the resource named by `uri` in full.
    fn read_bytes(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Local file reader rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    /// A file path roots the reader at its parent directory.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.root_path.join(uri.trim_start_matches('/'));
        match std::fs::read(&path) {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ViewerError::AssetNotFound(path.display().to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory reader keyed by exact URI. Handy for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetReader {
    entries: FxHashMap<String, Vec<u8>>,
}

impl MemoryAssetReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(uri.into(), bytes);
    }

    #[must_use]
    pub fn with(mut self, uri: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(uri, bytes);
        self
    }
}

impl AssetReader for MemoryAssetReader {
    fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        self.entries
            .get(uri)
            .cloned()
            .ok_or_else(|| ViewerError::AssetNotFound(uri.to_string()))
    }
}

/// Last path segment of a URL or file path, query and fragment stripped.
#[must_use]
pub fn source_filename(source: &str) -> &str {
    let source = source.split(['?', '#']).next().unwrap_or(source);
    source.rsplit(['/', '\\']).next().unwrap_or(source)
}

/// Model identity used for session keys: the file name up to its first dot,
/// or `"default"` when the URL has no usable file name.
#[must_use]
pub fn model_stem(url: &str) -> String {
    let stem = source_filename(url).split('.').next().unwrap_or_default();
    if stem.is_empty() {
        "default".to_string()
    } else {
        stem.to_string()
    }
}

/// Resolves `relative` against the directory of `base` (both URI-style).
#[must_use]
pub fn resolve_relative(base: &str, relative: &str) -> String {
    match base.rfind('/') {
        Some(idx) => format!("{}{}", &base[..=idx], relative),
        None => relative.to_string(),
    }
}
