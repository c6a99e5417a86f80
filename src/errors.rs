//! Error Types
//!
//! This module defines the error types used throughout the viewer core.
//!
//! # Overview
//!
//! The main error type [`ViewerError`] covers the failure modes of the
//! subsystems that can actually fail:
//! - Asset reading and glTF decoding
//! - Session store I/O and (de)serialization
//! - Settings files
//!
//! Missing inputs (no model URL, an empty part list, an unknown selection key)
//! are *not* errors; the dependent stage simply skips.
//!
//! # Usage
//!
//! Fallible APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, ViewerError>`.
//!
//! ```rust,ignore
//! use partscope::errors::Result;
//!
//! fn load_settings(path: &std::path::Path) -> Result<ViewerSettings> {
//!     ViewerSettings::from_json_file(path)
//! }
//! ```

use thiserror::Error;

/// The main error type for the viewer core.
#[derive(Error, Debug)]
pub enum ViewerError {
    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// The requested asset was not found by the reader.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// glTF parsing or buffer resolution error.
    #[error("glTF error: {0}")]
    GltfError(String),

    /// The asset decoded successfully but contains nothing renderable.
    #[error("Model '{0}' contains no meshes")]
    EmptyModel(String),

    /// The background loader went away before delivering a result.
    #[error("Model loader disconnected while loading '{0}'")]
    LoaderDisconnected(String),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// JSON parsing error (part content, session records, settings).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ========================================================================
    // Storage Errors
    // ========================================================================
    /// Session store failure that is not plain I/O.
    #[error("Session store error: {0}")]
    StorageError(String),

    /// Invalid settings value.
    #[error("Invalid settings: {0}")]
    SettingsError(String),
}

impl From<gltf::Error> for ViewerError {
    fn from(err: gltf::Error) -> Self {
        ViewerError::GltfError(err.to_string())
    }
}

/// Alias for `Result<T, ViewerError>`.
pub type Result<T> = std::result::Result<T, ViewerError>;
