//! Per-model view sessions.
//!
//! The camera pose and assembly progress are saved under `viewer_<stem>`
//! in a small key-value store and restored when the same model becomes
//! ready again. Writes are debounced through a [`DelayedTask`].

use std::path::{Path, PathBuf};

use glam::Vec3;
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::errors::{Result, ViewerError};
use crate::settings::SessionSettings;
use crate::viewer::parts::Vec3Record;
use crate::viewer::scheduler::DelayedTask;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub position: Vec3Record,
    pub target: Vec3Record,
    /// 0 or missing means 1.
    #[serde(default)]
    pub zoom: f32,
}

/// Stored value: `{camera:{position,target,zoom},progress,lastSeen}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub camera: CameraRecord,
    /// Absent in records written without an assembly slider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    #[serde(default)]
    pub last_seen: String,
}

impl SessionRecord {
    #[must_use]
    pub fn capture(position: Vec3, target: Vec3, zoom: f32, progress: f32, at: SystemTime) -> Self {
        Self {
            camera: CameraRecord {
                position: position.into(),
                target: target.into(),
                zoom,
            },
            progress: Some(progress),
            last_seen: format_iso8601(at),
        }
    }

    #[must_use]
    pub fn effective_zoom(&self) -> f32 {
        if self.camera.zoom.is_finite() && self.camera.zoom != 0.0 {
            self.camera.zoom
        } else {
            1.0
        }
    }
}

// ============================================================================
// Stores
// ============================================================================

/// String key-value store holding serialized sessions.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per session in a directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    base_dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || matches!(c, '_' | '-') { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{file}.json"))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.resolve(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir).map_err(|e| {
            ViewerError::StorageError(format!("cannot create {}: {e}", self.base_dir.display()))
        })?;
        std::fs::write(self.resolve(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.resolve(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: FxHashMap<String, String>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// Why a save was requested; selects the debounce delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    Controls,
    Progress,
}

/// Session bookkeeping for the current model.
pub struct SessionPersistence {
    store: Box<dyn SessionStore>,
    key_prefix: String,
    key: Option<String>,
    pending: DelayedTask<SaveTrigger>,
    controls_delay: Duration,
    progress_delay: Duration,
}

impl SessionPersistence {
    pub fn new(store: Box<dyn SessionStore>, settings: &SessionSettings) -> Self {
        Self {
            store,
            key_prefix: settings.key_prefix.clone(),
            key: None,
            pending: DelayedTask::new(),
            controls_delay: Duration::from_millis(settings.controls_debounce_ms),
            progress_delay: Duration::from_millis(settings.progress_debounce_ms),
        }
    }

    /// Switches to the model identified by `stem`. A save still pending for
    /// the previous model is dropped.
    pub fn set_model(&mut self, stem: &str) {
        self.pending.cancel();
        self.key = Some(format!("{}{stem}", self.key_prefix));
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[must_use]
    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    pub fn schedule(&mut self, trigger: SaveTrigger, now: Instant) {
        if self.key.is_none() {
            return;
        }
        let delay = match trigger {
            SaveTrigger::Controls => self.controls_delay,
            SaveTrigger::Progress => self.progress_delay,
        };
        self.pending.schedule(now, delay, trigger);
    }

    #[must_use]
    pub fn has_pending_save(&self) -> bool {
        self.pending.is_pending()
    }

    pub fn cancel_pending(&mut self) {
        self.pending.cancel();
    }

    /// Whether the debounced save is due. Consumes the pending task.
    pub fn poll_due(&mut self, now: Instant) -> Option<SaveTrigger> {
        self.pending.poll(now)
    }

    pub fn save(&mut self, record: &SessionRecord) -> Result<()> {
        let Some(key) = self.key.as_deref() else {
            return Ok(());
        };
        let json = serde_json::to_string(record)?;
        self.store.set(key, &json)?;
        debug!("Saved session '{key}'");
        Ok(())
    }

    /// Saved session for the current model. Missing, unreadable and corrupt
    /// records all read as "no session".
    #[must_use]
    pub fn restore(&self) -> Option<SessionRecord> {
        let key = self.key.as_deref()?;
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("Session store read failed for '{key}': {err}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => {
                info!("Restoring session '{key}'");
                Some(record)
            }
            Err(err) => {
                warn!("Ignoring corrupt session '{key}': {err}");
                None
            }
        }
    }

    /// Deletes the current model's record and drops any pending save.
    pub fn delete(&mut self) -> Result<()> {
        self.pending.cancel();
        match self.key.as_deref() {
            Some(key) => self.store.remove(key),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// `YYYY-MM-DDTHH:MM:SS.mmmZ` in UTC. Times before the epoch clamp to it.
#[must_use]
pub fn format_iso8601(at: SystemTime) -> String {
    let since_epoch = at.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since_epoch.as_secs();
    let millis = since_epoch.subsec_millis();

    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (hour, minute, second) = (rem / 3600, (rem % 3600) / 60, rem % 60);
    let (year, month, day) = civil_from_days(days);

    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{millis:03}Z")
}

/// Days since 1970-01-01 → proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
