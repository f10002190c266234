//! Durable feature cache.
//!
//! Maps a [`VideoIdentity`] to the [`FeatureVector`] extracted from it, so
//! repeated training runs only decode videos they have not seen before.
//!
//! # Concurrency
//!
//! Each identity owns an in-flight slot (`Arc<Mutex<Option<FeatureVector>>>`).
//! [`FeatureCache::get_or_compute`] holds the slot's lock for the duration of
//! the computation, so at most one extraction runs per identity while
//! different identities proceed in parallel. A failed computation leaves the
//! slot empty and the next caller retries.
//!
//! # Storage format
//!
//! A single CBOR document:
//!
//! ```text
//! { version: u32, width: u32, height: u32, entries: { identity: [f64; width*height] } }
//! ```
//!
//! Files with another version or frame geometry are ignored. Entries are never
//! invalidated when the underlying video changes; identities are assumed to
//! be stable for the lifetime of the file.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::FrameGeometry;
use crate::error::{Result, VigilError, CURRENT_CACHE_VERSION};
use crate::extractor::FeatureVector;

/// Stable key identifying one logical video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoIdentity(String);

impl VideoIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity of a video file, taken from its path.
    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for VideoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoIdentity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VideoIdentity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// On-disk schema.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    width: u32,
    height: u32,
    entries: BTreeMap<VideoIdentity, FeatureVector>,
}

type Slot = Arc<Mutex<Option<FeatureVector>>>;

fn lock_slot(slot: &Slot) -> MutexGuard<'_, Option<FeatureVector>> {
    // A panic mid-extraction leaves the slot empty, which is a valid state
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Thread-safe identity → feature mapping backed by a file.
pub struct FeatureCache {
    path: PathBuf,
    geometry: FrameGeometry,
    slots: DashMap<VideoIdentity, Slot>,
}

impl FeatureCache {
    /// Create an empty cache that persists to `path`.
    pub fn new(path: impl Into<PathBuf>, geometry: FrameGeometry) -> Self {
        Self {
            path: path.into(),
            geometry,
            slots: DashMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn slot(&self, identity: &VideoIdentity) -> Slot {
        let entry = self.slots.entry(identity.clone()).or_default();
        Arc::clone(entry.value())
    }

    fn existing_slot(&self, identity: &VideoIdentity) -> Option<Slot> {
        self.slots.get(identity).map(|entry| Arc::clone(entry.value()))
    }

    /// Return the cached vector for `identity`, computing and storing it on a miss.
    pub fn get_or_compute<F>(&self, identity: &VideoIdentity, compute: F) -> Result<FeatureVector>
    where
        F: FnOnce(&VideoIdentity) -> Result<FeatureVector>,
    {
        let slot = self.slot(identity);
        let mut guard = lock_slot(&slot);

        if let Some(features) = guard.as_ref() {
            debug!(identity = %identity, "Feature cache hit");
            return Ok(features.clone());
        }

        let features = compute(identity)?;
        if features.len() != self.geometry.len() {
            return Err(VigilError::CacheError(format!(
                "Refusing to cache {} features for {} (expected {})",
                features.len(),
                identity,
                self.geometry.len()
            )));
        }

        debug!(identity = %identity, "Feature cache miss, stored");
        *guard = Some(features.clone());
        Ok(features)
    }

    /// Cached vector for `identity`, if one exists.
    ///
    /// Blocks while an extraction for the same identity is in flight.
    pub fn get(&self, identity: &VideoIdentity) -> Option<FeatureVector> {
        let slot = self.existing_slot(identity)?;
        let guard = lock_slot(&slot);
        guard.clone()
    }

    /// Store `features` under `identity`, replacing any previous value.
    pub fn insert(&self, identity: VideoIdentity, features: FeatureVector) {
        let slot = self.slot(&identity);
        *lock_slot(&slot) = Some(features);
    }

    pub fn contains(&self, identity: &VideoIdentity) -> bool {
        self.get(identity).is_some()
    }

    /// Number of identities with a stored vector.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted identities with a stored vector.
    pub fn identities(&self) -> Vec<VideoIdentity> {
        // BTreeMap keys come out sorted
        self.snapshot().into_keys().collect()
    }

    /// Drop every in-memory entry. The file on disk is untouched.
    pub fn clear(&self) {
        self.slots.clear();
    }

    fn snapshot(&self) -> BTreeMap<VideoIdentity, FeatureVector> {
        let slots: Vec<(VideoIdentity, Slot)> = self
            .slots
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        slots
            .into_iter()
            .filter_map(|(id, slot)| lock_slot(&slot).clone().map(|features| (id, features)))
            .collect()
    }

    /// Populate the cache from durable storage.
    ///
    /// Missing, unreadable, corrupt or incompatible files are logged and
    /// otherwise ignored. Entries already in memory win over entries on disk.
    /// Returns the number of entries taken from the file.
    pub fn load(&self) -> usize {
        let file = match self.read_file() {
            Ok(Some(file)) => file,
            Ok(None) => {
                debug!(path = %self.path.display(), "No feature cache file, starting empty");
                return 0;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable feature cache");
                return 0;
            }
        };

        if file.version != CURRENT_CACHE_VERSION {
            warn!(
                path = %self.path.display(),
                version = file.version,
                expected = CURRENT_CACHE_VERSION,
                "Ignoring feature cache with unsupported version"
            );
            return 0;
        }

        if FrameGeometry::new(file.width, file.height) != self.geometry {
            warn!(
                path = %self.path.display(),
                width = file.width,
                height = file.height,
                "Ignoring feature cache built for a different frame size"
            );
            return 0;
        }

        let mut loaded = 0;
        for (identity, features) in file.entries {
            if features.len() != self.geometry.len() {
                warn!(identity = %identity, len = features.len(), "Skipping malformed cache entry");
                continue;
            }
            let slot = self.slot(&identity);
            let mut guard = lock_slot(&slot);
            if guard.is_none() {
                *guard = Some(features);
                loaded += 1;
            }
        }

        info!(path = %self.path.display(), entries = loaded, "Loaded feature cache");
        loaded
    }

    fn read_file(&self) -> Result<Option<CacheFile>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        ciborium::from_reader(bytes.as_slice())
            .map(Some)
            .map_err(|e| VigilError::CacheError(format!("Corrupt cache file: {}", e)))
    }

    /// Write the whole cache to durable storage, replacing the previous file.
    ///
    /// The file is written to a sibling temporary file first and renamed into
    /// place, so a failed write never leaves a truncated cache behind.
    /// Returns the number of entries written.
    pub fn persist(&self) -> Result<usize> {
        let file = CacheFile {
            version: CURRENT_CACHE_VERSION,
            width: self.geometry.width,
            height: self.geometry.height,
            entries: self.snapshot(),
        };
        let count = file.entries.len();

        let mut bytes = Vec::new();
        ciborium::into_writer(&file, &mut bytes)
            .map_err(|e| VigilError::CacheError(format!("Failed to encode cache: {}", e)))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| VigilError::Io(e.error))?;

        info!(path = %self.path.display(), entries = count, bytes = bytes.len(), "Persisted feature cache");
        Ok(count)
    }
}

impl fmt::Debug for FeatureCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureCache")
            .field("path", &self.path)
            .field("geometry", &self.geometry)
            .field("entries", &self.len())
            .finish()
    }
}
