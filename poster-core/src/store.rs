//! Shared poster storage.
//!
//! Provides a thread-safe [`PosterStore`] holding saved posters in memory,
//! optionally mirrored to a single `posters.json` file. The store keeps at
//! most `max_posters` entries; saving past the cap evicts the oldest saves.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::artifact::{current_timestamp_ms, NewPoster, PosterArtifact, PosterId};
use crate::error::CoreError;

/// Default retained-count cap.
pub const DEFAULT_MAX_POSTERS: usize = 200;

/// File name used for persistence inside the data directory.
pub const POSTERS_FILE: &str = "posters.json";

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The upload was rejected.
    #[error(transparent)]
    Invalid(#[from] CoreError),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Thread-safe poster storage shared across HTTP handlers and export tasks.
///
/// Entries are kept newest-save-first.
///
/// # Example
///
/// ```
/// use poster_core::store::PosterStore;
/// use poster_core::NewPoster;
///
/// let store = PosterStore::new();
/// let saved = store
///     .save(NewPoster::new("data:image/png;base64,AAAA").with_editor("griglie"))
///     .unwrap();
/// assert_eq!(store.get(&saved.id).unwrap().editor, "griglie");
/// ```
#[derive(Debug, Clone)]
pub struct PosterStore {
    posters: Arc<RwLock<Vec<PosterArtifact>>>,
    max_posters: usize,
    /// Optional data directory for filesystem persistence.
    data_dir: Option<PathBuf>,
}

impl Default for PosterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PosterStore {
    /// Create an empty in-memory store with the default cap.
    #[must_use]
    pub fn new() -> Self {
        Self {
            posters: Arc::new(RwLock::new(Vec::new())),
            max_posters: DEFAULT_MAX_POSTERS,
            data_dir: None,
        }
    }

    /// Create a store persisted under `data_dir`.
    ///
    /// The directory is created if it doesn't exist, and an existing
    /// `posters.json` is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created or the
    /// file cannot be read, and [`StoreError::Serialization`] if it cannot be
    /// parsed.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        let posters = load_posters(&data_dir.join(POSTERS_FILE))?;
        tracing::debug!(
            "Loaded {} posters from {}",
            posters.len(),
            data_dir.display()
        );
        Ok(Self {
            posters: Arc::new(RwLock::new(posters)),
            max_posters: DEFAULT_MAX_POSTERS,
            data_dir: Some(data_dir),
        })
    }

    /// Set the retained-count cap. A cap of zero is treated as one.
    ///
    /// Entries beyond the new cap are evicted immediately.
    #[must_use]
    pub fn with_max_posters(mut self, max_posters: usize) -> Self {
        self.max_posters = max_posters.max(1);
        let evicted = {
            let mut posters = self
                .posters
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let before = posters.len();
            posters.truncate(self.max_posters);
            before - posters.len()
        };
        if evicted > 0 {
            self.persist();
        }
        self
    }

    /// Retained-count cap.
    #[must_use]
    pub fn max_posters(&self) -> usize {
        self.max_posters
    }

    /// Save an upload, returning the stored artifact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if the upload has no image.
    pub fn save(&self, upload: NewPoster) -> Result<PosterArtifact, StoreError> {
        let artifact = PosterArtifact::from_upload(upload, current_timestamp_ms())?;
        self.insert(artifact.clone());
        Ok(artifact)
    }

    /// Insert an already-built artifact, evicting the oldest saves past the cap.
    pub fn insert(&self, artifact: PosterArtifact) {
        {
            let mut posters = self
                .posters
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            posters.insert(0, artifact);
            if posters.len() > self.max_posters {
                let evicted = posters.len() - self.max_posters;
                posters.truncate(self.max_posters);
                tracing::debug!("Evicted {evicted} posters over cap {}", self.max_posters);
            }
        }
        self.persist();
    }

    /// All posters, newest timestamp first.
    #[must_use]
    pub fn list_all(&self) -> Vec<PosterArtifact> {
        let mut posters = self
            .posters
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        posters.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        posters
    }

    /// Get a poster by ID if it exists.
    #[must_use]
    pub fn get(&self, id: &PosterId) -> Option<PosterArtifact> {
        let posters = self
            .posters
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        posters.iter().find(|p| &p.id == id).cloned()
    }

    /// Delete a poster. Returns whether anything was removed.
    ///
    /// Deleting an unknown ID is not an error.
    pub fn delete(&self, id: &PosterId) -> bool {
        let removed = {
            let mut posters = self
                .posters
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let before = posters.len();
            posters.retain(|p| &p.id != id);
            before != posters.len()
        };
        if removed {
            self.persist();
        }
        removed
    }

    /// Remove every poster.
    pub fn clear(&self) {
        self.posters
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
        self.persist();
    }

    /// Number of stored posters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.posters
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write the poster list to disk as JSON.
    ///
    /// No-op if the store was created without a data directory.
    fn persist(&self) {
        let Some(ref data_dir) = self.data_dir else {
            return;
        };
        let json = {
            let posters = self
                .posters
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            match serde_json::to_string(&*posters) {
                Ok(j) => j,
                Err(e) => {
                    tracing::warn!("Failed to serialize posters: {e}");
                    return;
                }
            }
        };
        let path = data_dir.join(POSTERS_FILE);
        if let Err(e) = std::fs::write(&path, json) {
            tracing::warn!("Failed to persist posters to {}: {e}", path.display());
        }
    }
}

/// Read a persisted poster list. A missing file is an empty list.
fn load_posters(path: &Path) -> Result<Vec<PosterArtifact>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&contents).map_err(|e| StoreError::Serialization(e.to_string()))
}
