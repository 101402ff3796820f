//! Download history persistence.
//!
//! The history file is the dedup boundary between runs: an identifier
//! present in it is never fetched again. On-disk shape is a JSON object
//! keyed by source, each source mapping record identifiers to titles:
//!
//! ```json
//! {
//!   "arxiv": {
//!     "2301.01234": "A Study of Something"
//!   }
//! }
//! ```
//!
//! Loading fails soft (missing or unreadable state is an empty history);
//! saving overwrites the file wholesale and is called after every
//! successful download, so a crash loses at most the in-flight item.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while persisting history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// File system error reading or writing the history file.
    #[error("IO error on history file {path}: {source}")]
    Io {
        /// The history file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// History could not be serialized to JSON.
    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable set of previously-downloaded identifiers, keyed by source.
///
/// `BTreeMap` keeps both the source keys and the per-source identifier maps
/// sorted, so repeated saves of the same state produce identical bytes.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    sources: BTreeMap<String, BTreeMap<String, String>>,
}

impl History {
    /// Loads history from `path`, treating missing or corrupt state as empty.
    ///
    /// A corrupt file is logged at WARN and left untouched on disk until the
    /// next successful download overwrites it.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no history file, starting empty");
                return Self::default();
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "unreadable history file, starting empty");
                return Self::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(history) => history,
            Err(error) => {
                warn!(path = %path.display(), %error, "corrupt history file, starting empty");
                Self::default()
            }
        }
    }

    /// Overwrites the persisted state wholesale with the in-memory mapping.
    ///
    /// Called after every successful download (write-through, not batched).
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if serialization or the file write fails.
    pub fn save(&self, path: &Path) -> Result<(), HistoryError> {
        let rendered = serde_json::to_string_pretty(self)?;
        std::fs::write(path, rendered).map_err(|e| HistoryError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(path = %path.display(), entries = self.total_len(), "history saved");
        Ok(())
    }

    /// Returns true when `id` is already recorded under `source`.
    #[must_use]
    pub fn contains(&self, source: &str, id: &str) -> bool {
        self.sources
            .get(source)
            .is_some_and(|entries| entries.contains_key(id))
    }

    /// Records one identifier → title entry under `source`.
    pub fn record(&mut self, source: &str, id: impl Into<String>, title: impl Into<String>) {
        self.sources
            .entry(source.to_string())
            .or_default()
            .insert(id.into(), title.into());
    }

    /// Returns the number of entries recorded under `source`.
    #[must_use]
    pub fn len(&self, source: &str) -> usize {
        self.sources.get(source).map_or(0, BTreeMap::len)
    }

    /// Returns true when no source has any entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.values().all(BTreeMap::is_empty)
    }

    /// Total entry count across all sources.
    fn total_len(&self) -> usize {
        self.sources.values().map(BTreeMap::len).sum()
    }
}
