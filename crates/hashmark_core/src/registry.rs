use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One hashed asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// Identity of the asset. Stays the same when its content changes.
    pub original_path: PathBuf,
    pub hashed_path: PathBuf,
    pub hash: String,
    pub timestamp: DateTime<Utc>,
}

/// In-memory record of every asset hashed since the last [`reset`](Self::reset).
///
/// Keyed by original path, so re-hashing a changed file overwrites its entry
/// instead of adding a second one.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    entries: BTreeMap<PathBuf, AssetEntry>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `original`, returning the previous one.
    ///
    /// The file at a previous `hashed_path` is not touched here.
    pub fn record(
        &mut self,
        original: impl Into<PathBuf>,
        hashed: impl Into<PathBuf>,
        hash: impl Into<String>,
    ) -> Option<AssetEntry> {
        let original_path = original.into();
        let entry = AssetEntry {
            original_path: original_path.clone(),
            hashed_path: hashed.into(),
            hash: hash.into(),
            timestamp: Utc::now(),
        };
        self.entries.insert(original_path, entry)
    }

    pub fn get(&self, original: &Path) -> Option<&AssetEntry> {
        self.entries.get(original)
    }

    /// Snapshot of original path → hashed path.
    pub fn all(&self) -> BTreeMap<PathBuf, PathBuf> {
        self.entries
            .iter()
            .map(|(original, entry)| (original.clone(), entry.hashed_path.clone()))
            .collect()
    }

    /// Snapshot of the full entries.
    pub fn entries(&self) -> Vec<AssetEntry> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
