use crate::config::{Config, ManifestKey};
use crate::error::{HashError, ManifestKeyConflict, Result, StorageError};
use crate::registry::AssetEntry;
use crate::traits::AssetStorage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// The "Manifest" is what downstream tools read to resolve asset names.
/// It maps logical names ("css/style.css") to hashed paths
/// ("css/style-ab12cd34ef.css").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetManifest {
    /// - Key: logical name, see [`ManifestKey`]
    /// - Value: hashed path relative to the output root
    pub assets: BTreeMap<String, String>,
}

/// What happens to a manifest that already exists on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestMode {
    /// Keep keys that aren't in the new snapshot.
    #[default]
    Merge,
    /// Discard the existing file's content.
    Overwrite,
}

impl AssetManifest {
    /// Flatten registry entries into manifest form.
    ///
    /// Fails if two entries map to the same key, which can happen with
    /// [`ManifestKey::Name`] when equally named files live in different
    /// directories.
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = &'a AssetEntry>,
        config: &Config,
    ) -> Result<Self, ManifestKeyConflict> {
        let mut assets = BTreeMap::new();
        let mut owners: BTreeMap<String, &Path> = BTreeMap::new();

        for entry in entries {
            let key = match config.manifest_key {
                ManifestKey::Relative => relative_slash_path(&entry.original_path, &config.base),
                ManifestKey::Name => entry
                    .original_path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| slash_path(&entry.original_path)),
            };
            if let Some(first) = owners.insert(key.clone(), &entry.original_path) {
                return Err(ManifestKeyConflict {
                    key,
                    first: first.to_path_buf(),
                    second: entry.original_path.clone(),
                });
            }
            let value = relative_slash_path(&entry.hashed_path, config.output_root());
            assets.insert(key, value);
        }

        Ok(Self { assets })
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.assets.get(key).map(String::as_str)
    }

    /// Overlay `other` on top of `self`. Keys in `other` win.
    pub fn merge(&mut self, other: AssetManifest) {
        self.assets.extend(other.assets);
    }
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn relative_slash_path(path: &Path, root: &Path) -> String {
    slash_path(path.strip_prefix(root).unwrap_or(path))
}

/// Read the manifest at `path`. A missing file is an empty manifest.
pub fn read_manifest<S: AssetStorage + ?Sized>(storage: &S, path: &Path) -> Result<AssetManifest> {
    let data = match storage.read_file(path) {
        Ok(data) => data,
        Err(StorageError::NotFound(_)) => return Ok(AssetManifest::default()),
        Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AssetManifest::default());
        }
        Err(e) => return Err(HashError::manifest_write(path, e)),
    };

    serde_json::from_slice(&data).map_err(|e| HashError::manifest_write(path, e))
}

/// Write `snapshot` to `path`, merging with what is already there unless
/// `mode` is [`ManifestMode::Overwrite`]. Returns the manifest as written.
pub fn write_manifest<S: AssetStorage + ?Sized>(
    storage: &S,
    path: &Path,
    snapshot: AssetManifest,
    mode: ManifestMode,
) -> Result<AssetManifest> {
    let mut manifest = match mode {
        ManifestMode::Merge => read_manifest(storage, path)?,
        ManifestMode::Overwrite => AssetManifest::default(),
    };
    let existing = manifest.len();
    manifest.merge(snapshot);

    let data = serde_json::to_vec_pretty(&manifest).map_err(|e| HashError::manifest_write(path, e))?;
    storage
        .write_file(path, &data)
        .map_err(|e| HashError::manifest_write(path, e))?;

    debug!("Manifest {} had {existing} entries before merge", path.display());
    info!("Wrote manifest {} ({} assets)", path.display(), manifest.len());
    Ok(manifest)
}
