//! The hashing orchestrator.
//!
//! [`AssetHasher`] is the handle a caller keeps for a session: it owns the
//! config, the asset registry and the storage backend, and every operation
//! goes through it. It is `Sync`, so an `Arc<AssetHasher<_>>` can be shared
//! by worker threads; registry updates and manifest writes are serialized
//! internally.

use crate::algorithm;
use crate::config::{Config, ConfigPatch};
use crate::error::{HashError, Result};
use crate::manifest::{AssetManifest, ManifestMode, write_manifest};
use crate::registry::{AssetEntry, AssetRegistry};
use crate::template::{self, TemplateVars};
use crate::traits::AssetStorage;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, warn};

/// Result of hashing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashOutcome {
    /// False only for inputs with no file name, which are passed through.
    pub hashed: bool,
    pub original: PathBuf,
    /// The hashed path, or `original` when nothing was hashed.
    pub path: PathBuf,
    pub hash: Option<String>,
}

impl HashOutcome {
    fn skipped(original: PathBuf) -> Self {
        Self {
            hashed: false,
            path: original.clone(),
            original,
            hash: None,
        }
    }
}

/// Per-file results of [`AssetHasher::hash_batch`] plus the end-of-batch
/// manifest write.
#[derive(Debug)]
pub struct BatchReport {
    pub files: Vec<Result<HashOutcome>>,
    /// `Ok(None)` when the manifest is disabled or nothing was hashed.
    pub manifest: Result<Option<PathBuf>>,
}

impl BatchReport {
    pub fn hashed(&self) -> usize {
        self.files
            .iter()
            .filter(|res| matches!(res, Ok(outcome) if outcome.hashed))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().filter(|res| res.is_err()).count()
    }
}

pub struct AssetHasher<S> {
    storage: S,
    config: RwLock<Config>,
    registry: Mutex<AssetRegistry>,
    manifest_lock: Mutex<()>,
}

impl<S: AssetStorage> AssetHasher<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, Config::default())
    }

    pub fn with_config(storage: S, config: Config) -> Self {
        Self {
            storage,
            config: RwLock::new(config),
            registry: Mutex::new(AssetRegistry::new()),
            manifest_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Validate and merge `patch` into the session config.
    pub fn set(&self, patch: ConfigPatch) -> Result<()> {
        self.config
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(patch)
    }

    pub fn set_value(&self, value: Value) -> Result<()> {
        self.config
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_value(value)
    }

    /// Value for `key`, `""` when absent.
    pub fn get(&self, key: &str) -> Value {
        self.config().get(key)
    }

    /// Snapshot of the whole session config.
    pub fn config(&self) -> Config {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn hashers() -> Vec<&'static str> {
        algorithm::hashers()
    }

    /// Snapshot of original path → hashed path for every asset hashed so far.
    pub fn get_assets(&self) -> BTreeMap<PathBuf, PathBuf> {
        self.lock_registry().all()
    }

    pub fn asset_entries(&self) -> Vec<AssetEntry> {
        self.lock_registry().entries()
    }

    pub fn reset_assets(&self) {
        self.lock_registry().reset();
    }

    /// Read `path`, hash it and write the hashed copy.
    ///
    /// `options` apply to this call only. A relative `path` is resolved
    /// against `base`.
    pub fn hash_file(&self, path: impl AsRef<Path>, options: ConfigPatch) -> Result<HashOutcome> {
        let config = self.call_config(options)?;
        let original = config.resolve_input(path.as_ref());
        if original.file_name().is_none() {
            return Ok(HashOutcome::skipped(original));
        }

        let data = self
            .storage
            .read_file(&original)
            .map_err(|e| HashError::file_access(&original, e))?;
        self.hash_resolved(&config, original, &data)
    }

    /// Like [`hash_file`](Self::hash_file) for bytes the caller already read.
    /// `data` must be the exact content that ends up in the hashed file.
    pub fn hash_contents(
        &self,
        path: impl AsRef<Path>,
        data: &[u8],
        options: ConfigPatch,
    ) -> Result<HashOutcome> {
        let config = self.call_config(options)?;
        let original = config.resolve_input(path.as_ref());
        self.hash_resolved(&config, original, data)
    }

    /// Hash every path independently, then write the manifest once.
    ///
    /// A failing file doesn't stop the rest of the batch.
    pub fn hash_batch<I, P>(&self, paths: I, options: ConfigPatch) -> BatchReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let files: Vec<_> = paths
            .into_iter()
            .map(|path| self.hash_file(path, options.clone()))
            .collect();

        let any_hashed = files
            .iter()
            .any(|res| matches!(res, Ok(outcome) if outcome.hashed));
        let manifest = if any_hashed {
            self.save_manifest(options, ManifestMode::Merge)
        } else {
            Ok(None)
        };

        BatchReport { files, manifest }
    }

    /// Flush the registry to the manifest file.
    ///
    /// Returns the path written, or `None` when `manifest` is `false`.
    pub fn save_manifest(&self, options: ConfigPatch, mode: ManifestMode) -> Result<Option<PathBuf>> {
        let config = self.call_config(options)?;
        let Some(path) = config.manifest_path() else {
            debug!("Manifest disabled, skipping write");
            return Ok(None);
        };

        let _guard = self
            .manifest_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let snapshot = AssetManifest::from_entries(&self.asset_entries(), &config)
            .map_err(|e| HashError::manifest_write(&path, e))?;
        write_manifest(&self.storage, &path, snapshot, mode)?;
        Ok(Some(path))
    }

    fn call_config(&self, options: ConfigPatch) -> Result<Config> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .merged(options)
    }

    fn lock_registry(&self) -> MutexGuard<'_, AssetRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn delete(&self, path: &Path) -> Result<()> {
        self.storage.delete_file(path).map_err(|e| {
            warn!("Failed to remove {}: {e}", path.display());
            HashError::file_access(path, e)
        })
    }

    fn hash_resolved(&self, config: &Config, original: PathBuf, data: &[u8]) -> Result<HashOutcome> {
        let hash = config
            .hasher
            .hex_digest(data, config.length, config.hash_key.as_deref());
        let file_name = template::file_parts(&original).map(|(name, ext)| {
            let vars = TemplateVars {
                name: &name,
                hash: &hash,
                ext: &ext,
            };
            template::render(&config.template, &vars)
        });
        let Some(file_name) = file_name else {
            return Ok(HashOutcome::skipped(original));
        };
        let new_path = output_dir(config, &original).join(file_name);

        if config.save {
            self.storage
                .write_file(&new_path, data)
                .map_err(|e| HashError::file_access(&new_path, e))?;
        }

        // The new file exists from here on, so it is recorded before any
        // cleanup can fail. Cleanup stays under the same lock so a concurrent
        // hash of the same asset sees a consistent previous entry.
        let mut registry = self.lock_registry();
        let previous = registry.record(&original, &new_path, &hash);
        if config.save && config.replace {
            let stale = previous
                .map(|entry| entry.hashed_path)
                .filter(|stale| *stale != new_path && *stale != original);
            if let Some(stale) = stale {
                warn!("Replacing {} with {}", stale.display(), new_path.display());
                self.delete(&stale)?;
            }
            if original != new_path {
                self.delete(&original)?;
            }
        }
        drop(registry);

        debug!(
            "Hashed {} -> {} ({}:{hash})",
            original.display(),
            new_path.display(),
            config.hasher
        );

        Ok(HashOutcome {
            hashed: true,
            original,
            path: new_path,
            hash: Some(hash),
        })
    }
}

/// Directory the hashed file goes into: the original's directory, moved from
/// `base` to the output root. Inputs outside `base` stay where they are.
fn output_dir(config: &Config, original: &Path) -> PathBuf {
    match original.strip_prefix(&config.base) {
        Ok(relative) => config
            .output_root()
            .join(relative.parent().unwrap_or(Path::new(""))),
        Err(_) => original.parent().unwrap_or(Path::new("")).to_path_buf(),
    }
}
