//! In-memory [`AssetStorage`] for tests and examples.
//!
//! Paths are compared after dropping `.` components, so `./a.css` and
//! `a.css` name the same file.

use bytes::Bytes;
use hashmark_core::prelude::*;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Clone, Default, Debug)]
pub struct MemoryStorage {
    files: Arc<RwLock<BTreeMap<PathBuf, Bytes>>>,
}

fn key(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl AsRef<Path>, data: impl Into<Bytes>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key(path.as_ref()), data.into());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<Bytes> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key(path.as_ref()))
            .cloned()
    }

    /// Every stored path, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl AssetStorage for MemoryStorage {
    fn read_file(&self, path: &Path) -> Result<Bytes, StorageError> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        let key = key(path);
        if let Some(data) = files.get(&key) {
            return Ok(data.clone());
        }
        if files.keys().any(|p| p.starts_with(&key)) {
            return Err(StorageError::Generic(format!(
                "{} is a directory",
                path.display()
            )));
        }
        Err(StorageError::NotFound(path.to_string_lossy().to_string()))
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        self.insert(path, Bytes::copy_from_slice(data));
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<(), StorageError> {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key(path));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hasher_with(files: &[(&str, &str)]) -> AssetHasher<MemoryStorage> {
        let storage = MemoryStorage::new();
        for (path, content) in files {
            storage.insert(path, content.to_string());
        }
        AssetHasher::new(storage)
    }

    #[test]
    fn test_curdir_components_are_ignored() {
        let storage = MemoryStorage::new();
        storage.insert("./css/a.css", "a");
        assert!(storage.exists(Path::new("css/a.css")));
        assert_eq!(storage.paths(), vec![PathBuf::from("css/a.css")]);
    }

    #[test]
    fn test_default_config_surface() {
        let hasher = hasher_with(&[]);
        let config = hasher.config().to_value();
        for key in ["hasher", "length", "manifest", "replace", "template"] {
            assert!(config.get(key).is_some(), "missing default `{key}`");
        }
        assert!(AssetHasher::<MemoryStorage>::hashers().contains(&"sha1"));
        assert_eq!(hasher.get("no-such-key"), json!(""));
    }

    #[test]
    fn test_hash_with_relative_base() {
        let hasher = hasher_with(&[("style.css", "a")]);
        let outcome = hasher
            .hash_file("style.css", ConfigPatch::new().length(8))
            .unwrap();

        assert!(outcome.hashed);
        assert_eq!(outcome.path, PathBuf::from("./style-86f7e437.css"));
        assert_eq!(outcome.hash.as_deref(), Some("86f7e437"));
        assert_eq!(&hasher.storage().get("style-86f7e437.css").unwrap()[..], b"a");
    }

    #[test]
    fn test_custom_template_and_algorithm() {
        let hasher = hasher_with(&[("js/app.js", "a")]);
        hasher.set(ConfigPatch::new().hasher("sha256")).unwrap();

        let outcome = hasher
            .hash_file(
                "js/app.js",
                ConfigPatch::new().template("<%= hash %>/<%= name %>.<%= ext %>").length(6),
            )
            .unwrap();

        assert_eq!(outcome.path, PathBuf::from("./js/ca9781/app.js"));
        assert!(hasher.storage().exists(Path::new("js/ca9781/app.js")));
    }

    #[test]
    fn test_hash_key_salts_the_name() {
        let hasher = hasher_with(&[("a.css", "a")]);
        let plain = hasher.hash_file("a.css", ConfigPatch::new()).unwrap();
        let salted = hasher
            .hash_file("a.css", ConfigPatch::new().hash_key("build-42"))
            .unwrap();
        assert_ne!(plain.path, salted.path);
    }

    #[test]
    fn test_directory_placeholder_passes_through() {
        let hasher = hasher_with(&[]);
        let outcome = hasher.hash_file("/", ConfigPatch::new()).unwrap();
        assert!(!outcome.hashed);
        assert_eq!(outcome.path, outcome.original);
        assert!(hasher.get_assets().is_empty());
        assert!(hasher.storage().paths().is_empty());
    }

    #[test]
    fn test_directory_is_file_access_error() {
        let hasher = hasher_with(&[("img/logo.png", "png")]);
        let err = hasher.hash_file("img", ConfigPatch::new()).unwrap_err();
        assert!(matches!(err, HashError::FileAccess { .. }));
    }

    #[test]
    fn test_hash_contents_uses_supplied_bytes() {
        let hasher = hasher_with(&[("a.css", "on disk")]);
        let outcome = hasher
            .hash_contents("a.css", b"a", ConfigPatch::new().length(8))
            .unwrap();
        assert_eq!(outcome.path, PathBuf::from("./a-86f7e437.css"));
        assert_eq!(&hasher.storage().get("a-86f7e437.css").unwrap()[..], b"a");
    }

    #[test]
    fn test_replace_removes_stale_and_original() {
        let hasher = hasher_with(&[("a.css", "one")]);
        let opts = ConfigPatch::new().replace(true);
        let first = hasher.hash_file("a.css", opts.clone()).unwrap();

        hasher.storage().insert("a.css", "two");
        let second = hasher.hash_file("a.css", opts).unwrap();

        assert_eq!(hasher.storage().paths(), vec![key(&second.path)]);
        assert!(!hasher.storage().exists(&first.path));
    }

    #[test]
    fn test_template_without_hash_does_not_delete_original() {
        let hasher = hasher_with(&[("a.css", "one")]);
        let outcome = hasher
            .hash_file(
                "a.css",
                ConfigPatch::new().template("<%= name %>.<%= ext %>").replace(true),
            )
            .unwrap();
        assert_eq!(key(&outcome.path), PathBuf::from("a.css"));
        assert!(hasher.storage().exists(Path::new("a.css")));
    }

    #[test]
    fn test_manifest_with_name_keys() {
        let hasher = hasher_with(&[("css/a.css", "a")]);
        hasher
            .set(ConfigPatch::new().manifest_key(ManifestKey::Name).manifest("rev.json").length(8))
            .unwrap();
        hasher.hash_file("css/a.css", ConfigPatch::new()).unwrap();
        hasher
            .save_manifest(ConfigPatch::new(), ManifestMode::Merge)
            .unwrap();

        let data = hasher.storage().get("rev.json").unwrap();
        let json: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(json, json!({ "a.css": "css/a-86f7e437.css" }));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_file_name_is_hashed() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let original = Path::new(OsStr::from_bytes(b"caf\xe9.css"));
        let storage = MemoryStorage::new();
        storage.insert(original, "a");
        let hasher = AssetHasher::new(storage);

        let outcome = hasher
            .hash_file(original, ConfigPatch::new().length(8))
            .unwrap();
        assert!(outcome.hashed);
        assert_eq!(outcome.path, PathBuf::from("./caf\u{fffd}-86f7e437.css"));
        assert_eq!(hasher.get_assets().len(), 1);
        assert!(hasher.storage().exists(&outcome.path));
    }

    #[test]
    fn test_name_key_collision_fails_manifest_write() {
        let hasher = hasher_with(&[("admin/app.js", "admin"), ("site/app.js", "site")]);
        hasher
            .set(ConfigPatch::new().manifest_key(ManifestKey::Name).manifest("rev.json"))
            .unwrap();

        let report = hasher.hash_batch(["admin/app.js", "site/app.js"], ConfigPatch::new());
        assert_eq!(report.hashed(), 2);
        assert!(matches!(
            report.manifest,
            Err(HashError::ManifestWrite { ref reason, .. }) if reason.contains("app.js")
        ));
        assert!(!hasher.storage().exists(Path::new("rev.json")));
        assert_eq!(hasher.get_assets().len(), 2);
    }

    /// Refuses to delete one path, like a read-only source file.
    struct Undeletable {
        inner: MemoryStorage,
        locked: PathBuf,
    }

    impl AssetStorage for Undeletable {
        fn read_file(&self, path: &Path) -> Result<Bytes, StorageError> {
            self.inner.read_file(path)
        }

        fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
            self.inner.write_file(path, data)
        }

        fn delete_file(&self, path: &Path) -> Result<(), StorageError> {
            if key(path) == self.locked {
                return Err(StorageError::Generic("permission denied".into()));
            }
            self.inner.delete_file(path)
        }

        fn exists(&self, path: &Path) -> bool {
            self.inner.exists(path)
        }
    }

    #[test]
    fn test_failed_cleanup_still_records_new_file() {
        let inner = MemoryStorage::new();
        inner.insert("a.css", "a");
        let hasher = AssetHasher::new(Undeletable {
            inner,
            locked: PathBuf::from("a.css"),
        });

        let err = hasher
            .hash_file("a.css", ConfigPatch::new().replace(true).length(8))
            .unwrap_err();
        assert!(matches!(err, HashError::FileAccess { ref path, .. } if key(path) == Path::new("a.css")));

        let assets = hasher.get_assets();
        assert_eq!(assets.len(), 1);
        let hashed = &assets[Path::new("./a.css")];
        assert_eq!(key(hashed), PathBuf::from("a-86f7e437.css"));
        assert!(hasher.storage().inner.exists(hashed));
        assert!(hasher.storage().inner.exists(Path::new("a.css")));

        // The manifest lists the file that is actually on disk.
        hasher
            .save_manifest(ConfigPatch::new(), ManifestMode::Merge)
            .unwrap();
        let data = hasher.storage().inner.get("assets.json").unwrap();
        let json: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(json, json!({ "a.css": "a-86f7e437.css" }));
    }
}
