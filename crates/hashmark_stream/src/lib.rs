//! # hashmark pipeline adapters
//!
//! Wires an [`AssetHasher`] into a file pipeline. Files flow through as
//! [`AssetFile`]s; hashed files come out with their new `path` and the
//! original in `old_path`, everything else passes through untouched.
//!
//! * [`hash_files`] / [`save_manifest_stage`]: synchronous iterator stages.
//! * [`hash_stream`]: async stage over a [`futures::Stream`], hashing on
//!   tokio's blocking pool.

use bytes::Bytes;
use hashmark_core::prelude::*;
use std::path::PathBuf;

mod iter;
mod stream;

pub use iter::{HashFiles, SaveManifestStage, hash_files, save_manifest_stage};
pub use stream::hash_stream;

/// A file travelling through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    pub path: PathBuf,
    /// `None` for placeholders (e.g. directories), which are never hashed.
    pub contents: Option<Bytes>,
    /// Path before hashing, set once the file has been hashed.
    pub old_path: Option<PathBuf>,
    pub asset_hashed: bool,
}

impl AssetFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            contents: Some(contents.into()),
            old_path: None,
            asset_hashed: false,
        }
    }

    /// A file with no contents.
    pub fn placeholder(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            contents: None,
            old_path: None,
            asset_hashed: false,
        }
    }
}

/// Hash a single pipeline file.
pub fn hash_asset<S: AssetStorage>(
    hasher: &AssetHasher<S>,
    mut file: AssetFile,
    options: &ConfigPatch,
) -> Result<AssetFile> {
    file.asset_hashed = false;
    let Some(contents) = file.contents.clone() else {
        return Ok(file);
    };

    let outcome = hasher.hash_contents(&file.path, &contents, options.clone())?;
    if outcome.hashed {
        file.old_path = Some(outcome.original);
        file.path = outcome.path;
        file.asset_hashed = true;
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashmark_memory::MemoryStorage;

    #[test]
    fn test_placeholder_passes_through() {
        let hasher = AssetHasher::new(MemoryStorage::new());
        let file = hash_asset(&hasher, AssetFile::placeholder("css"), &ConfigPatch::new()).unwrap();

        assert!(!file.asset_hashed);
        assert!(file.old_path.is_none());
        assert_eq!(file.path, PathBuf::from("css"));
        assert!(hasher.get_assets().is_empty());
    }

    #[test]
    fn test_hashed_file_gets_new_path() {
        let hasher = AssetHasher::new(MemoryStorage::new());
        let file = hash_asset(
            &hasher,
            AssetFile::new("style.css", "a"),
            &ConfigPatch::new().length(8),
        )
        .unwrap();

        assert!(file.asset_hashed);
        assert_eq!(file.old_path, Some(PathBuf::from("./style.css")));
        assert_eq!(file.path, PathBuf::from("./style-86f7e437.css"));
        assert_eq!(file.contents.as_deref(), Some(&b"a"[..]));
    }
}
