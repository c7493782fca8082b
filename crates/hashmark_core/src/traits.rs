use crate::error::*;

use bytes::Bytes;
use std::path::Path;

/// Where hashed assets and manifests are read from and written to.
///
/// Every filesystem effect of [`AssetHasher`](crate::engine::AssetHasher) goes
/// through this trait, so a backend decides what "disk" means.
pub trait AssetStorage: Send + Sync + 'static {
    fn read_file(&self, path: &Path) -> Result<Bytes, StorageError>;

    /// Writes `data` to `path`, creating parent directories as needed.
    ///
    /// Implementations must not leave a half-written file at `path`.
    fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;

    /// Removes `path`. A missing file is not an error.
    fn delete_file(&self, path: &Path) -> Result<(), StorageError>;

    fn exists(&self, path: &Path) -> bool;
}

impl<S: AssetStorage> AssetStorage for std::sync::Arc<S> {
    fn read_file(&self, path: &Path) -> Result<Bytes, StorageError> {
        (**self).read_file(path)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        (**self).write_file(path, data)
    }

    fn delete_file(&self, path: &Path) -> Result<(), StorageError> {
        (**self).delete_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}
