use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    Generic(String),
}

#[derive(Error, Debug)]
pub enum HashError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("File access error for {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("Failed to write manifest {}: {reason}", .path.display())]
    ManifestWrite { path: PathBuf, reason: String },

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl HashError {
    pub(crate) fn file_access(path: impl Into<PathBuf>, source: StorageError) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn manifest_write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ManifestWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Two registry entries that flatten to the same manifest key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("manifest key `{key}` is claimed by both {} and {}", .first.display(), .second.display())]
pub struct ManifestKeyConflict {
    pub key: String,
    pub first: PathBuf,
    pub second: PathBuf,
}

pub type Result<T, E = HashError> = std::result::Result<T, E>;
