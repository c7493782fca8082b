//! # hashmark FileSystem Storage
//!
//! A local filesystem backend for hashmark.
//!
//! This crate implements the [`AssetStorage`] trait, reading source assets and
//! writing hashed copies and manifests directly in the file system.
//!
//! ## Features
//!
//! * **Atomic Writes**: Uses temporary files and rename operations so a crash
//!   mid-write never leaves a truncated asset or manifest behind.
//!
//! ## Usage
//!
//! ```no_run
//! use hashmark_core::prelude::*;
//! use hashmark_fs::FileSystemStorage;
//!
//! let hasher = AssetHasher::new(FileSystemStorage);
//! hasher.set(ConfigPatch::new().base("./public")).unwrap();
//! let outcome = hasher.hash_file("css/style.css", ConfigPatch::new()).unwrap();
//! println!("{}", outcome.path.display());
//! ```

use bytes::Bytes;
use hashmark_core::prelude::*;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::trace;

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(StorageError::Io)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(StorageError::Io)?;
    tmp.write_all(data).map_err(StorageError::Io)?;
    tmp.as_file().sync_all().map_err(StorageError::Io)?;
    #[cfg(unix)]
    tmp.as_file()
        .set_permissions(target_permissions(path))
        .map_err(StorageError::Io)?;
    tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;

    Ok(())
}

/// Temp files are created `0600`; give the result the mode an overwritten
/// target had, or `0644` for a new file.
#[cfg(unix)]
fn target_permissions(path: &Path) -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta.permissions(),
        _ => fs::Permissions::from_mode(0o644),
    }
}

/// Stores assets at the paths it is given; relative paths resolve against
/// the process working directory.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSystemStorage;

impl AssetStorage for FileSystemStorage {
    fn read_file(&self, path: &Path) -> Result<Bytes, StorageError> {
        match fs::read(path) {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string_lossy().to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        trace!("Writing {} ({} bytes)", path.display(), data.len());
        atomic_write(path, data)
    }

    fn delete_file(&self, path: &Path) -> Result<(), StorageError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c.txt");

        FileSystemStorage.write_file(&path, b"hello").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");

        FileSystemStorage.write_file(&path, b"replaced").unwrap();
        assert_eq!(&FileSystemStorage.read_file(&path).unwrap()[..], b"replaced");

        // No temp files left next to the target.
        assert_eq!(fs::read_dir(dir.path().join("a/b")).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_written_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("css/site-abc.css");
        FileSystemStorage.write_file(&path, b"a{}").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);

        // Overwriting keeps the mode the target already had.
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        FileSystemStorage.write_file(&path, b"b{}").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = FileSystemStorage
            .read_file(&dir.path().join("nope.css"))
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_read_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = FileSystemStorage.read_file(dir.path()).unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.js");
        FileSystemStorage.delete_file(&path).unwrap();

        fs::write(&path, "x").unwrap();
        assert!(FileSystemStorage.exists(&path));
        FileSystemStorage.delete_file(&path).unwrap();
        assert!(!FileSystemStorage.exists(&path));
    }
}
