//! File-system capability used by headers and the cache store.
//!
//! Everything the cache does on disk goes through [`FileSystem`], so tests
//! and embedders can substitute their own implementation. [`StdFileSystem`]
//! is the `std::fs` backed default.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::CacheError;

/// Blocking file-system operations consumed by the cache.
pub trait FileSystem: fmt::Debug + Send + Sync {
    /// Returns `true` if `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Returns the last-modified time of `path`.
    fn modified(&self, path: &Path) -> Result<SystemTime, CacheError>;

    /// Reads the whole file at `path`.
    fn read(&self, path: &Path) -> Result<Vec<u8>, CacheError>;

    /// Replaces the file at `path` with `bytes`.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), CacheError>;

    /// Creates `path` and all missing parents.
    fn create_dir_all(&self, path: &Path) -> Result<(), CacheError>;

    /// Resolves symlinks and returns the absolute form of `path`.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, CacheError>;

    /// Lists the entries of directory `dir`.
    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, CacheError>;
}

/// [`FileSystem`] backed by `std::fs`.
///
/// Writes go to a uniquely named temporary file in the destination
/// directory and are renamed into place, so readers never see a partially
/// written file under the final name.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn modified(&self, path: &Path) -> Result<SystemTime, CacheError> {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| CacheError::io(path, e))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, CacheError> {
        fs::read(path).map_err(|e| CacheError::io(path, e))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        atomic_write(path, bytes)
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), CacheError> {
        fs::create_dir_all(path).map_err(|e| CacheError::io(path, e))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, CacheError> {
        fs::canonicalize(path).map_err(|e| CacheError::io(path, e))
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, CacheError> {
        let entries = fs::read_dir(dir).map_err(|e| CacheError::io(dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(dir, e))?;
            paths.push(entry.path());
        }
        Ok(paths)
    }
}

/// Writes `bytes` to `path` through a temporary file and a rename.
///
/// The temporary file lives next to `path` so the rename never crosses a
/// file system. It is removed if anything fails before the rename.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".stowage-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| CacheError::io(path, e))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| CacheError::io(path, e))?;
    tmp.persist(path).map_err(|e| {
        tracing::debug!(
            target: "stowage.cache",
            path = %path.display(),
            tmp = %e.file.path().display(),
            error = %e.error,
            "rename into place failed"
        );
        CacheError::io(path, e.error)
    })?;
    Ok(())
}
