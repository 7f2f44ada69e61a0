//! Validity strategies: whether a stored artifact may be reused.
//!
//! Timestamp comparisons are strict. An artifact whose modification time
//! equals its newest source is stale, since coarse file-system clocks can
//! give both files the same stamp even when the source changed afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::CacheError;
use crate::fs::FileSystem;
use crate::header::Header;
use crate::naming::single_path;

/// Decides whether the artifact at a cache location is still usable.
pub trait ValidityStrategy: fmt::Debug + Send + Sync {
    /// Short name of the strategy, used in errors and logs.
    fn name(&self) -> &'static str;

    /// Returns `true` if the artifact at `cache_path` can be reused for `header`.
    fn is_valid(
        &self,
        header: &Header,
        fs: &dyn FileSystem,
        cache_path: &Path,
    ) -> Result<bool, CacheError>;
}

/// Valid iff the artifact exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByExist;

impl ValidityStrategy for ByExist {
    fn name(&self) -> &'static str {
        "ByExist"
    }

    fn is_valid(
        &self,
        _: &Header,
        fs: &dyn FileSystem,
        cache_path: &Path,
    ) -> Result<bool, CacheError> {
        Ok(fs.exists(cache_path))
    }
}

/// Valid iff the artifact exists and is newer than the single source path.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByPathMTime;

impl ValidityStrategy for ByPathMTime {
    fn name(&self) -> &'static str {
        "ByPathMTime"
    }

    fn is_valid(
        &self,
        header: &Header,
        fs: &dyn FileSystem,
        cache_path: &Path,
    ) -> Result<bool, CacheError> {
        let source = single_path(self.name(), header.source())?;
        if !fs.exists(cache_path) {
            return Ok(false);
        }
        Ok(fs.modified(cache_path)? > fs.modified(source)?)
    }
}

/// Valid iff the artifact exists and is newer than every source path.
///
/// An empty path set imposes no constraint beyond existence.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByMultiPathsMTime;

impl ByMultiPathsMTime {
    /// Latest modification time among the header's source paths.
    pub fn newest_date(
        &self,
        header: &Header,
        fs: &dyn FileSystem,
    ) -> Result<SystemTime, CacheError> {
        newest_of(fs, self.source_paths(header)?)
    }

    fn source_paths<'a>(&self, header: &'a Header) -> Result<&'a [PathBuf], CacheError> {
        header
            .source()
            .as_paths()
            .ok_or_else(|| CacheError::SourceMismatch {
                strategy: self.name(),
                expected: "paths",
                found: header.source().kind(),
            })
    }
}

impl ValidityStrategy for ByMultiPathsMTime {
    fn name(&self) -> &'static str {
        "ByMultiPathsMTime"
    }

    fn is_valid(
        &self,
        header: &Header,
        fs: &dyn FileSystem,
        cache_path: &Path,
    ) -> Result<bool, CacheError> {
        let paths = self.source_paths(header)?;
        if !fs.exists(cache_path) {
            return Ok(false);
        }
        Ok(fs.modified(cache_path)? > newest_of(fs, paths)?)
    }
}

fn newest_of(fs: &dyn FileSystem, paths: &[PathBuf]) -> Result<SystemTime, CacheError> {
    let mut newest = UNIX_EPOCH;
    for path in paths {
        newest = newest.max(fs.modified(path)?);
    }
    Ok(newest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::StdFileSystem;
    use crate::naming::{ByMultiPaths, ByPath, ByReaderId};
    use crate::source::Source;
    use std::time::Duration;

    fn set_mtime(path: &Path, time: SystemTime) {
        let f = std::fs::OpenOptions::new().write(true).open(path).unwrap();
        f.set_modified(time).unwrap();
    }

    fn base() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_600_000_000)
    }

    #[test]
    fn by_exist_follows_file_presence() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache.bin");
        let h = Header::new(Source::from("123"), "myreader", ByReaderId, ByExist);
        assert!(!h.is_valid(&StdFileSystem, &cache).unwrap());
        std::fs::write(&cache, b"").unwrap();
        assert!(h.is_valid(&StdFileSystem, &cache).unwrap());

        // Timestamps are irrelevant.
        set_mtime(&cache, UNIX_EPOCH + Duration::from_secs(1));
        assert!(h.is_valid(&StdFileSystem, &cache).unwrap());
    }

    #[test]
    fn by_path_mtime_is_strict() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("source.txt");
        let cache = dir.path().join("cache.bin");
        std::fs::write(&src, b"1234").unwrap();
        let h = Header::new(Source::path(&src), "", ByPath, ByPathMTime);

        assert!(!h.is_valid(&StdFileSystem, &cache).unwrap());

        std::fs::write(&cache, b"artifact").unwrap();
        set_mtime(&src, base());

        set_mtime(&cache, base() + Duration::from_secs(1));
        assert!(h.is_valid(&StdFileSystem, &cache).unwrap());

        set_mtime(&cache, base());
        assert!(!h.is_valid(&StdFileSystem, &cache).unwrap());

        set_mtime(&cache, base() - Duration::from_secs(1));
        assert!(!h.is_valid(&StdFileSystem, &cache).unwrap());
    }

    #[test]
    fn by_path_mtime_missing_source_errors() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache.bin");
        std::fs::write(&cache, b"artifact").unwrap();
        let h = Header::new(Source::path(dir.path().join("gone")), "", ByPath, ByPathMTime);
        assert!(matches!(
            h.is_valid(&StdFileSystem, &cache),
            Err(CacheError::Io { .. })
        ));
    }

    #[test]
    fn by_multi_paths_mtime_compares_against_newest() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = (1..=3)
            .map(|i| {
                let p = dir.path().join(format!("s{i}.txt"));
                std::fs::write(&p, b"x").unwrap();
                p
            })
            .collect();
        let t1 = base();
        let t2 = base() + Duration::from_secs(10);
        let t3 = base() + Duration::from_secs(20);
        set_mtime(&paths[0], t1);
        set_mtime(&paths[1], t2);
        set_mtime(&paths[2], t3);

        let cache = dir.path().join("cache.bin");
        std::fs::write(&cache, b"artifact").unwrap();
        let h = Header::new(Source::paths(&paths), "", ByMultiPaths, ByMultiPathsMTime);

        assert_eq!(ByMultiPathsMTime.newest_date(&h, &StdFileSystem).unwrap(), t3);

        // Newer than t1 and t2 is not enough.
        set_mtime(&cache, t2 + Duration::from_secs(5));
        assert!(!h.is_valid(&StdFileSystem, &cache).unwrap());

        set_mtime(&cache, t3);
        assert!(!h.is_valid(&StdFileSystem, &cache).unwrap());

        set_mtime(&cache, t3 + Duration::from_secs(1));
        assert!(h.is_valid(&StdFileSystem, &cache).unwrap());
    }

    #[test]
    fn by_multi_paths_mtime_empty_set_is_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache.bin");
        let h = Header::new(
            Source::Paths(Vec::new()),
            "",
            ByMultiPaths,
            ByMultiPathsMTime,
        );
        assert_eq!(
            ByMultiPathsMTime.newest_date(&h, &StdFileSystem).unwrap(),
            UNIX_EPOCH
        );
        assert!(!h.is_valid(&StdFileSystem, &cache).unwrap());
        std::fs::write(&cache, b"artifact").unwrap();
        assert!(h.is_valid(&StdFileSystem, &cache).unwrap());
    }
}
