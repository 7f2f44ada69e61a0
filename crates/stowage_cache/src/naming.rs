//! Naming strategies: how a header's source contributes to its fingerprint.
//!
//! The header always emits its reader id first; the naming strategy then
//! appends the chunks that identify the source. Strategies that treat
//! collections as sets sort their chunks so input order never matters.

use std::fmt;
use std::path::Path;

use crate::error::CacheError;
use crate::fs::FileSystem;
use crate::header::{Fingerprint, Header};
use crate::source::Source;

/// Appends source-derived chunks to a fingerprint.
pub trait NamingStrategy: fmt::Debug + Send + Sync {
    /// Short name of the strategy, used in errors and logs.
    fn name(&self) -> &'static str;

    /// Appends this strategy's chunks for `header` to `out`.
    fn contribute(
        &self,
        header: &Header,
        fs: &dyn FileSystem,
        out: &mut Fingerprint,
    ) -> Result<(), CacheError>;
}

/// Contributes nothing beyond the reader id.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByReaderId;

impl NamingStrategy for ByReaderId {
    fn name(&self) -> &'static str {
        "ByReaderId"
    }

    fn contribute(
        &self,
        _: &Header,
        _: &dyn FileSystem,
        _: &mut Fingerprint,
    ) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Appends the value of every extra header field, in declared order.
///
/// Extras named `source` or `reader_id` are skipped; those names belong to
/// the header itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByFields;

impl NamingStrategy for ByFields {
    fn name(&self) -> &'static str {
        "ByFields"
    }

    fn contribute(
        &self,
        header: &Header,
        _: &dyn FileSystem,
        out: &mut Fingerprint,
    ) -> Result<(), CacheError> {
        for (name, value) in header.fields() {
            if name != "source" && name != "reader_id" {
                out.push(value.as_bytes());
            }
        }
        Ok(())
    }
}

/// Appends the full content of the source file.
///
/// The key changes whenever the content does, so pair it with
/// [`ByExist`](crate::validity::ByExist).
#[derive(Debug, Default, Clone, Copy)]
pub struct ByFileContent;

impl NamingStrategy for ByFileContent {
    fn name(&self) -> &'static str {
        "ByFileContent"
    }

    fn contribute(
        &self,
        header: &Header,
        fs: &dyn FileSystem,
        out: &mut Fingerprint,
    ) -> Result<(), CacheError> {
        let path = single_path(self.name(), header.source())?;
        out.push(fs.read(path)?);
        Ok(())
    }
}

/// Appends the canonicalized path of the source file, without reading it.
///
/// Pair it with [`ByPathMTime`](crate::validity::ByPathMTime) so edits to
/// the file are noticed.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByPath;

impl NamingStrategy for ByPath {
    fn name(&self) -> &'static str {
        "ByPath"
    }

    fn contribute(
        &self,
        header: &Header,
        fs: &dyn FileSystem,
        out: &mut Fingerprint,
    ) -> Result<(), CacheError> {
        let path = single_path(self.name(), header.source())?;
        out.push(path_bytes(&fs.canonicalize(path)?));
        Ok(())
    }
}

/// Appends the canonicalized path of every source file, sorted.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByMultiPaths;

impl NamingStrategy for ByMultiPaths {
    fn name(&self) -> &'static str {
        "ByMultiPaths"
    }

    fn contribute(
        &self,
        header: &Header,
        fs: &dyn FileSystem,
        out: &mut Fingerprint,
    ) -> Result<(), CacheError> {
        let paths = header
            .source()
            .as_paths()
            .ok_or_else(|| CacheError::SourceMismatch {
                strategy: self.name(),
                expected: "paths",
                found: header.source().kind(),
            })?;
        let mut resolved = paths
            .iter()
            .map(|p| fs.canonicalize(p).map(|c| path_bytes(&c)))
            .collect::<Result<Vec<_>, _>>()?;
        resolved.sort();
        for chunk in resolved {
            out.push(chunk);
        }
        Ok(())
    }
}

/// Appends the encoding protocol and the encoded bytes of an object source.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByObj;

impl NamingStrategy for ByObj {
    fn name(&self) -> &'static str {
        "ByObj"
    }

    fn contribute(
        &self,
        header: &Header,
        _: &dyn FileSystem,
        out: &mut Fingerprint,
    ) -> Result<(), CacheError> {
        let Source::Object(obj) = header.source() else {
            return Err(CacheError::SourceMismatch {
                strategy: self.name(),
                expected: "object",
                found: header.source().kind(),
            });
        };
        out.push(obj.protocol().as_bytes());
        out.push(obj.bytes());
        Ok(())
    }
}

/// Appends precomputed hash strings, sorted.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByHashIter;

impl NamingStrategy for ByHashIter {
    fn name(&self) -> &'static str {
        "ByHashIter"
    }

    fn contribute(
        &self,
        header: &Header,
        _: &dyn FileSystem,
        out: &mut Fingerprint,
    ) -> Result<(), CacheError> {
        let hashes = match header.source() {
            Source::Hashes(h) | Source::Texts(h) => h,
            other => {
                return Err(CacheError::SourceMismatch {
                    strategy: self.name(),
                    expected: "hashes",
                    found: other.kind(),
                })
            }
        };
        let mut sorted: Vec<&String> = hashes.iter().collect();
        sorted.sort();
        for h in sorted {
            out.push(h.as_bytes());
        }
        Ok(())
    }
}

pub(crate) fn single_path<'a>(
    strategy: &'static str,
    source: &'a Source,
) -> Result<&'a Path, CacheError> {
    source.as_path().ok_or_else(|| CacheError::SourceMismatch {
        strategy,
        expected: "path",
        found: source.kind(),
    })
}

/// Raw bytes of a path, as the platform stores them where possible.
pub(crate) fn path_bytes(path: &Path) -> Vec<u8> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    }
    #[cfg(not(unix))]
    {
        path.to_string_lossy().into_owned().into_bytes()
    }
}
