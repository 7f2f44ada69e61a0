//! Source objects and the kinds used to dispatch them to header types.
//!
//! A [`Source`] is whatever a cached artifact is derived from: a file, a set
//! of files, a serialized value, or a list of precomputed hashes. Which
//! naming and validity strategies make sense depends on its kind.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::CacheError;

/// Identifier of the protocol used to encode [`Source::Object`] payloads.
///
/// Emitted as part of the fingerprint of object sources so that a change of
/// encoding produces new cache keys instead of silently reusing old ones.
pub const OBJECT_PROTOCOL: &str = "bincode-2/standard";

/// The object a cached artifact is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A single file-system path.
    Path(PathBuf),
    /// A string, usually adapted into a path by the header constructor.
    Text(String),
    /// A collection of file-system paths.
    Paths(Vec<PathBuf>),
    /// A collection of strings, usually adapted into paths.
    Texts(Vec<String>),
    /// Precomputed content hashes.
    Hashes(Vec<String>),
    /// An arbitrary value, already serialized.
    Object(ObjectSource),
}

/// A serialized value used as a source object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSource {
    protocol: &'static str,
    bytes: Vec<u8>,
    repr: String,
}

impl ObjectSource {
    /// Identifier of the encoding protocol.
    pub fn protocol(&self) -> &'static str {
        self.protocol
    }

    /// The encoded bytes of the value.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The `Debug` rendering of the value, kept for sidecars.
    pub fn repr(&self) -> &str {
        &self.repr
    }
}

impl Source {
    /// Wraps a single path.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Wraps a collection of paths.
    pub fn paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::Paths(paths.into_iter().map(Into::into).collect())
    }

    /// Wraps a collection of precomputed hash strings.
    pub fn hashes<I, S>(hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Hashes(hashes.into_iter().map(Into::into).collect())
    }

    /// Serializes `value` with [`OBJECT_PROTOCOL`] and wraps the result.
    pub fn object<T>(value: &T) -> Result<Self, CacheError>
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        let bytes = bincode::serde::encode_to_vec(value, bincode::config::standard())
            .map_err(CacheError::serialization)?;
        Ok(Self::Object(ObjectSource {
            protocol: OBJECT_PROTOCOL,
            bytes,
            repr: format!("{value:?}"),
        }))
    }

    /// Returns the exact kind of this source.
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Path(_) => SourceKind::Path,
            Self::Text(_) => SourceKind::Text,
            Self::Paths(_) => SourceKind::Paths,
            Self::Texts(_) => SourceKind::Texts,
            Self::Hashes(_) => SourceKind::Hashes,
            Self::Object(_) => SourceKind::Object,
        }
    }

    /// Returns the path of a single-path source.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p.as_path()),
            _ => None,
        }
    }

    /// Returns the paths of a multi-path source.
    pub fn as_paths(&self) -> Option<&[PathBuf]> {
        match self {
            Self::Paths(p) => Some(p.as_slice()),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            f.write_str("]")
        }

        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Text(s) => f.write_str(s),
            Self::Paths(ps) => {
                let shown: Vec<_> = ps.iter().map(|p| p.display()).collect();
                list(f, &shown)
            }
            Self::Texts(ss) | Self::Hashes(ss) => list(f, ss),
            Self::Object(o) => f.write_str(&o.repr),
        }
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Source {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<PathBuf>> for Source {
    fn from(paths: Vec<PathBuf>) -> Self {
        Self::Paths(paths)
    }
}

impl From<Vec<String>> for Source {
    fn from(texts: Vec<String>) -> Self {
        Self::Texts(texts)
    }
}

/// A pattern over source kinds, used as the key of header registrations.
///
/// The exact kinds match only themselves. The wider kinds play the role of
/// a supertype: [`PathLike`](Self::PathLike) matches paths and strings,
/// [`PathSet`](Self::PathSet) matches path and string collections, and
/// [`Any`](Self::Any) matches everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A single path.
    Path,
    /// A single string.
    Text,
    /// Several paths.
    Paths,
    /// Several strings.
    Texts,
    /// Precomputed hashes.
    Hashes,
    /// A serialized value.
    Object,
    /// A path or a string.
    PathLike,
    /// Several paths or several strings.
    PathSet,
    /// Any source.
    Any,
}

impl SourceKind {
    /// Returns `true` if `source` is an instance of this kind.
    pub fn matches(self, source: &Source) -> bool {
        let exact = source.kind();
        match self {
            Self::Any => true,
            Self::PathLike => matches!(exact, Self::Path | Self::Text),
            Self::PathSet => matches!(exact, Self::Paths | Self::Texts),
            other => other == exact,
        }
    }

    /// Returns the lowercase name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Text => "text",
            Self::Paths => "paths",
            Self::Texts => "texts",
            Self::Hashes => "hashes",
            Self::Object => "object",
            Self::PathLike => "path-like",
            Self::PathSet => "path-set",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
