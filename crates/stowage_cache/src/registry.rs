//! Mapping from source kinds to header constructors.
//!
//! Resolution walks the registrations in the order they were first made and
//! picks the first kind that matches the source. Overlapping kinds (say
//! [`SourceKind::Path`] and [`SourceKind::PathLike`]) are therefore
//! order-sensitive: register the narrower one first.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::CacheError;
use crate::header::Header;
use crate::source::{Source, SourceKind};

/// Builds a header for a source and a reader id.
pub type HeaderFactory = Arc<dyn Fn(Source, &str) -> Result<Header, CacheError> + Send + Sync>;

/// Ordered list of `(kind, factory)` registrations.
#[derive(Clone, Default)]
pub struct HeaderRegistry {
    entries: Vec<(SourceKind, HeaderFactory)>,
}

impl HeaderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` for sources matching `kind`.
    ///
    /// Registering the same kind twice replaces the earlier factory but keeps
    /// its position in the resolution order.
    pub fn register<F>(&mut self, kind: SourceKind, factory: F)
    where
        F: Fn(Source, &str) -> Result<Header, CacheError> + Send + Sync + 'static,
    {
        let factory: HeaderFactory = Arc::new(factory);
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some(slot) => slot.1 = factory,
            None => self.entries.push((kind, factory)),
        }
    }

    /// Returns the registered kinds in resolution order.
    pub fn kinds(&self) -> impl Iterator<Item = SourceKind> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    /// Finds the first registration whose kind matches `source`.
    pub fn resolve(&self, source: &Source) -> Result<(SourceKind, &HeaderFactory), CacheError> {
        self.entries
            .iter()
            .find(|(kind, _)| kind.matches(source))
            .map(|(kind, factory)| (*kind, factory))
            .ok_or(CacheError::NoMatchingHeader {
                kind: source.kind(),
            })
    }

    /// Resolves a factory for `source` and builds its header.
    pub fn build(&self, source: &Source, reader_id: &str) -> Result<Header, CacheError> {
        let (kind, factory) = self.resolve(source)?;
        tracing::trace!(
            target: "stowage.cache",
            source_kind = %source.kind(),
            registered = %kind,
            "resolved header type"
        );
        factory(source.clone(), reader_id)
    }
}

impl fmt::Debug for HeaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}

/// Turns a [`Source::Text`] into a [`Source::Path`]; other sources pass through.
pub fn text_as_path(source: Source) -> Source {
    match source {
        Source::Text(s) => Source::Path(PathBuf::from(s)),
        other => other,
    }
}

/// Turns a [`Source::Texts`] into a [`Source::Paths`]; other sources pass through.
pub fn texts_as_paths(source: Source) -> Source {
    match source {
        Source::Texts(ss) => Source::Paths(ss.into_iter().map(PathBuf::from).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{ByHashIter, ByPath, ByReaderId};
    use crate::validity::{ByExist, ByPathMTime};

    fn reader_only(source: Source, reader_id: &str) -> Result<Header, CacheError> {
        Ok(Header::new(source, reader_id, ByReaderId, ByExist))
    }

    #[test]
    fn unregistered_kind_is_a_configuration_error() {
        let mut reg = HeaderRegistry::new();
        reg.register(SourceKind::Path, reader_only);
        let err = reg.build(&Source::hashes(["a"]), "").unwrap_err();
        assert!(matches!(
            err,
            CacheError::NoMatchingHeader {
                kind: SourceKind::Hashes
            }
        ));
    }

    #[test]
    fn first_matching_registration_wins() {
        let mut reg = HeaderRegistry::new();
        reg.register(SourceKind::Any, reader_only);
        reg.register(SourceKind::Hashes, |s, r| {
            Ok(Header::new(s, r, ByHashIter, ByExist))
        });
        let h = reg.build(&Source::hashes(["a"]), "r").unwrap();
        assert_eq!(h.naming().name(), "ByReaderId");
    }

    #[test]
    fn narrower_kind_registered_first_wins() {
        let mut reg = HeaderRegistry::new();
        reg.register(SourceKind::Hashes, |s, r| {
            Ok(Header::new(s, r, ByHashIter, ByExist))
        });
        reg.register(SourceKind::Any, reader_only);
        let h = reg.build(&Source::hashes(["a"]), "r").unwrap();
        assert_eq!(h.naming().name(), "ByHashIter");
        let h = reg.build(&Source::path("x"), "r").unwrap();
        assert_eq!(h.naming().name(), "ByReaderId");
    }

    #[test]
    fn re_registration_replaces_in_place() {
        let mut reg = HeaderRegistry::new();
        reg.register(SourceKind::Path, reader_only);
        reg.register(SourceKind::Text, reader_only);
        reg.register(SourceKind::Path, |s, r| {
            Ok(Header::new(s, r, ByPath, ByPathMTime))
        });
        assert_eq!(
            reg.kinds().collect::<Vec<_>>(),
            vec![SourceKind::Path, SourceKind::Text]
        );
        let h = reg.build(&Source::path("x"), "").unwrap();
        assert_eq!(h.validity().name(), "ByPathMTime");
    }

    #[test]
    fn text_adapters() {
        assert_eq!(text_as_path(Source::from("a/b")), Source::path("a/b"));
        assert_eq!(
            texts_as_paths(Source::from(vec!["a".to_string(), "b".to_string()])),
            Source::paths(["a", "b"])
        );
        assert_eq!(text_as_path(Source::hashes(["x"])), Source::hashes(["x"]));
    }

    #[test]
    fn reader_id_is_forwarded() {
        let mut reg = HeaderRegistry::new();
        reg.register(SourceKind::Any, reader_only);
        let h = reg.build(&Source::from("x"), "my_reader").unwrap();
        assert_eq!(h.reader_id(), "my_reader");
    }
}
