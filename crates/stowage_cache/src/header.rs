//! Cache headers and the fingerprints they produce.
//!
//! A [`Header`] combines a source object, a reader id, optional descriptive
//! fields, one [`NamingStrategy`] and one [`ValidityStrategy`]. The store
//! hashes [`Header::fingerprint`] to name the cache file and asks
//! [`Header::is_valid`] whether an existing file may be reused.

use std::path::Path;
use std::sync::Arc;

use stowage_common::HashAlgorithm;

use crate::error::CacheError;
use crate::fs::FileSystem;
use crate::naming::{
    ByFields, ByFileContent, ByHashIter, ByMultiPaths, ByObj, ByPath, NamingStrategy,
};
use crate::source::Source;
use crate::validity::{ByExist, ByMultiPathsMTime, ByPathMTime, ValidityStrategy};

/// Ordered byte chunks identifying a header.
///
/// Chunks are fed one by one into a digest accumulator; they are never
/// concatenated into a file name directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint(Vec<Vec<u8>>);

impl Fingerprint {
    /// Creates an empty fingerprint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk.
    pub fn push(&mut self, chunk: impl Into<Vec<u8>>) {
        self.0.push(chunk.into());
    }

    /// Iterates over the chunks in order.
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> {
        self.0.iter().map(Vec::as_slice)
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no chunks.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hashes every chunk with `algorithm` and returns the hex digest.
    pub fn digest(&self, algorithm: HashAlgorithm) -> String {
        let mut acc = algorithm.accumulator();
        for chunk in self.chunks() {
            acc.update(chunk);
        }
        acc.finish()
    }

    /// Consumes the fingerprint, returning the raw chunks.
    pub fn into_chunks(self) -> Vec<Vec<u8>> {
        self.0
    }
}

/// Immutable description of a cache lookup.
#[derive(Debug, Clone)]
pub struct Header {
    source: Source,
    reader_id: String,
    fields: Vec<(String, String)>,
    naming: Arc<dyn NamingStrategy>,
    validity: Arc<dyn ValidityStrategy>,
}

impl Header {
    /// Builds a header from a source, a reader id and two strategies.
    pub fn new(
        source: Source,
        reader_id: impl Into<String>,
        naming: impl NamingStrategy + 'static,
        validity: impl ValidityStrategy + 'static,
    ) -> Self {
        Self::with_strategies(source, reader_id, Arc::new(naming), Arc::new(validity))
    }

    /// Builds a header from already shared strategy objects.
    pub fn with_strategies(
        source: Source,
        reader_id: impl Into<String>,
        naming: Arc<dyn NamingStrategy>,
        validity: Arc<dyn ValidityStrategy>,
    ) -> Self {
        Self {
            source,
            reader_id: reader_id.into(),
            fields: Vec::new(),
            naming,
            validity,
        }
    }

    /// Header named by file content, valid while the artifact exists.
    pub fn by_file_content(path: impl AsRef<Path>, reader_id: impl Into<String>) -> Self {
        Self::new(Source::path(path.as_ref()), reader_id, ByFileContent, ByExist)
    }

    /// Header named by resolved path, valid while the artifact is newer than the file.
    pub fn by_path(path: impl AsRef<Path>, reader_id: impl Into<String>) -> Self {
        Self::new(Source::path(path.as_ref()), reader_id, ByPath, ByPathMTime)
    }

    /// Header named by a sorted set of resolved paths, valid while the
    /// artifact is newer than the newest file.
    pub fn by_multi_paths<I, P>(paths: I, reader_id: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let source = Source::paths(paths.into_iter().map(|p| p.as_ref().to_path_buf()));
        Self::new(source, reader_id, ByMultiPaths, ByMultiPathsMTime)
    }

    /// Header named by a serialized value, valid while the artifact exists.
    pub fn by_object<T>(value: &T, reader_id: impl Into<String>) -> Result<Self, CacheError>
    where
        T: serde::Serialize + std::fmt::Debug + ?Sized,
    {
        Ok(Self::new(Source::object(value)?, reader_id, ByObj, ByExist))
    }

    /// Header named by a sorted list of precomputed hashes, valid while the artifact exists.
    pub fn by_hashes<I, S>(hashes: I, reader_id: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Source::hashes(hashes), reader_id, ByHashIter, ByExist)
    }

    /// Header carrying [`platform_fields`], named by those fields.
    pub fn basic(source: Source, reader_id: impl Into<String>) -> Self {
        Self::new(source, reader_id, ByFields, ByExist).with_fields(platform_fields())
    }

    /// Returns a copy with one more descriptive field appended.
    ///
    /// The names `source` and `reader_id` are taken by the header itself and
    /// are shadowed by it in sidecars.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Returns a copy with several descriptive fields appended in order.
    pub fn with_fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// The source object.
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// The reader identifier.
    pub fn reader_id(&self) -> &str {
        &self.reader_id
    }

    /// Descriptive fields, in declared order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// The naming strategy.
    pub fn naming(&self) -> &dyn NamingStrategy {
        self.naming.as_ref()
    }

    /// The validity strategy.
    pub fn validity(&self) -> &dyn ValidityStrategy {
        self.validity.as_ref()
    }

    /// Computes the fingerprint: the reader id, then the naming strategy's chunks.
    ///
    /// Recomputed from scratch on every call.
    pub fn fingerprint(&self, fs: &dyn FileSystem) -> Result<Fingerprint, CacheError> {
        let mut out = Fingerprint::new();
        out.push(self.reader_id.as_bytes());
        self.naming.contribute(self, fs, &mut out)?;
        Ok(out)
    }

    /// Returns `true` if the artifact at `cache_path` may be reused.
    pub fn is_valid(&self, fs: &dyn FileSystem, cache_path: &Path) -> Result<bool, CacheError> {
        self.validity.is_valid(self, fs, cache_path)
    }

    /// Every header field stringified, for sidecars.
    pub fn describe(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.fields.len() + 2);
        out.push(("source".to_string(), self.source.to_string()));
        out.push(("reader_id".to_string(), self.reader_id.clone()));
        out.extend(self.fields.iter().cloned());
        out
    }
}

/// Descriptive fields about the running platform and library version.
pub fn platform_fields() -> Vec<(String, String)> {
    vec![
        ("system".to_string(), std::env::consts::OS.to_string()),
        ("arch".to_string(), std::env::consts::ARCH.to_string()),
        (
            "stowage_version".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::StdFileSystem;

    #[test]
    fn basic_header_has_reader_and_platform_chunks() {
        let h = Header::basic(Source::from("123"), "myreader");
        let fp = h.fingerprint(&StdFileSystem).unwrap();
        assert_eq!(fp.len(), 4);
        assert_eq!(fp.chunks().next().unwrap(), b"myreader");
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("a.txt");
        std::fs::write(&p, b"content").unwrap();
        for h in [Header::by_file_content(&p, "r"), Header::by_path(&p, "r")] {
            let a = h.fingerprint(&StdFileSystem).unwrap();
            let b = h.fingerprint(&StdFileSystem).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn independently_built_field_headers_agree() {
        let build = || {
            Header::new(Source::from("x"), "r", ByFields, ByExist)
                .with_field("system", "linux")
                .with_field("version", "3.11")
        };
        let a = build().fingerprint(&StdFileSystem).unwrap();
        let b = build().fingerprint(&StdFileSystem).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.digest(HashAlgorithm::Sha1),
            b.digest(HashAlgorithm::Sha1)
        );
    }

    #[test]
    fn fields_only_count_with_by_fields() {
        let plain = Header::new(Source::from("x"), "r", crate::naming::ByReaderId, ByExist);
        let decorated = plain.clone().with_field("system", "linux");
        assert_eq!(
            plain.fingerprint(&StdFileSystem).unwrap(),
            decorated.fingerprint(&StdFileSystem).unwrap()
        );
    }

    #[test]
    fn permuted_hashes_give_same_digest() {
        let a = Header::by_hashes(["3", "1", "2"], "r");
        let b = Header::by_hashes(["2", "3", "1"], "r");
        assert_eq!(
            a.fingerprint(&StdFileSystem).unwrap().digest(HashAlgorithm::Sha1),
            b.fingerprint(&StdFileSystem).unwrap().digest(HashAlgorithm::Sha1)
        );
    }

    #[test]
    fn reader_id_changes_digest() {
        let a = Header::by_hashes(["1"], "reader_a");
        let b = Header::by_hashes(["1"], "reader_b");
        assert_ne!(
            a.fingerprint(&StdFileSystem).unwrap().digest(HashAlgorithm::Sha1),
            b.fingerprint(&StdFileSystem).unwrap().digest(HashAlgorithm::Sha1)
        );
    }

    #[test]
    fn digest_of_chunks_matches_concatenated_stream() {
        let h = Header::by_hashes(["b", "a"], "r");
        let fp = h.fingerprint(&StdFileSystem).unwrap();
        assert_eq!(
            fp.digest(HashAlgorithm::Sha1),
            HashAlgorithm::Sha1.hex_digest(b"rab")
        );
    }

    #[test]
    fn describe_lists_every_field() {
        let h = Header::by_hashes(["a", "b"], "myreader").with_field("system", "linux");
        assert_eq!(
            h.describe(),
            vec![
                ("source".to_string(), "[a, b]".to_string()),
                ("reader_id".to_string(), "myreader".to_string()),
                ("system".to_string(), "linux".to_string()),
            ]
        );
    }

    #[test]
    fn object_header_keeps_debug_repr() {
        let h = Header::by_object(&(1, 2, 3), "myreader").unwrap();
        assert_eq!(h.describe()[0].1, "(1, 2, 3)");
        assert_eq!(h.fingerprint(&StdFileSystem).unwrap().len(), 3);
    }
}
