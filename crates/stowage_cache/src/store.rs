//! The disk cache: locating, validating, loading and saving artifacts.
//!
//! A [`DiskCache`] owns one flat folder. Each artifact lives at
//! `<folder>/<digest>.<artifact_ext>` where the digest is the hex hash of a
//! header fingerprint, with an optional `<folder>/<digest>.<metadata_ext>`
//! sidecar. Nothing is ever deleted; saving the same digest again overwrites.
//!
//! There is no locking. Two callers that miss on the same key at the same
//! time both compute and both write; the last write wins.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use stowage_common::HashAlgorithm;
use stowage_config::{CacheConfig, CacheMode};

use crate::codec::{ArtifactCodec, Codec};
use crate::error::{BoxError, CacheError};
use crate::fs::{FileSystem, StdFileSystem};
use crate::header::Header;
use crate::naming::{ByFileContent, ByMultiPaths, ByPath};
use crate::registry::{text_as_path, texts_as_paths, HeaderRegistry};
use crate::sidecar;
use crate::source::{Source, SourceKind};
use crate::validity::{ByExist, ByMultiPathsMTime, ByPathMTime};

/// Store-wide settings fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Digest algorithm for cache file names.
    pub hash: HashAlgorithm,
    /// Whether to write a header sidecar next to every artifact.
    pub store_header: bool,
    /// Artifact file extension, without the dot.
    pub artifact_ext: String,
    /// Sidecar file extension, without the dot.
    pub metadata_ext: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            hash: HashAlgorithm::Sha1,
            store_header: true,
            artifact_ext: "bin".to_string(),
            metadata_ext: "json".to_string(),
        }
    }
}

impl From<&CacheConfig> for StoreOptions {
    fn from(config: &CacheConfig) -> Self {
        Self {
            hash: config.hash,
            store_header: config.store_header,
            artifact_ext: config.artifact_ext().to_string(),
            metadata_ext: config.metadata_ext.clone(),
        }
    }
}

/// Computes an artifact on a cache miss.
///
/// The closure receives the source and, when the caller asks for it, the
/// digest the artifact will be stored under.
pub struct Producer<'a, T> {
    reader_id: String,
    func: Box<dyn FnOnce(&Source, Option<&str>) -> Result<T, BoxError> + 'a>,
}

impl<'a, T> Producer<'a, T> {
    /// Wraps `func` under the given reader id.
    ///
    /// The reader id becomes the first fingerprint chunk, so two producers
    /// with different ids never share cache entries.
    pub fn new<F>(reader_id: impl Into<String>, func: F) -> Self
    where
        F: FnOnce(&Source, Option<&str>) -> Result<T, BoxError> + 'a,
    {
        Self {
            reader_id: reader_id.into(),
            func: Box::new(func),
        }
    }

    /// The reader id of this producer.
    pub fn reader_id(&self) -> &str {
        &self.reader_id
    }
}

impl<T> fmt::Debug for Producer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("reader_id", &self.reader_id)
            .finish_non_exhaustive()
    }
}

/// Persistent, content-addressed artifact cache.
pub struct DiskCache<C: Codec = ArtifactCodec> {
    folder: PathBuf,
    options: StoreOptions,
    codec: C,
    fs: Arc<dyn FileSystem>,
    registry: HeaderRegistry,
}

impl DiskCache<ArtifactCodec> {
    /// Opens a cache in `folder` with default options and no registrations.
    ///
    /// The folder and its parents are created if missing.
    pub fn new(folder: impl Into<PathBuf>) -> Result<Self, CacheError> {
        Self::with_parts(
            folder,
            StoreOptions::default(),
            ArtifactCodec::default(),
            Arc::new(StdFileSystem),
        )
    }

    /// Opens a cache described by `config`, resolving a relative folder
    /// against `base_dir` and registering the configured mode's headers.
    pub fn from_config(base_dir: &Path, config: &CacheConfig) -> Result<Self, CacheError> {
        let mut cache = Self::with_parts(
            base_dir.join(&config.folder),
            StoreOptions::from(config),
            ArtifactCodec::from(config.codec),
            Arc::new(StdFileSystem),
        )?;
        match config.mode {
            CacheMode::Hash => cache.register_by_hash(),
            CacheMode::Mtime => {
                cache.register_by_mtime();
                cache.register_by_multi_mtime();
            }
        }
        Ok(cache)
    }

    /// Opens the cache described by `stowage.toml` in `project_dir`.
    pub fn from_project_dir(project_dir: &Path) -> Result<Self, CacheError> {
        let config = stowage_config::load_config(project_dir)?;
        Self::from_config(project_dir, &config.cache)
    }

    /// Cache naming files by content and trusting any existing artifact.
    pub fn by_hash(folder: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let mut cache = Self::new(folder)?;
        cache.register_by_hash();
        Ok(cache)
    }

    /// Cache naming files by resolved path and comparing modification times.
    pub fn by_mtime(folder: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let mut cache = Self::new(folder)?;
        cache.register_by_mtime();
        Ok(cache)
    }

    /// Cache naming file sets by their sorted resolved paths and comparing
    /// against the newest modification time.
    pub fn by_multi_mtime(folder: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let mut cache = Self::new(folder)?;
        cache.register_by_multi_mtime();
        Ok(cache)
    }
}

impl<C: Codec> DiskCache<C> {
    /// Opens a cache from explicit parts.
    ///
    /// Creating the folder is the only side effect.
    pub fn with_parts(
        folder: impl Into<PathBuf>,
        options: StoreOptions,
        codec: C,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self, CacheError> {
        let folder = folder.into();
        fs.create_dir_all(&folder)?;
        Ok(Self {
            folder,
            options,
            codec,
            fs,
            registry: HeaderRegistry::new(),
        })
    }

    /// The cache folder.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// The store options.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// The header registry.
    pub fn registry(&self) -> &HeaderRegistry {
        &self.registry
    }

    /// Registers a header constructor for sources matching `kind`.
    ///
    /// See [`HeaderRegistry::register`] for ordering rules.
    pub fn register_header_type<F>(&mut self, kind: SourceKind, factory: F)
    where
        F: Fn(Source, &str) -> Result<Header, CacheError> + Send + Sync + 'static,
    {
        self.registry.register(kind, factory);
    }

    fn register_by_hash(&mut self) {
        self.register_header_type(SourceKind::PathLike, |source, reader_id| {
            Ok(Header::new(text_as_path(source), reader_id, ByFileContent, ByExist))
        });
    }

    fn register_by_mtime(&mut self) {
        self.register_header_type(SourceKind::PathLike, |source, reader_id| {
            Ok(Header::new(text_as_path(source), reader_id, ByPath, ByPathMTime))
        });
    }

    fn register_by_multi_mtime(&mut self) {
        self.register_header_type(SourceKind::PathSet, |source, reader_id| {
            Ok(Header::new(
                texts_as_paths(source),
                reader_id,
                ByMultiPaths,
                ByMultiPathsMTime,
            ))
        });
    }

    /// Resolves the registered header type for `source` and builds a header.
    pub fn header_for(&self, source: &Source, reader_id: &str) -> Result<Header, CacheError> {
        self.registry.build(source, reader_id)
    }

    /// Hex digest of the header's fingerprint.
    pub fn stem_for(&self, header: &Header) -> Result<String, CacheError> {
        Ok(header.fingerprint(self.fs.as_ref())?.digest(self.options.hash))
    }

    /// Artifact path for `header`.
    pub fn location_for(&self, header: &Header) -> Result<PathBuf, CacheError> {
        Ok(self.artifact_path(&self.stem_for(header)?))
    }

    /// Artifact path for a digest.
    pub fn artifact_path(&self, stem: &str) -> PathBuf {
        self.folder.join(format!("{stem}.{}", self.options.artifact_ext))
    }

    /// Sidecar path for a digest.
    pub fn metadata_path(&self, stem: &str) -> PathBuf {
        self.folder.join(format!("{stem}.{}", self.options.metadata_ext))
    }

    /// Sidecar path belonging to an artifact path.
    fn sidecar_for(&self, location: &Path) -> PathBuf {
        let suffix = format!(".{}", self.options.artifact_ext);
        let name = location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match name.strip_suffix(&suffix) {
            Some(stem) if !stem.is_empty() => location.with_file_name(format!(
                "{stem}.{}",
                self.options.metadata_ext
            )),
            _ => location.with_extension(&self.options.metadata_ext),
        }
    }

    /// Returns `true` if a reusable artifact exists for `header`, without
    /// reading it.
    pub fn is_cached(&self, header: &Header) -> Result<bool, CacheError> {
        header.is_valid(self.fs.as_ref(), &self.location_for(header)?)
    }

    /// Loads the artifact for `header` if the header says it is valid.
    ///
    /// A missing or stale artifact yields `Ok(None)`. A present artifact
    /// that fails to decode is an error.
    pub fn raw_load<T: DeserializeOwned>(
        &self,
        header: &Header,
        location: Option<&Path>,
    ) -> Result<Option<T>, CacheError> {
        let location = match location {
            Some(l) => l.to_path_buf(),
            None => self.location_for(header)?,
        };
        if !header.is_valid(self.fs.as_ref(), &location)? {
            tracing::debug!(
                target: "stowage.cache",
                path = %location.display(),
                validity = header.validity().name(),
                "cache miss"
            );
            return Ok(None);
        }
        let bytes = self.fs.read(&location)?;
        let value = self.codec.decode(&bytes)?;
        tracing::debug!(
            target: "stowage.cache",
            path = %location.display(),
            bytes = bytes.len(),
            "cache hit"
        );
        Ok(Some(value))
    }

    /// Stores `artifact` for `header` and returns the artifact path.
    ///
    /// When sidecars are enabled the header fields are written first, so an
    /// artifact never exists without its description.
    pub fn raw_save<T: Serialize + ?Sized>(
        &self,
        header: &Header,
        artifact: &T,
        location: Option<&Path>,
    ) -> Result<PathBuf, CacheError> {
        let location = match location {
            Some(l) => l.to_path_buf(),
            None => self.location_for(header)?,
        };
        let bytes = self.codec.encode(artifact)?;
        if self.options.store_header {
            sidecar::write_sidecar(self.fs.as_ref(), &self.sidecar_for(&location), header)?;
        }
        self.fs.write(&location, &bytes)?;
        tracing::debug!(
            target: "stowage.cache",
            path = %location.display(),
            bytes = bytes.len(),
            codec = self.codec.name(),
            "stored artifact"
        );
        Ok(location)
    }

    /// Loads the artifact for `source`, computing and storing it on a miss.
    ///
    /// Returns the artifact (or `None` on a miss without a producer) and
    /// the digest it is stored under. The producer sees the source as the
    /// registered header type adapted it, so a text source registered as a
    /// path arrives as [`Source::Path`]. The producer's reader id becomes the
    /// header's reader id; without a producer it is empty. With
    /// `pass_digest` the producer also receives the digest.
    pub fn load_or_compute<T>(
        &self,
        source: &Source,
        producer: Option<Producer<'_, T>>,
        pass_digest: bool,
    ) -> Result<(Option<T>, String), CacheError>
    where
        T: Serialize + DeserializeOwned,
    {
        let reader_id = producer.as_ref().map_or("", |p| p.reader_id());
        let header = self.header_for(source, reader_id)?;
        let stem = self.stem_for(&header)?;
        let location = self.artifact_path(&stem);

        if let Some(value) = self.raw_load(&header, Some(&location))? {
            return Ok((Some(value), stem));
        }
        let Some(producer) = producer else {
            return Ok((None, stem));
        };

        tracing::debug!(
            target: "stowage.cache",
            reader_id = %producer.reader_id,
            digest = %stem,
            "computing artifact"
        );
        let digest = pass_digest.then_some(stem.as_str());
        let value = (producer.func)(header.source(), digest).map_err(|source| {
            CacheError::Producer {
                reader_id: producer.reader_id.clone(),
                source,
            }
        })?;
        self.raw_save(&header, &value, Some(&location))?;
        Ok((Some(value), stem))
    }

    /// Loads the artifact for `source` without computing anything.
    pub fn load<T>(&self, source: &Source) -> Result<(Option<T>, String), CacheError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.load_or_compute(source, None, false)
    }

    /// Stores an already computed artifact under the key for `source`,
    /// using an empty reader id, and returns the digest.
    pub fn save<T: Serialize + ?Sized>(
        &self,
        artifact: &T,
        source: &Source,
    ) -> Result<String, CacheError> {
        let header = self.header_for(source, "")?;
        let stem = self.stem_for(&header)?;
        self.raw_save(&header, artifact, Some(&self.artifact_path(&stem)))?;
        Ok(stem)
    }

    /// Reads the sidecar stored for a digest, if there is one.
    pub fn read_sidecar(&self, stem: &str) -> Result<Option<Vec<(String, String)>>, CacheError> {
        let path = self.metadata_path(stem);
        if !self.fs.exists(&path) {
            return Ok(None);
        }
        sidecar::read_sidecar(self.fs.as_ref(), &path).map(Some)
    }

    /// Digests of every artifact in the folder, sorted.
    pub fn entries(&self) -> Result<Vec<String>, CacheError> {
        let suffix = format!(".{}", self.options.artifact_ext);
        let mut stems: Vec<String> = self
            .fs
            .read_dir(&self.folder)?
            .iter()
            .filter_map(|p| p.file_name()?.to_str()?.strip_suffix(&suffix).map(str::to_string))
            .filter(|stem| !stem.is_empty() && stem.chars().all(|c| c.is_ascii_hexdigit()))
            .collect();
        stems.sort();
        Ok(stems)
    }
}

impl<C: Codec + fmt::Debug> fmt::Debug for DiskCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskCache")
            .field("folder", &self.folder)
            .field("options", &self.options)
            .field("codec", &self.codec)
            .field("registry", &self.registry)
            .finish()
    }
}
