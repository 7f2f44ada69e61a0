//! Configuration types deserialized from `stowage.toml`.

use serde::Deserialize;
use stowage_common::HashAlgorithm;

/// The top-level configuration parsed from `stowage.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct StowageConfig {
    /// Cache location and encoding settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Settings for a single cache folder.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Directory holding artifacts and sidecars. Created on first use.
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Digest algorithm used to derive cache file names.
    #[serde(default)]
    pub hash: HashAlgorithm,
    /// Serialization format for stored artifacts.
    #[serde(default)]
    pub codec: CodecKind,
    /// Whether a header sidecar is written next to every artifact.
    #[serde(default = "default_true")]
    pub store_header: bool,
    /// Artifact file extension. Defaults to the codec's own extension.
    #[serde(default)]
    pub artifact_ext: Option<String>,
    /// Sidecar file extension.
    #[serde(default = "default_metadata_ext")]
    pub metadata_ext: String,
    /// Naming and invalidation preset used for file sources.
    #[serde(default)]
    pub mode: CacheMode,
}

impl CacheConfig {
    /// Returns the artifact extension, falling back to the codec default.
    pub fn artifact_ext(&self) -> &str {
        self.artifact_ext
            .as_deref()
            .unwrap_or_else(|| self.codec.default_extension())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            hash: HashAlgorithm::default(),
            codec: CodecKind::default(),
            store_header: true,
            artifact_ext: None,
            metadata_ext: default_metadata_ext(),
            mode: CacheMode::default(),
        }
    }
}

fn default_folder() -> String {
    ".stowage".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metadata_ext() -> String {
    "json".to_string()
}

/// Serialization format for stored artifacts.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// Compact binary encoding via `bincode` (default).
    #[default]
    Bincode,
    /// Human-readable JSON encoding.
    Json,
}

impl CodecKind {
    /// Returns the artifact extension used when none is configured.
    pub fn default_extension(self) -> &'static str {
        match self {
            Self::Bincode => "bin",
            Self::Json => "cache.json",
        }
    }
}

/// Naming and invalidation preset for file sources.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Name by file content, valid while the artifact exists (default).
    #[default]
    Hash,
    /// Name by resolved path, valid while the artifact is newer than the source.
    Mtime,
}
