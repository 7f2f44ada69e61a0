//! Artifact serialization.
//!
//! The store never looks inside an artifact; it hands values to a [`Codec`]
//! and writes whatever bytes come back. Decoding failures are reported, not
//! treated as misses: a corrupted cache file is a bug signal.

use serde::de::DeserializeOwned;
use serde::Serialize;
use stowage_config::CodecKind;

use crate::error::CacheError;

/// Turns artifacts into bytes and back.
pub trait Codec {
    /// Short name of the codec, used in logs.
    fn name(&self) -> &'static str;

    /// Serializes `value`.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CacheError>;

    /// Deserializes a value previously produced by [`encode`](Self::encode).
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CacheError>;
}

/// The built-in codecs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArtifactCodec {
    /// `bincode` with its standard configuration.
    #[default]
    Bincode,
    /// Pretty-printed JSON.
    Json,
}

impl Codec for ArtifactCodec {
    fn name(&self) -> &'static str {
        match self {
            Self::Bincode => "bincode",
            Self::Json => "json",
        }
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CacheError> {
        match self {
            Self::Bincode => bincode::serde::encode_to_vec(value, bincode::config::standard())
                .map_err(CacheError::serialization),
            Self::Json => serde_json::to_vec_pretty(value).map_err(CacheError::serialization),
        }
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CacheError> {
        match self {
            Self::Bincode => {
                let (value, read) =
                    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                        .map_err(CacheError::serialization)?;
                if read != bytes.len() {
                    return Err(CacheError::Serialization {
                        reason: format!(
                            "{} trailing bytes after bincode payload",
                            bytes.len() - read
                        ),
                    });
                }
                Ok(value)
            }
            Self::Json => serde_json::from_slice(bytes).map_err(CacheError::serialization),
        }
    }
}

impl From<CodecKind> for ArtifactCodec {
    fn from(kind: CodecKind) -> Self {
        match kind {
            CodecKind::Bincode => Self::Bincode,
            CodecKind::Json => Self::Json,
        }
    }
}
