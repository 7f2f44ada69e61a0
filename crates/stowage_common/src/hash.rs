//! Digest algorithms for deriving cache file names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// The hash algorithm used to turn a fingerprint into a cache key.
///
/// The default is SHA-1, a 160-bit digest. Changing the algorithm changes
/// every cache key, so existing entries become unreachable rather than stale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-1 (160 bits, 40 hex chars).
    #[default]
    #[serde(rename = "sha1")]
    Sha1,
    /// SHA-256 (256 bits, 64 hex chars).
    #[serde(rename = "sha256")]
    Sha256,
    /// XXH3-128 (128 bits, 32 hex chars). Fast, but not cryptographic.
    #[serde(rename = "xxh3-128")]
    Xxh3,
}

impl HashAlgorithm {
    /// Returns the canonical lowercase name of the algorithm.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Xxh3 => "xxh3-128",
        }
    }

    /// Returns the length of the hex digest produced by this algorithm.
    pub fn hex_len(self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Sha256 => 64,
            Self::Xxh3 => 32,
        }
    }

    /// Starts a fresh streaming accumulator for this algorithm.
    pub fn accumulator(self) -> DigestAccumulator {
        DigestAccumulator::new(self)
    }

    /// Hashes a single byte slice and returns the lowercase hex digest.
    pub fn hex_digest(self, data: &[u8]) -> String {
        let mut acc = self.accumulator();
        acc.update(data);
        acc.finish()
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown hash algorithm name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hash algorithm '{0}' (expected sha1, sha256 or xxh3-128)")]
pub struct DigestError(pub String);

impl FromStr for HashAlgorithm {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "xxh3" | "xxh3-128" => Ok(Self::Xxh3),
            _ => Err(DigestError(s.to_string())),
        }
    }
}

/// A streaming digest accumulator.
///
/// Chunks fed through [`update`](Self::update) are hashed as one continuous
/// byte stream; [`finish`](Self::finish) yields the lowercase hex digest.
pub enum DigestAccumulator {
    /// SHA-1 state.
    Sha1(Sha1),
    /// SHA-256 state.
    Sha256(Sha256),
    /// XXH3-128 state (boxed, the streaming state is large).
    Xxh3(Box<xxhash_rust::xxh3::Xxh3>),
}

impl DigestAccumulator {
    /// Creates an empty accumulator for `algorithm`.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha1 => Self::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Xxh3 => Self::Xxh3(Box::new(xxhash_rust::xxh3::Xxh3::new())),
        }
    }

    /// Feeds another chunk into the accumulator.
    pub fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(chunk),
            Self::Sha256(h) => h.update(chunk),
            Self::Xxh3(h) => h.update(chunk),
        }
    }

    /// Consumes the accumulator and returns the lowercase hex digest.
    pub fn finish(self) -> String {
        match self {
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Xxh3(h) => hex::encode(h.digest128().to_le_bytes()),
        }
    }
}

impl fmt::Debug for DigestAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sha1(_) => "sha1",
            Self::Sha256(_) => "sha256",
            Self::Xxh3(_) => "xxh3-128",
        };
        write!(f, "DigestAccumulator({name})")
    }
}
