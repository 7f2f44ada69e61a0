//! Persistent, content-addressed artifact cache.
//!
//! Expensive results derived from some source (a file, a set of files, a
//! serializable value, a list of precomputed hashes) are stored on disk under
//! a name computed from a [`Header`]. The header's naming strategy decides
//! which bytes identify the source; its validity strategy decides whether a
//! stored artifact may be reused. [`DiskCache`] ties the two together with a
//! registry mapping source kinds to header constructors.
//!
//! ```no_run
//! use stowage_cache::{DiskCache, Producer, Source};
//!
//! # fn main() -> Result<(), stowage_cache::CacheError> {
//! let cache = DiskCache::by_hash(".stowage")?;
//! let (upper, digest) = cache.load_or_compute(
//!     &Source::path("input.txt"),
//!     Some(Producer::new("upper", |source, _| {
//!         let path = source.as_path().ok_or("not a path")?;
//!         Ok(std::fs::read_to_string(path)?.to_uppercase())
//!     })),
//!     false,
//! )?;
//! println!("{digest}: {upper:?}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod fs;
pub mod header;
pub mod naming;
pub mod registry;
pub mod sidecar;
pub mod source;
pub mod store;
pub mod validity;

pub use codec::{ArtifactCodec, Codec};
pub use error::{BoxError, CacheError};
pub use fs::{FileSystem, StdFileSystem};
pub use header::{platform_fields, Fingerprint, Header};
pub use naming::{
    ByFields, ByFileContent, ByHashIter, ByMultiPaths, ByObj, ByPath, ByReaderId, NamingStrategy,
};
pub use registry::{text_as_path, texts_as_paths, HeaderFactory, HeaderRegistry};
pub use source::{ObjectSource, Source, SourceKind, OBJECT_PROTOCOL};
pub use store::{DiskCache, Producer, StoreOptions};
pub use stowage_common::HashAlgorithm;
pub use validity::{ByExist, ByMultiPathsMTime, ByPathMTime, ValidityStrategy};
