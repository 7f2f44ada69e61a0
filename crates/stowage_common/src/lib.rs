//! Shared foundational types used across the Stowage workspace.
//!
//! This crate provides the digest algorithms used to turn a header
//! fingerprint into a cache file name.

#![warn(missing_docs)]

pub mod hash;

pub use hash::{DigestAccumulator, DigestError, HashAlgorithm};
