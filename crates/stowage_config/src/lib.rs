//! Parsing and validation of `stowage.toml` cache configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`StowageConfig`] describing where the cache lives and how keys and
//! artifacts are encoded.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use types::*;
