//! Opening the cache the way every command needs it.
//!
//! Configuration comes from `--config`, else `stowage.toml` in the project
//! directory, else built-in defaults. A relative cache folder resolves
//! against the directory holding the configuration file.

use std::path::{Path, PathBuf};

use stowage_cache::{DiskCache, Source};
use stowage_common::HashAlgorithm;
use stowage_config::{CacheConfig, CacheMode, StowageConfig, CONFIG_FILE};

use crate::GlobalArgs;

/// Loads the configuration and the directory it is relative to.
pub fn load(global: &GlobalArgs) -> Result<(CacheConfig, PathBuf), Box<dyn std::error::Error>> {
    let (config, base_dir) = match &global.config {
        Some(path) => {
            let config = stowage_config::load_config_file(path)
                .map_err(|e| format!("{}: {e}", path.display()))?;
            let base = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| global.project_dir.clone(), Path::to_path_buf);
            (config, base)
        }
        None if global.project_dir.join(CONFIG_FILE).is_file() => {
            let config = stowage_config::load_config(&global.project_dir)?;
            (config, global.project_dir.clone())
        }
        None => (StowageConfig::default(), global.project_dir.clone()),
    };
    let mut cache = config.cache;
    if let Some(dir) = &global.cache_dir {
        cache.folder = dir.to_string_lossy().into_owned();
    }
    tracing::debug!(
        target: "stowage.cli",
        folder = %cache.folder,
        mode = ?cache.mode,
        "loaded cache configuration"
    );
    Ok((cache, base_dir))
}

/// Opens the cache, applying per-command overrides.
pub fn open(
    global: &GlobalArgs,
    mode: Option<CacheMode>,
    hash: Option<HashAlgorithm>,
) -> Result<DiskCache, Box<dyn std::error::Error>> {
    let (mut config, base_dir) = load(global)?;
    if let Some(mode) = mode {
        config.mode = mode;
    }
    if let Some(hash) = hash {
        config.hash = hash;
    }
    Ok(DiskCache::from_config(&base_dir, &config)?)
}

/// One source per lookup: a multi-path source if the cache has a header type
/// for it, otherwise each path on its own.
pub fn sources(cache: &DiskCache, paths: &[PathBuf]) -> Vec<(String, Source)> {
    if paths.len() > 1 {
        let set = Source::paths(paths);
        if cache.registry().resolve(&set).is_ok() {
            return vec![(set.to_string(), set)];
        }
    }
    paths
        .iter()
        .map(|p| (p.display().to_string(), Source::path(p)))
        .collect()
}
