//! `stowage status`: report cache hits and misses without loading artifacts.

use crate::context;
use crate::{GlobalArgs, KeyArgs};

/// Cache state of one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The source as given on the command line.
    pub label: String,
    /// Digest the source maps to.
    pub digest: String,
    /// Whether a reusable artifact exists.
    pub hit: bool,
}

/// Checks every source named by `args`.
pub fn check(
    args: &KeyArgs,
    global: &GlobalArgs,
) -> Result<Vec<Entry>, Box<dyn std::error::Error>> {
    let cache = context::open(global, args.mode.map(Into::into), args.hash)?;
    let mut out = Vec::new();
    for (label, source) in context::sources(&cache, &args.paths) {
        let header = cache.header_for(&source, &args.reader)?;
        out.push(Entry {
            label,
            digest: cache.stem_for(&header)?,
            hit: cache.is_cached(&header)?,
        });
    }
    Ok(out)
}

/// Runs the `stowage status` command.
///
/// Prints `hit` or `miss` per source. Exits with 0 when everything is
/// cached and 2 otherwise.
pub fn run(args: &KeyArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let entries = check(args, global)?;
    for e in &entries {
        let state = if e.hit { "hit" } else { "miss" };
        println!("{state:<4}  {}  {}", e.digest, e.label);
    }
    Ok(if entries.iter().all(|e| e.hit) { 0 } else { 2 })
}
