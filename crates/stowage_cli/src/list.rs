//! `stowage list`: enumerate cached digests.

use crate::context;
use crate::GlobalArgs;

/// Runs the `stowage list` command. Prints one digest per line, followed by
/// a count on stderr unless `--quiet` is set.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let cache = context::open(global, None, None)?;
    let entries = cache.entries()?;
    for digest in &entries {
        println!("{digest}");
    }
    if !global.quiet {
        eprintln!(
            "  {} entr{} in {}",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            cache.folder().display()
        );
    }
    Ok(0)
}
