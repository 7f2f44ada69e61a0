//! `stowage key`: print the digest sources map to.

use crate::context;
use crate::{GlobalArgs, KeyArgs};

/// Computes `(label, digest)` for every source named by `args`.
pub fn digests(
    args: &KeyArgs,
    global: &GlobalArgs,
) -> Result<Vec<(String, String)>, Box<dyn std::error::Error>> {
    let cache = context::open(global, args.mode.map(Into::into), args.hash)?;
    let mut out = Vec::new();
    for (label, source) in context::sources(&cache, &args.paths) {
        let header = cache.header_for(&source, &args.reader)?;
        out.push((label, cache.stem_for(&header)?));
    }
    Ok(out)
}

/// Runs the `stowage key` command. Prints `<digest>  <source>` per line.
pub fn run(args: &KeyArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    for (label, digest) in digests(args, global)? {
        println!("{digest}  {label}");
    }
    Ok(0)
}
