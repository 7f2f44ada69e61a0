//! Human-readable header sidecars.
//!
//! Next to each artifact the store can write a small JSON object holding
//! every header field as a string. It exists for people inspecting the
//! cache folder; the store never reads it back to decide anything.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::CacheError;
use crate::fs::FileSystem;
use crate::header::Header;

/// Writes the sidecar for `header` at `path`.
pub fn write_sidecar(fs: &dyn FileSystem, path: &Path, header: &Header) -> Result<(), CacheError> {
    let mut record = Map::new();
    for (name, value) in header.describe() {
        record.entry(name).or_insert(Value::String(value));
    }
    let json =
        serde_json::to_vec_pretty(&Value::Object(record)).map_err(CacheError::serialization)?;
    fs.write(path, &json)
}

/// Reads a sidecar back as `(field, value)` pairs sorted by field name.
pub fn read_sidecar(fs: &dyn FileSystem, path: &Path) -> Result<Vec<(String, String)>, CacheError> {
    let bytes = fs.read(path)?;
    let record: Map<String, Value> =
        serde_json::from_slice(&bytes).map_err(CacheError::serialization)?;
    let mut fields: Vec<(String, String)> = record
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect();
    fields.sort();
    Ok(fields)
}
