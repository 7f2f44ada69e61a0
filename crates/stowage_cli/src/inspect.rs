//! `stowage inspect`: dump the header sidecar stored for a digest.

use serde_json::{Map, Value};

use crate::context;
use crate::{GlobalArgs, ReportFormat};

/// Renders sidecar fields in the requested format.
fn render(fields: &[(String, String)], format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(fields
            .iter()
            .map(|(k, v)| format!("{k} = {v}\n"))
            .collect()),
        ReportFormat::Json => {
            let map: Map<String, Value> = fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            let mut out = serde_json::to_string_pretty(&Value::Object(map))?;
            out.push('\n');
            Ok(out)
        }
    }
}

/// Runs the `stowage inspect` command.
pub fn run(
    digest: &str,
    format: ReportFormat,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let cache = context::open(global, None, None)?;
    let Some(fields) = cache.read_sidecar(digest)? else {
        let what = if cache.artifact_path(digest).is_file() {
            "no sidecar stored"
        } else {
            "no cache entry"
        };
        return Err(format!("{what} for digest '{digest}'").into());
    };
    print!("{}", render(&fields, format)?);
    Ok(0)
}
