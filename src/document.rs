//! JSON document reading and writing.

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Read and parse a JSON document.
pub fn read<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Serialize a document and overwrite `path` atomically.
///
/// Uses tempfile + rename so a crash mid-write cannot leave a truncated
/// config behind. Formatting stays human-diffable: stable key order,
/// 2-space indentation and a trailing newline.
pub fn write<P: AsRef<Path>>(path: P, doc: &Value) -> Result<()> {
    let path = path.as_ref();
    let mut content = serde_json::to_string_pretty(doc).context("Failed to serialize document")?;
    content.push('\n');

    let parent_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = NamedTempFile::new_in(parent_dir).with_context(|| {
        format!("Failed to create temporary file in {}", parent_dir.display())
    })?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.as_file().sync_all()?;

    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist {}", path.display()))?;

    Ok(())
}
