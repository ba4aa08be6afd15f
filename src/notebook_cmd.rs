//! Notebook execution-timeout normalizer.
//!
//! Rewrites every `*.ipynb` directly under a directory so that
//! `metadata.execution.timeout` carries the configured value. The rewrite
//! uses one-space indentation, `\n` line endings, preserved key order, and
//! non-ASCII characters verbatim, so a second pass produces byte-identical
//! output.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use tracing::info;

use crate::{BenchError, BenchResult};

/// Default timeout written into notebooks, in seconds.
pub const DEFAULT_TIMEOUT: u64 = 1000;

/// Patch a notebook JSON document in memory.
///
/// `metadata` must already exist; an `execution` object is created under it
/// when absent, and its `timeout` is forced to `timeout`.
///
/// # Errors
/// Returns an error if the bytes are not valid JSON, `metadata` is missing
/// or not an object, or an existing `execution` value is not an object.
pub fn patch_notebook_bytes(bytes: &[u8], timeout: u64) -> BenchResult<Vec<u8>> {
    let mut notebook: Value = serde_json::from_slice(bytes)
        .map_err(|e| BenchError::Message(format!("invalid notebook JSON: {e}")))?;

    let metadata = notebook
        .get_mut("metadata")
        .and_then(|m| m.as_object_mut())
        .ok_or_else(|| BenchError::Message("notebook has no metadata object".to_string()))?;

    let execution = metadata
        .entry("execution")
        .or_insert_with(|| Value::Object(serde_json::Map::new()));
    let execution = execution
        .as_object_mut()
        .ok_or_else(|| BenchError::Message("metadata.execution is not an object".to_string()))?;
    execution.insert("timeout".to_string(), Value::from(timeout));

    // One-space indentation; serde_json emits \n line endings and leaves
    // non-ASCII characters unescaped.
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b" ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    notebook
        .serialize(&mut ser)
        .map_err(|e| BenchError::Message(format!("failed to serialize notebook: {e}")))?;
    Ok(out)
}

/// Patch a single notebook file in place.
pub fn patch_file(path: &Path, timeout: u64) -> BenchResult<()> {
    let bytes =
        std::fs::read(path).map_err(|e| BenchError::Message(format!("{}: {e}", path.display())))?;
    let patched = patch_notebook_bytes(&bytes, timeout)
        .map_err(|e| BenchError::Message(format!("{}: {e}", path.display())))?;
    std::fs::write(path, patched)
        .map_err(|e| BenchError::Message(format!("{}: {e}", path.display())))
}

/// Patch every `*.ipynb` directly under `dir` (non-recursive).
///
/// Returns the number of notebooks patched.
pub fn patch_directory(dir: &Path, timeout: u64) -> BenchResult<usize> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| BenchError::Message(format!("{}: {e}", dir.display())))?;

    let mut notebooks: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("ipynb"))
        .collect();
    notebooks.sort();

    for path in &notebooks {
        info!(notebook = %path.display(), timeout, "patching");
        patch_file(path, timeout)?;
    }
    Ok(notebooks.len())
}

/// CLI entry point.
pub fn run(dir: PathBuf, timeout: u64) -> BenchResult<()> {
    let patched = patch_directory(&dir, timeout)?;
    println!("patched {} notebook(s) in {}", patched, dir.display());
    Ok(())
}
