//! Temp-file handling for uploaded request bodies.
//!
//! Every upload is written to a named temp file, handed to exactly one
//! downstream call, and deleted when the handle drops. Dropping is how the
//! "deleted exactly once regardless of success/failure path" guarantee is
//! enforced, so handlers never unlink paths by hand.

use std::path::Path;

use anyhow::Context;
use tempfile::NamedTempFile;

/// Derive a temp-file suffix from the client-supplied filename, so downstream
/// tools that look at extensions see the right one.
pub fn suffix_for(filename: &str, default: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_else(|| default.to_string())
}

/// Persist uploaded bytes to a named temp file.
pub async fn persist_upload(data: &[u8], suffix: &str) -> anyhow::Result<NamedTempFile> {
    let tmp = tempfile::Builder::new()
        .prefix("docnow-")
        .suffix(suffix)
        .tempfile()
        .context("create temp file for upload")?;

    tokio::fs::write(tmp.path(), data).await.context("write upload to temp file")?;

    Ok(tmp)
}
