//! All-or-nothing file writes.
//!
//! Content is written to a temporary file in the destination directory, synced,
//! then renamed over the destination. Readers see either the previous file or
//! the complete new one.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tempfile::Builder;

/// Suffix of the temporary file [`atomic_write`] creates next to the destination.
pub const TEMP_SUFFIX: &str = ".awd-tmp";

/// Whether `path` is a temporary file left by an in-flight [`atomic_write`].
pub fn is_temp_file(path: &Path) -> bool {
    path.file_name().and_then(|name| name.to_str()).is_some_and(|name| name.ends_with(TEMP_SUFFIX))
}

/// Atomically write a string to `path`.
///
/// # Errors
///
/// See [`atomic_write`].
pub fn safe_write(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Atomically write bytes to `path`, creating parent directories as needed.
///
/// The temporary file lives next to the destination so the final rename never
/// crosses file systems.
///
/// # Errors
///
/// Fails if the parent directory cannot be created, or the temporary file
/// cannot be written, synced or renamed. On failure the destination is left
/// untouched and the temporary file is removed.
///
/// # Examples
///
/// ```rust,no_run
/// use awd_cli::utils::fs::atomic_write;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// atomic_write(Path::new("AGENTS.md"), b"# AGENTS.md\n")?;
/// # Ok(())
/// # }
/// ```
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let prefix = match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => format!(".{name}."),
        None => ".".to_string(),
    };

    let mut temp = Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;

    temp.write_all(content)
        .with_context(|| format!("Failed to write to temp file: {}", temp.path().display()))?;

    temp.as_file().sync_all().with_context(|| "Failed to sync file to disk")?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}
