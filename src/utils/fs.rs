//! File system helpers for cache snapshots and configuration files.
//!
//! Writes go through [`atomic_write`], so a reader never observes a partially
//! written snapshot: the file either holds the old content or the new one.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// Returns an error when the path exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).with_context(|| {
            format!(
                "Failed to create directory: {}\n\nCheck directory permissions and path validity",
                path.display()
            )
        })?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Write `content` to `path` through a temporary sibling file and a rename.
///
/// Parent directories are created when missing. The temporary file is synced
/// to disk before the rename and removed again if any step fails. Its name
/// carries the process id and a per-process counter, so concurrent writers
/// never share one.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let temp_path = temp_path_for(path);
    let result = write_and_rename(&temp_path, path, content);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
    let sequence = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{file_name}.{}.{sequence}.tmp", std::process::id()))
}

fn write_and_rename(temp_path: &Path, path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    {
        let mut file = fs::File::create(temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    fs::rename(temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))
}
