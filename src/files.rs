//! Async file helpers shared by registries and environments

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// File name of per-record config sidecars
pub const CONFIG_FILE: &str = ".config.json";

/// Whether a path's final component is a dotfile
#[must_use]
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Recursively collect `*.json` files under `dir`, skipping dotfiles and dot-directories
///
/// Returns an empty list if `dir` does not exist. Results are sorted by path.
///
/// # Errors
///
/// Returns an error if an existing directory cannot be read
pub async fn collect_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !tokio::fs::try_exists(dir).await? {
        return Ok(files);
    }

    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_hidden(&path) {
                continue;
            }
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// List immediate subdirectories of `dir`, sorted, skipping dot-directories
///
/// # Errors
///
/// Returns an error if an existing directory cannot be read
pub async fn list_subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    if !tokio::fs::try_exists(dir).await? {
        return Ok(dirs);
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_hidden(&path) && entry.file_type().await?.is_dir() {
            dirs.push(path);
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// List `*.json` files directly inside `dir` (not recursive), sorted, skipping dotfiles
///
/// # Errors
///
/// Returns an error if an existing directory cannot be read
pub async fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !tokio::fs::try_exists(dir).await? {
        return Ok(files);
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_hidden(&path) || !entry.file_type().await?.is_file() {
            continue;
        }
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Read and deserialize a JSON file
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&content)?)
}

/// Serialize a value as pretty JSON and write it, creating parent directories
///
/// # Errors
///
/// Returns an error if serialization or the write fails
pub async fn write_json<T: Serialize + Sync>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_vec_pretty(value)?;
    write_bytes(path, &content).await
}

/// Write raw bytes, creating parent directories
///
/// # Errors
///
/// Returns an error if a directory cannot be created or the write fails
pub async fn write_bytes(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}

/// Move a file, falling back to copy-then-remove across filesystems
///
/// The source is only removed after the copy succeeded.
///
/// # Errors
///
/// Returns `Error::FileOperation` naming both paths if the move cannot be completed
pub async fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| file_error("move", from, to, source))?;
    }

    if let Err(e) = tokio::fs::rename(from, to).await {
        tracing::debug!(
            from = %from.display(),
            to = %to.display(),
            error = %e,
            "rename failed, falling back to copy"
        );
        tokio::fs::copy(from, to)
            .await
            .map_err(|source| file_error("copy", from, to, source))?;
        tokio::fs::remove_file(from)
            .await
            .map_err(|source| file_error("remove", from, to, source))?;
    }

    Ok(())
}

fn file_error(operation: &'static str, from: &Path, to: &Path, source: std::io::Error) -> Error {
    Error::FileOperation {
        operation,
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    }
}
