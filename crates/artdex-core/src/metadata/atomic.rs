//! Atomic file operations for catalog JSON documents.
//!
//! Writes go through a sibling temp file that is synced and then renamed over
//! the target, so a crash mid-save leaves either the old or the new document
//! on disk, never a truncated one.

use crate::{ArtdexError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, warn};

/// Read and parse a JSON file.
///
/// Returns `None` if the file doesn't exist, or an error if parsing fails.
pub fn atomic_read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let mut file = File::open(path).map_err(|e| ArtdexError::Io {
        message: format!("Failed to open {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| ArtdexError::Io {
            message: format!("Failed to read {}", path.display()),
            path: Some(path.to_path_buf()),
            source: Some(e),
        })?;

    let data: T = serde_json::from_str(&contents).map_err(|e| ArtdexError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Write data to a JSON file atomically.
///
/// 1. Serializes with pretty printing
/// 2. Writes and syncs a temp file next to the target
/// 3. Optionally copies the previous document to `<name>.bak`
/// 4. Renames the temp file over the target
///
/// The parent directory must already exist; a catalog directory that has
/// disappeared is a hard failure for the caller.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T, keep_backup: bool) -> Result<()> {
    let temp_path = temp_path_for(path);

    let serialized = serde_json::to_string_pretty(data).map_err(|e| ArtdexError::Json {
        message: format!("Failed to serialize data: {}", e),
        source: Some(e),
    })?;

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| ArtdexError::Io {
                message: format!("Failed to create temp file {}", temp_path.display()),
                path: Some(temp_path.clone()),
                source: Some(e),
            })?;

        file.write_all(serialized.as_bytes())
            .map_err(|e| ArtdexError::Io {
                message: format!("Failed to write temp file {}", temp_path.display()),
                path: Some(temp_path.clone()),
                source: Some(e),
            })?;

        file.sync_all().map_err(|e| ArtdexError::Io {
            message: format!("Failed to sync temp file {}", temp_path.display()),
            path: Some(temp_path.clone()),
            source: Some(e),
        })?;
    }

    if keep_backup && path.exists() {
        let backup_path = backup_path_for(path);
        if let Err(e) = fs::copy(path, &backup_path) {
            warn!("Failed to create backup {}: {}", backup_path.display(), e);
        } else {
            debug!("Created backup: {}", backup_path.display());
        }
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(ArtdexError::Io {
            message: format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            ),
            path: Some(path.to_path_buf()),
            source: Some(e),
        });
    }

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

/// Backup location for a document: `artlist.json` -> `artlist.json.bak`.
pub fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.tmp", process::id()));
    path.with_file_name(name)
}
