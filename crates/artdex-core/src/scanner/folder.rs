//! Catalog directory scanning.

use crate::config::MediaConfig;
use crate::models::ScanEntry;
use crate::{ArtdexError, Result};
use std::fs::{self, Metadata};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Media files directly inside `dir`, newest first.
///
/// Subdirectories are not descended into. Ties on date are broken by file
/// name so repeated scans list files in the same order.
pub fn scan_folder(dir: &Path) -> Result<Vec<ScanEntry>> {
    let read_dir = fs::read_dir(dir).map_err(|e| ArtdexError::Io {
        message: format!("Failed to read directory {}", dir.display()),
        path: Some(dir.to_path_buf()),
        source: Some(e),
    })?;

    let mut entries = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = match dir_entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        let Some(name) = dir_entry.file_name().to_str().map(str::to_string) else {
            warn!("Skipping non UTF-8 file name in {}", dir.display());
            continue;
        };
        if !MediaConfig::is_media(&name) {
            continue;
        }

        // Follows symlinks, so linked media counts as a file.
        let metadata = match fs::metadata(dir_entry.path()) {
            Ok(m) => m,
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        entries.push(ScanEntry::fs(name, creation_time(&metadata)));
    }

    entries.sort_by(|a, b| b.date.total_cmp(&a.date).then_with(|| a.fname.cmp(&b.fname)));
    debug!("Found {} media files in {}", entries.len(), dir.display());
    Ok(entries)
}

/// Birth time where the platform records it, otherwise change time.
fn creation_time(metadata: &Metadata) -> f64 {
    match metadata.created() {
        Ok(created) => epoch_seconds(created),
        Err(_) => change_time(metadata),
    }
}

#[cfg(unix)]
fn change_time(metadata: &Metadata) -> f64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ctime() as f64 + metadata.ctime_nsec() as f64 / 1e9
}

#[cfg(not(unix))]
fn change_time(metadata: &Metadata) -> f64 {
    metadata.modified().map(epoch_seconds).unwrap_or(0.0)
}

fn epoch_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}
