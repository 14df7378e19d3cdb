//! Source scanning.
//!
//! A catalog draws items from the catalog directory itself and from any
//! number of zip or tar archives. Each source is scanned independently into a
//! list of [`ScanEntry`] values; a source that cannot be read at all yields
//! [`ScanOutcome::Unavailable`] instead of failing the pass.

mod folder;
mod tar_archive;
mod zip_archive;

use crate::config::ArchiveConfig;
use crate::models::{ScanEntry, SourceType};
use crate::{ArtdexError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, warn};

pub use folder::scan_folder;
pub use tar_archive::{read_tar_entry, scan_tar};
pub use zip_archive::{read_zip_entry, scan_zip};

/// One configured source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// Media files directly inside a directory (non-recursive).
    Folder(PathBuf),
    Zip(PathBuf),
    Tar(PathBuf),
    /// An archive path whose suffix matches no known format.
    Unrecognized(PathBuf),
}

impl SourceDescriptor {
    /// Classify an archive path by suffix (case-insensitive).
    pub fn for_archive(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if ArchiveConfig::ZIP_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            SourceDescriptor::Zip(path)
        } else if ArchiveConfig::TAR_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            SourceDescriptor::Tar(path)
        } else {
            SourceDescriptor::Unrecognized(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SourceDescriptor::Folder(p)
            | SourceDescriptor::Zip(p)
            | SourceDescriptor::Tar(p)
            | SourceDescriptor::Unrecognized(p) => p,
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            SourceDescriptor::Folder(_) => "folder",
            SourceDescriptor::Zip(_) => "zip",
            SourceDescriptor::Tar(_) => "tar",
            SourceDescriptor::Unrecognized(_) => "unknown",
        };
        write!(f, "{} {}", kind, self.path().display())
    }
}

/// Why a source contributed nothing to a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnavailable {
    pub path: PathBuf,
    pub reason: String,
}

impl From<SourceUnavailable> for ArtdexError {
    fn from(u: SourceUnavailable) -> Self {
        ArtdexError::SourceUnavailable {
            path: u.path,
            reason: u.reason,
        }
    }
}

/// Result of scanning one source.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Scanned(Vec<ScanEntry>),
    Unavailable(SourceUnavailable),
}

impl ScanOutcome {
    /// Entries found; empty for an unavailable source.
    pub fn entries(&self) -> &[ScanEntry] {
        match self {
            ScanOutcome::Scanned(entries) => entries,
            ScanOutcome::Unavailable(_) => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ScanOutcome::Scanned(_))
    }
}

/// A source together with its scan outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceScan {
    pub source: SourceDescriptor,
    pub outcome: ScanOutcome,
}

impl SourceScan {
    fn unavailable(source: SourceDescriptor, reason: impl Into<String>) -> Self {
        let path = source.path().to_path_buf();
        Self {
            source,
            outcome: ScanOutcome::Unavailable(SourceUnavailable {
                path,
                reason: reason.into(),
            }),
        }
    }
}

/// Scan one source. Never fails; unreadable sources are reported in the
/// outcome.
pub fn scan(source: &SourceDescriptor) -> SourceScan {
    let result = match source {
        SourceDescriptor::Folder(dir) => scan_folder(dir),
        SourceDescriptor::Zip(path) => scan_zip(path),
        SourceDescriptor::Tar(path) => scan_tar(path),
        SourceDescriptor::Unrecognized(_) => {
            return SourceScan::unavailable(source.clone(), "unrecognized archive type");
        }
    };

    match result {
        Ok(entries) => {
            debug!("Scanned {}: {} entries", source, entries.len());
            SourceScan {
                source: source.clone(),
                outcome: ScanOutcome::Scanned(entries),
            }
        }
        Err(e) => {
            warn!("Source unavailable, skipping {}: {}", source, e);
            SourceScan::unavailable(source.clone(), e.to_string())
        }
    }
}

/// Scan every source, returning outcomes in input order.
///
/// With `parallel`, each source is read on its own scoped thread; sources are
/// read-only and independent, and the result order is the same either way.
pub fn scan_all(sources: &[SourceDescriptor], parallel: bool) -> Vec<SourceScan> {
    if !parallel || sources.len() < 2 {
        return sources.iter().map(scan).collect();
    }

    thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|source| scope.spawn(move || scan(source)))
            .collect();

        handles
            .into_iter()
            .zip(sources)
            .map(|(handle, source)| {
                handle.join().unwrap_or_else(|_| {
                    SourceScan::unavailable(source.clone(), "scanner thread panicked")
                })
            })
            .collect()
    })
}

/// Read the bytes of one archive member.
pub fn read_archive_entry(
    source_type: SourceType,
    source_path: &Path,
    inner_path: &str,
) -> Result<Vec<u8>> {
    match source_type {
        SourceType::Zip => read_zip_entry(source_path, inner_path),
        SourceType::Tar => read_tar_entry(source_path, inner_path),
        SourceType::Fs => Err(ArtdexError::Other(format!(
            "{} is not an archive member",
            inner_path
        ))),
    }
}

/// Canonical absolute path string recorded as `source_path`.
fn canonical_source_path(path: &Path) -> Result<String> {
    let canonical = path
        .canonicalize()
        .map_err(|e| ArtdexError::io_with_path(e, path))?;
    Ok(canonical.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_archive_classification() {
        assert!(matches!(
            SourceDescriptor::for_archive("/a/Pack.ZIP"),
            SourceDescriptor::Zip(_)
        ));
        for name in ["a.tar", "a.tgz", "a.tar.gz", "a.tar.bz2", "a.txz", "a.tar.zst"] {
            assert!(
                matches!(SourceDescriptor::for_archive(name), SourceDescriptor::Tar(_)),
                "{name}"
            );
        }
        assert!(matches!(
            SourceDescriptor::for_archive("a.rar"),
            SourceDescriptor::Unrecognized(_)
        ));
    }

    #[test]
    fn test_unrecognized_source_is_unavailable() {
        let scan = scan(&SourceDescriptor::for_archive("/nowhere/art.rar"));
        assert!(!scan.outcome.is_available());
        assert!(scan.outcome.entries().is_empty());
    }

    #[test]
    fn test_missing_archive_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone.zip");
        let scan = scan(&SourceDescriptor::for_archive(&missing));
        match scan.outcome {
            ScanOutcome::Unavailable(u) => assert_eq!(u.path, missing),
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_scan_all_preserves_source_order() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.png"), b"png").unwrap();
        let sources = vec![
            SourceDescriptor::Folder(temp_dir.path().to_path_buf()),
            SourceDescriptor::for_archive(temp_dir.path().join("missing.zip")),
            SourceDescriptor::for_archive(temp_dir.path().join("missing.tar")),
        ];

        let sequential = scan_all(&sources, false);
        let parallel = scan_all(&sources, true);
        assert_eq!(sequential, parallel);
        assert_eq!(parallel[0].source, sources[0]);
        assert_eq!(parallel[0].outcome.entries().len(), 1);
        assert_eq!(parallel[2].source, sources[2]);
    }
}
