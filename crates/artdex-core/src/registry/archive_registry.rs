//! Archive registry stored as `archives.json` in the catalog directory.
//!
//! The registry is configuration only. Whether a listed archive can be read
//! is decided at scan time, so paths are accepted here without validation.

use crate::config::PathsConfig;
use crate::metadata::{atomic_read_json, atomic_write_json};
use crate::scanner::SourceDescriptor;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk shape of the registry document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    archives: Vec<Option<String>>,
    #[serde(default = "default_include_folder")]
    include_folder: bool,
}

fn default_include_folder() -> bool {
    true
}

/// Ordered archive sources plus the folder inclusion flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRegistry {
    archives: Vec<PathBuf>,
    include_folder: bool,
}

impl Default for ArchiveRegistry {
    fn default() -> Self {
        Self {
            archives: Vec::new(),
            include_folder: true,
        }
    }
}

impl ArchiveRegistry {
    pub fn new(archives: Vec<PathBuf>, include_folder: bool) -> Self {
        Self {
            archives,
            include_folder,
        }
    }

    /// Path of the registry document inside `directory`.
    pub fn path_in(directory: &Path) -> PathBuf {
        directory.join(PathsConfig::REGISTRY_FILENAME)
    }

    /// Load the registry for `directory`.
    ///
    /// A missing or unreadable document yields the default registry (no
    /// archives, folder included). Empty and null entries are dropped.
    pub fn load(directory: &Path) -> Self {
        let path = Self::path_in(directory);
        let document: Option<RegistryDocument> = match atomic_read_json(&path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Ignoring unreadable archive registry {}: {}", path.display(), e);
                None
            }
        };

        let Some(document) = document else {
            return Self::default();
        };

        let archives: Vec<PathBuf> = document
            .archives
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect();
        debug!(
            "Loaded {} archive sources (include_folder={})",
            archives.len(),
            document.include_folder
        );

        Self {
            archives,
            include_folder: document.include_folder,
        }
    }

    /// Write the registry to `<directory>/archives.json`.
    pub fn save(&self, directory: &Path) -> Result<()> {
        let document = RegistryDocument {
            archives: self
                .archives
                .iter()
                .map(|p| Some(p.to_string_lossy().into_owned()))
                .collect(),
            include_folder: self.include_folder,
        };
        atomic_write_json(&Self::path_in(directory), &document, false)
    }

    pub fn archives(&self) -> &[PathBuf] {
        &self.archives
    }

    pub fn include_folder(&self) -> bool {
        self.include_folder
    }

    /// Append an archive. The same path may be listed more than once; the
    /// repeated members are then dropped as duplicates during reconciliation.
    pub fn add(&mut self, path: impl Into<PathBuf>) {
        self.archives.push(path.into());
    }

    pub fn remove(&mut self, index: usize) -> Option<PathBuf> {
        (index < self.archives.len()).then(|| self.archives.remove(index))
    }

    pub fn clear(&mut self) {
        self.archives.clear();
    }

    pub fn set_include_folder(&mut self, include: bool) {
        self.include_folder = include;
    }

    /// Sources to scan, in order: the folder first (when included), then
    /// each archive in registry order.
    pub fn sources(&self, folder: &Path) -> Vec<SourceDescriptor> {
        let folder = self
            .include_folder
            .then(|| SourceDescriptor::Folder(folder.to_path_buf()));
        folder
            .into_iter()
            .chain(self.archives.iter().map(SourceDescriptor::for_archive))
            .collect()
    }
}
