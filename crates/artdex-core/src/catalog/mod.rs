//! Catalog facade tying sources, the snapshot, and the order model together.
//!
//! A [`Catalog`] owns one directory: its `artlist.json` snapshot, its
//! `archives.json` registry, and the in-memory [`ArtList`]. Editing happens
//! through [`Catalog::list_mut`]; nothing reaches disk until
//! [`Catalog::save`] (or an export, which always saves).

mod builder;

pub use builder::CatalogBuilder;

use crate::error::{ArtdexError, Result};
use crate::export::{ExportEngine, ExportReport, Transcoder};
use crate::metadata::MetadataStore;
use crate::models::Artwork;
use crate::order::ArtList;
use crate::reconcile::reconcile;
use crate::registry::ArchiveRegistry;
use crate::scanner::{scan_all, ScanOutcome, SourceUnavailable};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Counters for one reconciling scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RescanReport {
    /// Items in the catalog after the pass.
    pub total: usize,
    pub matched: usize,
    pub added: usize,
    pub dropped: usize,
    pub duplicates: usize,
    /// Sources that contributed nothing because they could not be read.
    pub unavailable: Vec<SourceUnavailable>,
}

/// One catalog directory opened for browsing and curation.
pub struct Catalog {
    directory: PathBuf,
    store: MetadataStore,
    registry: ArchiveRegistry,
    list: ArtList,
    parallel_scan: bool,
    dirty: bool,
}

impl Catalog {
    /// Open `directory` with default options and scan it.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self> {
        CatalogBuilder::new(directory).build()
    }

    pub fn builder(directory: impl Into<PathBuf>) -> CatalogBuilder {
        CatalogBuilder::new(directory)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn registry(&self) -> &ArchiveRegistry {
        &self.registry
    }

    pub fn list(&self) -> &ArtList {
        &self.list
    }

    /// Mutable access to the order model. Marks the catalog as having
    /// unsaved changes.
    pub fn list_mut(&mut self) -> &mut ArtList {
        self.dirty = true;
        &mut self.list
    }

    /// Whether the in-memory list may differ from the saved snapshot.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Index of the record addressed by identity or file name.
    pub fn find(&self, key: &str) -> Result<usize> {
        self.list
            .find(key)
            .ok_or_else(|| ArtdexError::NotFound(key.to_string()))
    }

    /// Rescan every source and reconcile against the saved snapshot.
    ///
    /// Unsaved edits are discarded; the saved snapshot is the reference.
    pub fn rescan(&mut self) -> RescanReport {
        let existing = self.store.load();
        self.scan_with(&existing)
    }

    /// Rescan ignoring the saved snapshot: every item comes back with
    /// default curation in scan order. The result is left unsaved.
    pub fn rescan_fresh(&mut self) -> RescanReport {
        let report = self.scan_with(&HashMap::new());
        self.dirty = true;
        report
    }

    fn scan_with(&mut self, existing: &HashMap<String, Artwork>) -> RescanReport {
        let sources = self.registry.sources(&self.directory);
        let scans = scan_all(&sources, self.parallel_scan);

        let unavailable: Vec<SourceUnavailable> = scans
            .iter()
            .filter_map(|scan| match &scan.outcome {
                ScanOutcome::Unavailable(u) => Some(u.clone()),
                ScanOutcome::Scanned(_) => None,
            })
            .collect();
        for u in &unavailable {
            warn!("{}", ArtdexError::from(u.clone()));
        }

        let entries = scans.iter().flat_map(|scan| scan.outcome.entries());
        let result = reconcile(existing, entries);

        self.list = result.artworks;
        self.dirty = false;

        let report = RescanReport {
            total: self.list.len(),
            matched: result.matched,
            added: result.added,
            dropped: result.dropped,
            duplicates: result.duplicates,
            unavailable,
        };
        info!(
            "Scanned {} sources in {}: {} items, {} unavailable",
            sources.len(),
            self.directory.display(),
            report.total,
            report.unavailable.len()
        );
        report
    }

    /// Write the current list to `artlist.json`.
    pub fn save(&mut self) -> Result<()> {
        self.store.save(self.list.as_slice())?;
        self.dirty = false;
        Ok(())
    }

    /// Register an archive source, persist the registry, and rescan.
    ///
    /// The path must exist; it is stored in absolute form.
    pub fn add_archive(&mut self, path: impl AsRef<Path>) -> Result<RescanReport> {
        let path = path.as_ref();
        let absolute = path.canonicalize().map_err(|e| ArtdexError::Io {
            message: format!("Archive not found: {}", path.display()),
            path: Some(path.to_path_buf()),
            source: Some(e),
        })?;
        self.registry.add(absolute);
        self.persist_registry()
    }

    /// Remove the archive at `index` in registry order, persist, and rescan.
    pub fn remove_archive(&mut self, index: usize) -> Result<(PathBuf, RescanReport)> {
        let len = self.registry.archives().len();
        let removed = self
            .registry
            .remove(index)
            .ok_or(ArtdexError::InvalidIndex { index, len })?;
        let report = self.persist_registry()?;
        Ok((removed, report))
    }

    /// Remove every archive source, persist, and rescan.
    pub fn clear_archives(&mut self) -> Result<RescanReport> {
        self.registry.clear();
        self.persist_registry()
    }

    /// Include or exclude the catalog directory itself, persist, and rescan.
    pub fn set_include_folder(&mut self, include: bool) -> Result<RescanReport> {
        self.registry.set_include_folder(include);
        self.persist_registry()
    }

    fn persist_registry(&mut self) -> Result<RescanReport> {
        self.registry.save(&self.directory)?;
        Ok(self.rescan())
    }

    /// Materialize archive items and videos in the catalog directory and
    /// save the snapshot.
    pub fn export(&mut self, transcoder: &dyn Transcoder) -> Result<ExportReport> {
        let report = ExportEngine::new(&self.store, transcoder).run(&mut self.list)?;
        self.dirty = false;
        Ok(report)
    }
}
