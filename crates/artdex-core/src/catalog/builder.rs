//! Builder for opening a catalog.

use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::error::{ArtdexError, Result};
use crate::metadata::MetadataStore;
use crate::order::ArtList;
use crate::registry::ArchiveRegistry;

/// Builder for configuring how a [`Catalog`] is opened.
///
/// # Example
///
/// ```rust,no_run
/// use artdex_core::Catalog;
///
/// let catalog = Catalog::builder("./gallery")
///     .create_dir(true)
///     .keep_backup(true)
///     .build()?;
/// println!("{} items", catalog.list().len());
/// # Ok::<(), artdex_core::ArtdexError>(())
/// ```
pub struct CatalogBuilder {
    directory: PathBuf,
    keep_backup: bool,
    parallel_scan: bool,
    create_dir: bool,
    scan_on_open: bool,
}

impl CatalogBuilder {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            keep_backup: false,
            parallel_scan: true,
            create_dir: false,
            scan_on_open: true,
        }
    }

    /// Keep the previous snapshot as `artlist.json.bak` on every save.
    ///
    /// Default: `false`
    pub fn keep_backup(mut self, enable: bool) -> Self {
        self.keep_backup = enable;
        self
    }

    /// Scan sources on separate threads.
    ///
    /// Default: `true`
    pub fn parallel_scan(mut self, enable: bool) -> Self {
        self.parallel_scan = enable;
        self
    }

    /// Create the catalog directory if it is missing.
    ///
    /// Default: `false` (the directory must exist)
    pub fn create_dir(mut self, enable: bool) -> Self {
        self.create_dir = enable;
        self
    }

    /// Run a reconciling scan while opening.
    ///
    /// Default: `true`
    pub fn scan_on_open(mut self, enable: bool) -> Self {
        self.scan_on_open = enable;
        self
    }

    pub fn build(self) -> Result<Catalog> {
        if !self.directory.is_dir() {
            if self.create_dir {
                std::fs::create_dir_all(&self.directory).map_err(|e| ArtdexError::Io {
                    message: format!(
                        "Failed to create catalog directory: {}",
                        self.directory.display()
                    ),
                    path: Some(self.directory.clone()),
                    source: Some(e),
                })?;
            } else {
                return Err(ArtdexError::Config {
                    message: format!(
                        "Catalog directory does not exist: {}",
                        self.directory.display()
                    ),
                });
            }
        }

        let registry = ArchiveRegistry::load(&self.directory);
        let store = MetadataStore::new(&self.directory).with_backup(self.keep_backup);

        let mut catalog = Catalog {
            directory: self.directory,
            store,
            registry,
            list: ArtList::default(),
            parallel_scan: self.parallel_scan,
            dirty: false,
        };

        if self.scan_on_open {
            catalog.rescan();
        } else {
            catalog.list = ArtList::from_artworks(catalog.store.load_list());
        }

        Ok(catalog)
    }
}
