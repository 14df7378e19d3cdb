//! Artdex Core - catalog engine for a folder of artwork files.
//!
//! A catalog is one directory of images and short videos, optionally
//! extended with items that live inside zip and tar archives. The engine
//! scans those sources, reconciles what it finds with the persisted
//! `artlist.json` snapshot (titles, featured ranks, custom order), and can
//! export archive items and videos into the directory as plain files.
//!
//! # Example
//!
//! ```rust,no_run
//! use artdex_core::{Catalog, SortMode};
//!
//! fn main() -> artdex_core::Result<()> {
//!     let mut catalog = Catalog::open("/path/to/gallery")?;
//!
//!     let index = catalog.find("sunset.png")?;
//!     catalog.list_mut().set_featured(index, true)?;
//!     catalog.list_mut().sort(SortMode::DateDesc);
//!     catalog.save()?;
//!
//!     for art in catalog.list() {
//!         println!("{:>4} {}", art.id, art.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod identity;
pub mod metadata;
pub mod models;
pub mod order;
pub mod reconcile;
pub mod registry;
pub mod scanner;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogBuilder, RescanReport};
pub use error::{ArtdexError, Result};
pub use export::{ExportEngine, ExportReport, FfmpegTranscoder, Transcoder};
pub use metadata::MetadataStore;
pub use models::{Artwork, ScanEntry, SourceType};
pub use order::{ArtList, SortMode};
pub use reconcile::{reconcile, Reconciliation};
pub use registry::ArchiveRegistry;
pub use scanner::{ScanOutcome, SourceDescriptor, SourceScan, SourceUnavailable};
