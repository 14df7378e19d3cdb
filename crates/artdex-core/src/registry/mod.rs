//! Persisted list of archive sources.

mod archive_registry;

pub use archive_registry::ArchiveRegistry;
