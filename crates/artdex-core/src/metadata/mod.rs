//! Metadata persistence.
//!
//! This module provides:
//! - Atomic JSON file operations shared by every catalog document
//! - The artwork snapshot store with its legacy fallback

mod atomic;
mod store;

pub use atomic::{atomic_read_json, atomic_write_json, backup_path_for};
pub use store::{load_metadata, load_metadata_list, save_metadata, MetadataStore};
