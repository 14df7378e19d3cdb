//! Error types for the artdex engine.
//!
//! Most failures inside a catalog pass are contained: an unreadable archive
//! becomes an empty source, an unreadable snapshot becomes an empty catalog,
//! and a failed export item is counted and skipped. The variants below exist
//! so those outcomes stay visible in return types and logs.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the artdex engine.
#[derive(Debug, Error)]
pub enum ArtdexError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Metadata document {path} is unreadable: {message}")]
    MetadataParse { path: PathBuf, message: String },

    // Source errors
    #[error("Source unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Archive error: {message}")]
    Archive { message: String },

    #[error("Entry {inner_path} not found in {archive}")]
    ArchiveEntryNotFound { archive: PathBuf, inner_path: String },

    // Export errors
    #[error("Export failed for {fname}: {message}")]
    ExportFailed { fname: String, message: String },

    #[error("Transcode tool not available: {tool}")]
    TranscodeUnavailable { tool: String },

    #[error("Transcode failed: {message}")]
    TranscodeFailed { message: String },

    // Catalog editing errors
    #[error("Index {index} out of range for catalog of {len} items")]
    InvalidIndex { index: usize, len: usize },

    #[error("Artwork not found: {0}")]
    NotFound(String),

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for artdex operations.
pub type Result<T> = std::result::Result<T, ArtdexError>;

impl From<std::io::Error> for ArtdexError {
    fn from(err: std::io::Error) -> Self {
        ArtdexError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for ArtdexError {
    fn from(err: serde_json::Error) -> Self {
        ArtdexError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<zip::result::ZipError> for ArtdexError {
    fn from(err: zip::result::ZipError) -> Self {
        ArtdexError::Archive {
            message: err.to_string(),
        }
    }
}

impl ArtdexError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ArtdexError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }
}
