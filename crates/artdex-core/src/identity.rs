//! Stable identity strings used as the reconciliation key.
//!
//! Filesystem items are keyed by file name alone, archive items by archive
//! path plus member path:
//!
//! ```
//! use artdex_core::identity::identity;
//! use artdex_core::SourceType;
//!
//! assert_eq!(identity(SourceType::Fs, "a.png", None), "fs|a.png");
//! assert_eq!(
//!     identity(SourceType::Zip, "art/x.gif", Some("/srv/pack.zip")),
//!     "zip|/srv/pack.zip|art/x.gif"
//! );
//! ```
//!
//! Identity is not content based: replacing a file in place keeps its
//! metadata.

use crate::models::SourceType;

/// Identity of an item.
///
/// `name` is the file name for [`SourceType::Fs`] and the inner archive path
/// otherwise. `source_path` is ignored for filesystem items; a missing archive
/// path renders as an empty segment.
pub fn identity(source_type: SourceType, name: &str, source_path: Option<&str>) -> String {
    match source_type {
        SourceType::Fs => format!("fs|{}", name),
        st => format!("{}|{}|{}", st.as_str(), source_path.unwrap_or_default(), name),
    }
}

/// Identity from the addressing fields of a stored or scanned record.
pub fn record_identity(
    source_type: SourceType,
    fname: &str,
    source_path: Option<&str>,
    inner_path: Option<&str>,
) -> String {
    match source_type {
        SourceType::Fs => identity(SourceType::Fs, fname, None),
        st => identity(st, inner_path.unwrap_or_default(), source_path),
    }
}
