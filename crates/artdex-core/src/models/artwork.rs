//! Artwork records and their source addressing.

use crate::identity::record_identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Where an artwork's bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// A file directly inside the catalog directory.
    #[default]
    Fs,
    /// A member of a zip archive.
    Zip,
    /// A member of a (possibly compressed) tar archive.
    Tar,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Fs => "fs",
            SourceType::Zip => "zip",
            SourceType::Tar => "tar",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fs" => Ok(SourceType::Fs),
            "zip" => Ok(SourceType::Zip),
            "tar" => Ok(SourceType::Tar),
            other => Err(format!("unknown source type: {}", other)),
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    /// Base file name as currently addressable.
    pub fname: String,
    /// Position in the custom order, dense 1..N.
    pub id: u64,
    /// Creation or archive-recorded time, seconds since the Unix epoch.
    pub date: f64,
    /// Display title.
    pub title: String,
    pub featured: bool,
    /// Dense 1..K over featured items; `None` iff not featured.
    pub featured_rank: Option<u32>,
    pub source_type: SourceType,
    /// Absolute archive path (archive items only).
    pub source_path: Option<String>,
    /// Member path inside the archive (archive items only).
    pub inner_path: Option<String>,
}

impl Artwork {
    /// A filesystem artwork with default curation.
    pub fn new(fname: impl Into<String>, id: u64, date: f64) -> Self {
        let fname = fname.into();
        Self {
            title: default_title(&fname),
            fname,
            id,
            date,
            featured: false,
            featured_rank: None,
            source_type: SourceType::Fs,
            source_path: None,
            inner_path: None,
        }
    }

    /// Build a provisional record from a scan result.
    pub fn from_scan(entry: &ScanEntry, id: u64) -> Self {
        Self {
            fname: entry.fname.clone(),
            id,
            date: entry.date,
            title: default_title(&entry.fname),
            featured: false,
            featured_rank: None,
            source_type: entry.source_type,
            source_path: entry.source_path.clone(),
            inner_path: entry.inner_path.clone(),
        }
    }

    /// Stable reconciliation key.
    pub fn identity(&self) -> String {
        record_identity(
            self.source_type,
            &self.fname,
            self.source_path.as_deref(),
            self.inner_path.as_deref(),
        )
    }

    /// Point this record at a file in the catalog directory.
    pub fn relocate_to_fs(&mut self, fname: impl Into<String>) {
        self.fname = fname.into();
        self.source_type = SourceType::Fs;
        self.source_path = None;
        self.inner_path = None;
    }
}

/// One media entry found by a scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanEntry {
    pub fname: String,
    pub date: f64,
    pub source_type: SourceType,
    pub source_path: Option<String>,
    pub inner_path: Option<String>,
}

impl ScanEntry {
    /// Entry for a file directly inside the catalog directory.
    pub fn fs(fname: impl Into<String>, date: f64) -> Self {
        Self {
            fname: fname.into(),
            date,
            source_type: SourceType::Fs,
            source_path: None,
            inner_path: None,
        }
    }

    /// Entry for an archive member; `fname` is the member's base name.
    pub fn archived(
        source_type: SourceType,
        source_path: impl Into<String>,
        inner_path: impl Into<String>,
        date: f64,
    ) -> Self {
        let inner_path = inner_path.into();
        let fname = base_name(&inner_path).to_string();
        Self {
            fname,
            date,
            source_type,
            source_path: Some(source_path.into()),
            inner_path: Some(inner_path),
        }
    }

    pub fn identity(&self) -> String {
        record_identity(
            self.source_type,
            &self.fname,
            self.source_path.as_deref(),
            self.inner_path.as_deref(),
        )
    }
}

/// Title used when nothing has been curated: the file name without extension.
pub fn default_title(fname: &str) -> String {
    Path::new(fname)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| fname.to_string())
}

/// Last path component of an archive member name.
fn base_name(inner_path: &str) -> &str {
    inner_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(inner_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_title_strips_last_extension() {
        assert_eq!(default_title("sunset.png"), "sunset");
        assert_eq!(default_title("archive.tar.gz"), "archive.tar");
        assert_eq!(default_title("noext"), "noext");
    }

    #[test]
    fn test_archived_entry_uses_base_name() {
        let entry = ScanEntry::archived(SourceType::Zip, "/art/pack.zip", "sub/dir/x.gif", 0.0);
        assert_eq!(entry.fname, "x.gif");
        assert_eq!(entry.inner_path.as_deref(), Some("sub/dir/x.gif"));
    }

    #[test]
    fn test_artwork_serializes_null_optionals() {
        let art = Artwork::new("a.png", 1, 10.5);
        let json = serde_json::to_value(&art).unwrap();
        assert_eq!(json["source_type"], "fs");
        assert!(json["featured_rank"].is_null());
        assert!(json["source_path"].is_null());
        assert!(json["inner_path"].is_null());
        assert_eq!(json["title"], "a");
    }

    #[test]
    fn test_relocate_clears_archive_fields() {
        let entry = ScanEntry::archived(SourceType::Tar, "/art/pack.tar", "x.gif", 3.0);
        let mut art = Artwork::from_scan(&entry, 1);
        art.relocate_to_fs("x-2.gif");
        assert_eq!(art.source_type, SourceType::Fs);
        assert_eq!(art.fname, "x-2.gif");
        assert!(art.source_path.is_none());
        assert!(art.inner_path.is_none());
        assert_eq!(art.identity(), "fs|x-2.gif");
    }

    #[test]
    fn test_source_type_round_trips_through_str() {
        for st in [SourceType::Fs, SourceType::Zip, SourceType::Tar] {
            assert_eq!(st.as_str().parse::<SourceType>().unwrap(), st);
        }
        assert!("rar".parse::<SourceType>().is_err());
    }
}
