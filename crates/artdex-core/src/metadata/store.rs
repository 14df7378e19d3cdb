//! Snapshot persistence for `artlist.json`.
//!
//! The snapshot is an ordered JSON array of [`Artwork`] objects. Loading never
//! fails: a broken primary document falls back to the legacy `artlist.txt`
//! (an older, reduced array written with quoted numbers), and a broken legacy
//! document falls back to an empty catalog.

use crate::config::PathsConfig;
use crate::metadata::atomic::{atomic_read_json, atomic_write_json};
use crate::models::{default_title, Artwork, SourceType};
use crate::{ArtdexError, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Primary document record. Every field but `fname` may be missing.
#[derive(Debug, Deserialize)]
struct StoredArtwork {
    fname: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    date: Option<f64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    featured: bool,
    #[serde(default)]
    featured_rank: Option<u32>,
    #[serde(default)]
    source_type: SourceType,
    #[serde(default)]
    source_path: Option<String>,
    #[serde(default)]
    inner_path: Option<String>,
}

impl StoredArtwork {
    fn into_artwork(self, position: usize) -> Artwork {
        Artwork {
            title: self.title.unwrap_or_else(|| default_title(&self.fname)),
            fname: self.fname,
            id: self.id.unwrap_or(position as u64 + 1),
            date: self.date.unwrap_or(0.0),
            featured: self.featured,
            featured_rank: self.featured_rank,
            source_type: self.source_type,
            source_path: self.source_path,
            inner_path: self.inner_path,
        }
    }
}

/// Legacy document record: only name, id and date were ever written.
#[derive(Debug, Deserialize)]
struct LegacyArtwork {
    fname: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    date: Option<f64>,
}

impl LegacyArtwork {
    fn into_artwork(self, position: usize) -> Artwork {
        Artwork::new(
            self.fname,
            self.id.unwrap_or(position as u64 + 1),
            self.date.unwrap_or(0.0),
        )
    }
}

/// Accept a number, a numeric string, or null.
fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid id: {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {:?}", s))),
        Some(other) => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid date: {:?}", s))),
        Some(other) => Err(serde::de::Error::custom(format!("invalid date: {}", other))),
    }
}

/// Loads and saves the metadata snapshot of one catalog directory.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    directory: PathBuf,
    keep_backup: bool,
}

impl MetadataStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            keep_backup: false,
        }
    }

    /// Copy the previous snapshot to `artlist.json.bak` on every save.
    pub fn with_backup(mut self, keep_backup: bool) -> Self {
        self.keep_backup = keep_backup;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn primary_path(&self) -> PathBuf {
        self.directory.join(PathsConfig::METADATA_FILENAME)
    }

    pub fn legacy_path(&self) -> PathBuf {
        self.directory.join(PathsConfig::LEGACY_METADATA_FILENAME)
    }

    /// Last saved snapshot keyed by identity.
    pub fn load(&self) -> HashMap<String, Artwork> {
        load_metadata(&self.primary_path(), &self.legacy_path())
    }

    /// Last saved snapshot in document order.
    pub fn load_list(&self) -> Vec<Artwork> {
        load_metadata_list(&self.primary_path(), &self.legacy_path())
    }

    /// Overwrite the snapshot with `artworks`, in order.
    pub fn save(&self, artworks: &[Artwork]) -> Result<()> {
        save_metadata(&self.directory, artworks, self.keep_backup)
    }
}

/// Load the snapshot keyed by identity. Never fails; see the module docs for
/// the fallback chain.
pub fn load_metadata(primary: &Path, legacy: &Path) -> HashMap<String, Artwork> {
    load_metadata_list(primary, legacy)
        .into_iter()
        .map(|art| (art.identity(), art))
        .collect()
}

/// Load the snapshot in document order.
pub fn load_metadata_list(primary: &Path, legacy: &Path) -> Vec<Artwork> {
    match read_primary(primary) {
        Ok(Some(artworks)) => {
            debug!("Loaded {} artworks from {}", artworks.len(), primary.display());
            return artworks;
        }
        Ok(None) => {}
        Err(e) => warn!("Falling back to legacy metadata: {}", e),
    }

    match read_legacy(legacy) {
        Ok(Some(artworks)) => {
            info!(
                "Loaded {} artworks from legacy {}",
                artworks.len(),
                legacy.display()
            );
            artworks
        }
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("Ignoring unreadable legacy metadata: {}", e);
            Vec::new()
        }
    }
}

/// Write the snapshot to `<directory>/artlist.json`.
pub fn save_metadata(directory: &Path, artworks: &[Artwork], keep_backup: bool) -> Result<()> {
    let path = directory.join(PathsConfig::METADATA_FILENAME);
    atomic_write_json(&path, &artworks, keep_backup)?;
    info!("Saved {} artworks to {}", artworks.len(), path.display());
    Ok(())
}

fn read_primary(path: &Path) -> Result<Option<Vec<Artwork>>> {
    let stored: Option<Vec<StoredArtwork>> =
        atomic_read_json(path).map_err(|e| ArtdexError::MetadataParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(stored.map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| item.into_artwork(idx))
            .collect()
    }))
}

fn read_legacy(path: &Path) -> Result<Option<Vec<Artwork>>> {
    let stored: Option<Vec<LegacyArtwork>> =
        atomic_read_json(path).map_err(|e| ArtdexError::MetadataParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(stored.map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| item.into_artwork(idx))
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn archived(fname: &str, id: u64, st: SourceType, archive: &str) -> Artwork {
        Artwork {
            fname: fname.to_string(),
            id,
            date: 1_700_000_000.123_456_7,
            title: format!("Title of {}", fname),
            featured: true,
            featured_rank: Some(1),
            source_type: st,
            source_path: Some(archive.to_string()),
            inner_path: Some(format!("nested/{}", fname)),
        }
    }

    #[test]
    fn test_save_then_load_list_is_lossless() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::new(temp_dir.path());

        let mut plain = Artwork::new("a.png", 2, 0.1 + 0.2);
        plain.title = "Ünïcödé ✓".to_string();
        let artworks = vec![
            archived("x.gif", 1, SourceType::Zip, "/srv/pack.zip"),
            plain,
            archived("y.webp", 3, SourceType::Tar, "/srv/pack.tar.gz"),
        ];

        store.save(&artworks).unwrap();
        assert_eq!(store.load_list(), artworks);

        let by_identity = store.load();
        assert_eq!(by_identity.len(), 3);
        assert_eq!(by_identity["fs|a.png"], artworks[1]);
        assert_eq!(
            by_identity["zip|/srv/pack.zip|nested/x.gif"],
            artworks[0]
        );
    }

    #[test]
    fn test_saved_document_is_pretty_array() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::new(temp_dir.path());
        store.save(&[Artwork::new("a.png", 1, 5.0)]).unwrap();

        let text = std::fs::read_to_string(store.primary_path()).unwrap();
        assert!(text.starts_with("[\n"));
        assert!(text.contains("\"featured_rank\": null"));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::new(temp_dir.path());
        std::fs::write(
            store.primary_path(),
            r#"[{"fname": "first.png"}, {"fname": "second.jpg", "featured": true}]"#,
        )
        .unwrap();

        let list = store.load_list();
        assert_eq!(list[0].id, 1);
        assert_eq!(list[0].title, "first");
        assert_eq!(list[0].source_type, SourceType::Fs);
        assert_eq!(list[1].id, 2);
        assert!(list[1].featured);
        assert_eq!(list[1].date, 0.0);
    }

    #[test]
    fn test_truncated_primary_without_legacy_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::new(temp_dir.path());
        std::fs::write(store.primary_path(), r#"[{"fname": "a.png", "id": 1"#).unwrap();

        assert!(store.load().is_empty());
    }

    #[test]
    fn test_truncated_primary_falls_back_to_legacy() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::new(temp_dir.path());
        std::fs::write(store.primary_path(), "not json").unwrap();
        std::fs::write(
            store.legacy_path(),
            "[\n    {\"fname\": \"old.png\", \"id\": \"7\", \"date\":\"1690000000.5\"}\n]\n",
        )
        .unwrap();

        let loaded = store.load();
        let old = &loaded["fs|old.png"];
        assert_eq!(old.id, 7);
        assert_eq!(old.date, 1_690_000_000.5);
        assert_eq!(old.title, "old");
        assert!(!old.featured);
    }

    #[test]
    fn test_legacy_only_is_used_when_primary_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::new(temp_dir.path());
        std::fs::write(store.legacy_path(), r#"[{"fname": "b.gif", "id": 3, "date": 2}]"#)
            .unwrap();

        let list = store.load_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, 3);
    }

    #[test]
    fn test_both_documents_broken_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::new(temp_dir.path());
        std::fs::write(store.primary_path(), "{").unwrap();
        std::fs::write(store.legacy_path(), "[{\"id\": 1}]").unwrap();

        assert!(store.load_list().is_empty());
    }

    #[test]
    fn test_save_into_missing_directory_is_hard_failure() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::new(temp_dir.path().join("missing"));
        assert!(store.save(&[Artwork::new("a.png", 1, 0.0)]).is_err());
    }

    #[test]
    fn test_backup_is_written_when_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::new(temp_dir.path()).with_backup(true);
        store.save(&[Artwork::new("a.png", 1, 0.0)]).unwrap();
        store.save(&[Artwork::new("b.png", 1, 0.0)]).unwrap();

        let backup = temp_dir.path().join("artlist.json.bak");
        let previous: Vec<Artwork> =
            serde_json::from_str(&std::fs::read_to_string(backup).unwrap()).unwrap();
        assert_eq!(previous[0].fname, "a.png");
    }
}
