//! Zip archive scanning and member reads.

use super::canonical_source_path;
use crate::config::MediaConfig;
use crate::models::{ScanEntry, SourceType};
use crate::{ArtdexError, Result};
use chrono::{Duration, Local, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

fn open(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path).map_err(|e| ArtdexError::Io {
        message: format!("Failed to open zip archive: {}", e),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;

    ZipArchive::new(BufReader::new(file)).map_err(|e| ArtdexError::Archive {
        message: format!("Invalid zip archive {}: {}", path.display(), e),
    })
}

/// Media members of a zip archive in archive order.
pub fn scan_zip(path: &Path) -> Result<Vec<ScanEntry>> {
    let mut archive = open(path)?;
    let source_path = canonical_source_path(path)?;

    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let member = match archive.by_index_raw(i) {
            Ok(member) => member,
            Err(e) => {
                warn!("Skipping zip entry {} of {}: {}", i, path.display(), e);
                continue;
            }
        };
        if member.is_dir() || !MediaConfig::is_media(member.name()) {
            continue;
        }

        let date = member_date(member.last_modified());
        entries.push(ScanEntry::archived(
            SourceType::Zip,
            source_path.as_str(),
            member.name(),
            date,
        ));
    }

    debug!("Found {} media entries in {}", entries.len(), path.display());
    Ok(entries)
}

/// Member timestamp in epoch seconds, or the epoch itself when the stored
/// value is missing or not a real calendar time.
fn member_date(modified: impl Into<Option<zip::DateTime>>) -> f64 {
    modified.into().and_then(local_timestamp).unwrap_or(0.0)
}

/// Zip timestamps carry no zone; read them as local calendar time.
fn local_timestamp(dt: zip::DateTime) -> Option<f64> {
    let date = NaiveDate::from_ymd_opt(
        i32::from(dt.year()),
        u32::from(dt.month()),
        u32::from(dt.day()),
    )?;
    let naive = date.and_hms_opt(
        u32::from(dt.hour()),
        u32::from(dt.minute()),
        u32::from(dt.second()),
    )?;
    resolve_local(&Local, &naive)
}

/// Epoch seconds of a wall-clock time in `tz`.
///
/// A repeated time takes its earlier instant. A time skipped by a forward
/// transition is read with the offset in effect before the jump, the way a
/// clock that was never moved forward would have recorded it.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> Option<f64> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => Some(t.timestamp() as f64),
        LocalResult::None => {
            let before = tz
                .offset_from_local_datetime(&(*naive - Duration::hours(24)))
                .earliest()?;
            let utc = naive.and_utc().timestamp() - i64::from(before.fix().local_minus_utc());
            Some(utc as f64)
        }
    }
}

/// Bytes of the member named `inner_path`.
pub fn read_zip_entry(path: &Path, inner_path: &str) -> Result<Vec<u8>> {
    let mut archive = open(path)?;
    let mut member = archive.by_name(inner_path).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => ArtdexError::ArchiveEntryNotFound {
            archive: path.to_path_buf(),
            inner_path: inner_path.to_string(),
        },
        other => other.into(),
    })?;

    let mut data = Vec::new();
    member
        .read_to_end(&mut data)
        .map_err(|e| ArtdexError::io_with_path(e, path))?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, members: &[(&str, &[u8])]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default().last_modified_time(
            zip::DateTime::from_date_and_time(2021, 6, 15, 12, 30, 0).unwrap(),
        );
        for (name, data) in members {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_scan_lists_media_members_in_archive_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pack.zip");
        write_zip(
            &path,
            &[
                ("z.png", b"z"),
                ("gifs/", b""),
                ("gifs/x.GIF", b"x"),
                ("readme.txt", b"r"),
                ("a.mp4", b"a"),
            ],
        );

        let entries = scan_zip(&path).unwrap();
        let inner: Vec<_> = entries
            .iter()
            .map(|e| e.inner_path.clone().unwrap())
            .collect();
        assert_eq!(inner, vec!["z.png", "gifs/x.GIF", "a.mp4"]);
        assert_eq!(entries[1].fname, "x.GIF");

        let canonical = path.canonicalize().unwrap().to_string_lossy().into_owned();
        for entry in &entries {
            assert_eq!(entry.source_type, SourceType::Zip);
            assert_eq!(entry.source_path.as_deref(), Some(canonical.as_str()));
        }
    }

    #[test]
    fn test_member_date_uses_local_calendar() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pack.zip");
        write_zip(&path, &[("x.gif", b"x")]);

        let expected = Local
            .with_ymd_and_hms(2021, 6, 15, 12, 30, 0)
            .earliest()
            .unwrap()
            .timestamp() as f64;
        assert_eq!(scan_zip(&path).unwrap()[0].date, expected);
    }

    /// Central European rules for 2021-03-28 only: clocks jump from 02:00
    /// (+01:00) to 03:00 (+02:00).
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        fn switch_utc() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2021, 3, 28)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap()
        }

        fn winter() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }

        fn summer() -> FixedOffset {
            FixedOffset::east_opt(7200).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let gap_start = Self::switch_utc() + Duration::hours(1);
            let gap_end = Self::switch_utc() + Duration::hours(2);
            if *local < gap_start {
                LocalResult::Single(Self::winter())
            } else if *local < gap_end {
                LocalResult::None
            } else {
                LocalResult::Single(Self::summer())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch_utc() {
                Self::winter()
            } else {
                Self::summer()
            }
        }
    }

    fn utc(h: u32, m: u32) -> f64 {
        NaiveDate::from_ymd_opt(2021, 3, 28)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
            .and_utc()
            .timestamp() as f64
    }

    fn local(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 3, 28)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_time_in_dst_gap_uses_offset_before_jump() {
        assert_eq!(resolve_local(&SpringForward, &local(2, 30)), Some(utc(1, 30)));
    }

    #[test]
    fn test_times_around_dst_gap() {
        assert_eq!(resolve_local(&SpringForward, &local(1, 59)), Some(utc(0, 59)));
        assert_eq!(resolve_local(&SpringForward, &local(3, 0)), Some(utc(1, 0)));
    }

    #[test]
    fn test_missing_timestamp_defaults_to_epoch() {
        assert_eq!(member_date(None::<zip::DateTime>), 0.0);
    }

    #[test]
    fn test_corrupt_archive_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.zip");
        std::fs::write(&path, b"definitely not a zip").unwrap();
        assert!(scan_zip(&path).is_err());
    }

    #[test]
    fn test_read_entry_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pack.zip");
        write_zip(&path, &[("dir/x.gif", b"GIF89a")]);

        assert_eq!(read_zip_entry(&path, "dir/x.gif").unwrap(), b"GIF89a");
        assert!(matches!(
            read_zip_entry(&path, "missing.gif"),
            Err(ArtdexError::ArchiveEntryNotFound { .. })
        ));
    }
}
