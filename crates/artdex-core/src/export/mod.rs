//! Export pass: materialize archive items and videos as files in the
//! catalog directory.
//!
//! For each record in custom order:
//!
//! - a folder video is transcoded to an animated image next to it;
//! - an archive video is extracted to a temp file and transcoded into the
//!   folder;
//! - any other archive member is copied into the folder under a
//!   collision-free name.
//!
//! Exported records are rewritten to point at the new file. Folder records
//! that are not videos are left alone. One item failing never stops the
//! pass, and the snapshot is saved at the end either way.

mod transcode;

pub use transcode::{FfmpegTranscoder, Transcoder};

use crate::config::MediaConfig;
use crate::metadata::MetadataStore;
use crate::models::{Artwork, SourceType};
use crate::order::ArtList;
use crate::scanner::read_archive_entry;
use crate::{ArtdexError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Counters for one export pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Items materialized in the folder (copied or transcoded).
    pub exported: usize,
    /// Copies written under a suffixed name because the plain name was taken.
    pub renamed: usize,
    /// Items produced by the transcoder.
    pub transcoded: usize,
    /// Items that failed and were left as they were.
    pub failed: usize,
    /// One message per failed item.
    pub errors: Vec<String>,
}

enum ItemOutcome {
    Unchanged,
    Copied { renamed: bool },
    Transcoded,
}

/// Runs the export pass against one catalog directory.
pub struct ExportEngine<'a> {
    store: &'a MetadataStore,
    transcoder: &'a dyn Transcoder,
}

impl<'a> ExportEngine<'a> {
    pub fn new(store: &'a MetadataStore, transcoder: &'a dyn Transcoder) -> Self {
        Self { store, transcoder }
    }

    fn directory(&self) -> &Path {
        self.store.directory()
    }

    /// Export every eligible record, then save the snapshot.
    ///
    /// Only the final save can fail the call; per-item failures are counted
    /// in the report.
    pub fn run(&self, list: &mut ArtList) -> Result<ExportReport> {
        let mut report = ExportReport::default();

        for art in list.records_mut() {
            match self.export_one(art) {
                Ok(ItemOutcome::Unchanged) => {}
                Ok(ItemOutcome::Copied { renamed }) => {
                    report.exported += 1;
                    if renamed {
                        report.renamed += 1;
                    }
                }
                Ok(ItemOutcome::Transcoded) => {
                    report.exported += 1;
                    report.transcoded += 1;
                }
                Err(e) => {
                    warn!("Failed to export {}: {}", art.fname, e);
                    report.failed += 1;
                    report.errors.push(
                        ArtdexError::ExportFailed {
                            fname: art.fname.clone(),
                            message: e.to_string(),
                        }
                        .to_string(),
                    );
                }
            }
        }

        list.normalize();
        self.store.save(list.as_slice())?;

        info!(
            "Export finished: {} exported, {} renamed, {} transcoded, {} failed",
            report.exported, report.renamed, report.transcoded, report.failed
        );
        Ok(report)
    }

    fn export_one(&self, art: &mut Artwork) -> Result<ItemOutcome> {
        let is_video = MediaConfig::is_video(&art.fname);
        match art.source_type {
            SourceType::Fs if is_video => self.transcode_folder_video(art),
            SourceType::Fs => Ok(ItemOutcome::Unchanged),
            SourceType::Zip | SourceType::Tar if is_video => self.transcode_archive_video(art),
            SourceType::Zip | SourceType::Tar => self.copy_archive_member(art),
        }
    }

    fn transcode_folder_video(&self, art: &mut Artwork) -> Result<ItemOutcome> {
        let src = self.directory().join(&art.fname);
        if !src.exists() {
            debug!("Skipping missing video {}", src.display());
            return Ok(ItemOutcome::Unchanged);
        }

        let target = unique_name(self.directory(), &animated_name(&art.fname));
        let dst = self.directory().join(&target);
        self.transcode_to(&src, &dst)?;

        debug!("Transcoded {} -> {}", art.fname, target);
        art.relocate_to_fs(target);
        Ok(ItemOutcome::Transcoded)
    }

    fn transcode_archive_video(&self, art: &mut Artwork) -> Result<ItemOutcome> {
        let data = self.read_member(art)?;

        let mut temp = tempfile::Builder::new()
            .prefix("artdex-")
            .suffix(".mp4")
            .tempfile()?;
        temp.write_all(&data)?;
        temp.flush()?;

        let target = unique_name(self.directory(), &animated_name(&art.fname));
        let dst = self.directory().join(&target);
        self.transcode_to(temp.path(), &dst)?;

        debug!("Transcoded archive member {} -> {}", art.fname, target);
        art.relocate_to_fs(target);
        Ok(ItemOutcome::Transcoded)
    }

    fn copy_archive_member(&self, art: &mut Artwork) -> Result<ItemOutcome> {
        let data = self.read_member(art)?;

        let target = unique_name(self.directory(), &art.fname);
        let renamed = target != art.fname;
        let dst = self.directory().join(&target);
        fs::write(&dst, data).map_err(|e| ArtdexError::io_with_path(e, &dst))?;

        debug!("Copied archive member {} -> {}", art.fname, target);
        art.relocate_to_fs(target);
        Ok(ItemOutcome::Copied { renamed })
    }

    fn read_member(&self, art: &Artwork) -> Result<Vec<u8>> {
        let (Some(source_path), Some(inner_path)) = (&art.source_path, &art.inner_path) else {
            return Err(ArtdexError::Archive {
                message: format!("{} has no archive location", art.fname),
            });
        };
        read_archive_entry(art.source_type, Path::new(source_path), inner_path)
    }

    /// Run the transcoder; an output file on disk counts as success even if
    /// the transcoder reported an error.
    fn transcode_to(&self, src: &Path, dst: &Path) -> Result<()> {
        match self.transcoder.transcode(src, dst) {
            Ok(()) if dst.exists() => Ok(()),
            Ok(()) => Err(ArtdexError::TranscodeFailed {
                message: format!("no output written to {}", dst.display()),
            }),
            Err(e) if dst.exists() => {
                warn!("Transcoder reported {} but produced {}", e, dst.display());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// `name` with its extension replaced by the animated image extension.
fn animated_name(name: &str) -> String {
    PathBuf::from(name)
        .with_extension(MediaConfig::ANIMATED_EXTENSION)
        .to_string_lossy()
        .into_owned()
}

/// `name` if no file by that name exists in `directory`, otherwise the first
/// free `<stem>-<n><ext>` for n = 2, 3, ...
pub fn unique_name(directory: &Path, name: &str) -> String {
    if !directory.join(name).exists() {
        return name.to_string();
    }

    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 2;
    loop {
        let candidate = format!("{}-{}{}", stem, n, ext);
        if !directory.join(&candidate).exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScanEntry;
    use std::cell::RefCell;
    use std::fs::File;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Records calls and writes a fixed payload, or fails without output.
    struct RecordingTranscoder {
        calls: RefCell<Vec<(PathBuf, PathBuf)>>,
        succeed: bool,
    }

    impl RecordingTranscoder {
        fn new(succeed: bool) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                succeed,
            }
        }
    }

    impl Transcoder for RecordingTranscoder {
        fn transcode(&self, src: &Path, dst: &Path) -> Result<()> {
            self.calls
                .borrow_mut()
                .push((src.to_path_buf(), dst.to_path_buf()));
            assert!(src.exists(), "transcoder input must exist");
            if self.succeed {
                fs::write(dst, b"GIF89a")?;
                Ok(())
            } else {
                Err(ArtdexError::TranscodeFailed {
                    message: "boom".into(),
                })
            }
        }
    }

    fn write_zip(path: &Path, members: &[(&str, &[u8])]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in members {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    fn archived(zip: &Path, inner: &str) -> Artwork {
        let entry = ScanEntry::archived(
            SourceType::Zip,
            zip.canonicalize().unwrap().to_string_lossy(),
            inner,
            0.0,
        );
        Artwork::from_scan(&entry, 0)
    }

    #[test]
    fn test_unique_name() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(unique_name(temp_dir.path(), "x.gif"), "x.gif");
        fs::write(temp_dir.path().join("x.gif"), b"").unwrap();
        assert_eq!(unique_name(temp_dir.path(), "x.gif"), "x-2.gif");
        fs::write(temp_dir.path().join("x-2.gif"), b"").unwrap();
        assert_eq!(unique_name(temp_dir.path(), "x.gif"), "x-3.gif");
        fs::write(temp_dir.path().join("README"), b"").unwrap();
        assert_eq!(unique_name(temp_dir.path(), "README"), "README-2");
    }

    #[test]
    fn test_archive_member_copied_with_collision_suffix() {
        let catalog = TempDir::new().unwrap();
        let sources = TempDir::new().unwrap();
        let zip = sources.path().join("p.zip");
        write_zip(&zip, &[("x.gif", b"from-zip")]);
        fs::write(catalog.path().join("x.gif"), b"existing").unwrap();

        let mut list = ArtList::from_artworks(vec![
            Artwork::new("x.gif", 0, 0.0),
            archived(&zip, "x.gif"),
        ]);
        let store = MetadataStore::new(catalog.path());
        let transcoder = RecordingTranscoder::new(true);
        let report = ExportEngine::new(&store, &transcoder).run(&mut list).unwrap();

        assert_eq!(report.exported, 1);
        assert_eq!(report.renamed, 1);
        assert_eq!(
            fs::read(catalog.path().join("x-2.gif")).unwrap(),
            b"from-zip"
        );
        assert_eq!(fs::read(catalog.path().join("x.gif")).unwrap(), b"existing");

        let exported = list.get(1).unwrap();
        assert_eq!(exported.fname, "x-2.gif");
        assert_eq!(exported.source_type, SourceType::Fs);
        assert!(exported.source_path.is_none());
        assert!(exported.inner_path.is_none());
        assert_eq!(exported.id, 2);
        assert!(transcoder.calls.borrow().is_empty());
    }

    #[test]
    fn test_videos_go_through_transcoder() {
        let catalog = TempDir::new().unwrap();
        let sources = TempDir::new().unwrap();
        let zip = sources.path().join("p.zip");
        write_zip(&zip, &[("clips/b.mp4", b"b-video")]);
        fs::write(catalog.path().join("a.mp4"), b"a-video").unwrap();

        let mut list = ArtList::from_artworks(vec![
            Artwork::new("a.mp4", 0, 0.0),
            archived(&zip, "clips/b.mp4"),
            Artwork::new("still.png", 0, 0.0),
        ]);
        list.set_featured(1, true).unwrap();

        let store = MetadataStore::new(catalog.path());
        let transcoder = RecordingTranscoder::new(true);
        let report = ExportEngine::new(&store, &transcoder).run(&mut list).unwrap();

        assert_eq!(report.exported, 2);
        assert_eq!(report.transcoded, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(list.get(0).unwrap().fname, "a.gif");
        assert_eq!(list.get(1).unwrap().fname, "b.gif");
        assert_eq!(list.get(1).unwrap().featured_rank, Some(1));
        assert_eq!(list.get(2).unwrap().fname, "still.png");

        let calls = transcoder.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, catalog.path().join("a.mp4"));
        assert_eq!(calls[1].1, catalog.path().join("b.gif"));
        // The extracted temp input is gone once the item is done.
        assert!(!calls[1].0.exists());
    }

    #[test]
    fn test_failures_are_counted_and_snapshot_still_saved() {
        let catalog = TempDir::new().unwrap();
        let sources = TempDir::new().unwrap();
        let zip = sources.path().join("p.zip");
        write_zip(&zip, &[("ok.png", b"png")]);
        fs::write(catalog.path().join("a.mp4"), b"video").unwrap();

        let mut missing_member = archived(&zip, "ok.png");
        missing_member.inner_path = Some("gone.png".into());

        let mut list = ArtList::from_artworks(vec![
            Artwork::new("a.mp4", 0, 0.0),
            missing_member,
            archived(&zip, "ok.png"),
        ]);
        let store = MetadataStore::new(catalog.path());
        let transcoder = RecordingTranscoder::new(false);
        let report = ExportEngine::new(&store, &transcoder).run(&mut list).unwrap();

        assert_eq!(report.failed, 2);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.exported, 1);
        assert_eq!(list.get(0).unwrap().fname, "a.mp4");
        assert_eq!(list.get(1).unwrap().source_type, SourceType::Zip);
        assert_eq!(list.get(2).unwrap().source_type, SourceType::Fs);

        let saved = store.load_list();
        assert_eq!(saved.len(), 3);
        assert_eq!(saved[2].fname, "ok.png");
        assert_eq!(saved[2].source_type, SourceType::Fs);
    }

    #[test]
    fn test_placeholder_counts_as_success() {
        let catalog = TempDir::new().unwrap();
        fs::write(catalog.path().join("a.mp4"), b"video").unwrap();

        let mut list = ArtList::from_artworks(vec![Artwork::new("a.mp4", 0, 0.0)]);
        let store = MetadataStore::new(catalog.path());
        let transcoder = FfmpegTranscoder::with_tool(None);
        let report = ExportEngine::new(&store, &transcoder).run(&mut list).unwrap();

        assert_eq!(report.exported, 1);
        assert_eq!(fs::read(catalog.path().join("a.gif")).unwrap(), b"");
        assert_eq!(list.get(0).unwrap().fname, "a.gif");
    }

    #[test]
    fn test_save_failure_is_returned() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::new(temp_dir.path().join("vanished"));
        let transcoder = RecordingTranscoder::new(true);
        let mut list = ArtList::from_artworks(vec![Artwork::new("a.png", 0, 0.0)]);

        assert!(ExportEngine::new(&store, &transcoder).run(&mut list).is_err());
    }
}
