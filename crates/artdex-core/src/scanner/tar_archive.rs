//! Tar archive scanning and member reads.
//!
//! Compression is detected from the stream's magic bytes, so a `.tar.gz`
//! that is really plain tar (or the reverse) still opens. A plain tar starts
//! with its first member's name, which can look like a codec signature; when
//! the sniffed codec fails, the suffix codec and then plain tar are tried.

use super::canonical_source_path;
use crate::config::MediaConfig;
use crate::models::{ScanEntry, SourceType};
use crate::{ArtdexError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Bytes needed to recognise every supported signature.
const MAGIC_LEN: u64 = 10;

/// Tar stream compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    fn from_magic(header: &[u8]) -> Option<Self> {
        if header.starts_with(&[0x1f, 0x8b]) {
            Some(Compression::Gzip)
        } else if is_bzip2_header(header) {
            Some(Compression::Bzip2)
        } else if header.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Some(Compression::Xz)
        } else if header.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Some(Compression::Zstd)
        } else {
            None
        }
    }

    fn from_suffix(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.ends_with(".gz") || name.ends_with(".tgz") {
            Compression::Gzip
        } else if name.ends_with(".bz2") || name.ends_with(".tbz") || name.ends_with(".tbz2") {
            Compression::Bzip2
        } else if name.ends_with(".xz") || name.ends_with(".txz") {
            Compression::Xz
        } else if name.ends_with(".zst") || name.ends_with(".tzst") {
            Compression::Zstd
        } else {
            Compression::None
        }
    }
}

/// `BZh`, a block size digit, then the first block's `1AY&SY` marker.
fn is_bzip2_header(header: &[u8]) -> bool {
    header.len() >= 10
        && header.starts_with(b"BZh")
        && (b'1'..=b'9').contains(&header[3])
        && &header[4..10] == b"1AY&SY"
}

/// Codecs to try, most likely first, without repeats.
fn candidates(header: &[u8], path: &Path) -> Vec<Compression> {
    let mut order = Vec::with_capacity(3);
    let sniffed = Compression::from_magic(header);
    for c in [sniffed, Some(Compression::from_suffix(path)), Some(Compression::None)]
        .into_iter()
        .flatten()
    {
        if !order.contains(&c) {
            order.push(c);
        }
    }
    // A header that decodes as nothing in particular is most likely plain tar.
    if sniffed.is_none() && header.len() as u64 >= MAGIC_LEN {
        order.retain(|c| *c != Compression::None);
        order.insert(0, Compression::None);
    }
    order
}

fn read_header(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| ArtdexError::Io {
        message: format!("Failed to open tarball: {}", e),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;
    let mut header = Vec::with_capacity(MAGIC_LEN as usize);
    file.take(MAGIC_LEN)
        .read_to_end(&mut header)
        .map_err(|e| ArtdexError::io_with_path(e, path))?;
    Ok(header)
}

fn open(path: &Path, compression: Compression) -> Result<tar::Archive<Box<dyn Read>>> {
    let file = File::open(path).map_err(|e| ArtdexError::io_with_path(e, path))?;
    let reader = BufReader::new(file);
    let stream: Box<dyn Read> = match compression {
        Compression::None => Box::new(reader),
        Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
        Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
        Compression::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
        Compression::Zstd => Box::new(zstd::stream::Decoder::with_buffer(reader).map_err(|e| {
            ArtdexError::Archive {
                message: format!("Failed to create zstd decoder: {}", e),
            }
        })?),
    };
    Ok(tar::Archive::new(stream))
}

/// Run `read` over the archive with each candidate codec until one reads the
/// whole stream. A missing member is a definite answer and is not retried.
fn with_archive<T>(
    path: &Path,
    mut read: impl FnMut(&mut tar::Archive<Box<dyn Read>>) -> Result<T>,
) -> Result<T> {
    let header = read_header(path)?;
    let mut first_error = None;

    for compression in candidates(&header, path) {
        debug!("Opening {} as {:?} tar", path.display(), compression);
        let attempt = open(path, compression).and_then(|mut archive| read(&mut archive));
        match attempt {
            Ok(value) => return Ok(value),
            Err(e @ ArtdexError::ArchiveEntryNotFound { .. }) => return Err(e),
            Err(e) => {
                warn!("Reading {} as {:?} failed: {}", path.display(), compression, e);
                first_error.get_or_insert(e);
            }
        }
    }

    Err(first_error.unwrap_or_else(|| ArtdexError::Archive {
        message: format!("No codec could read {}", path.display()),
    }))
}

fn tar_error(path: &Path, e: std::io::Error) -> ArtdexError {
    ArtdexError::Archive {
        message: format!("Failed to read tarball {}: {}", path.display(), e),
    }
}

/// Media members of a tar archive in archive order.
///
/// A stream that breaks part way through under every codec fails the whole
/// archive; partial listings are not returned.
pub fn scan_tar(path: &Path) -> Result<Vec<ScanEntry>> {
    let source_path = canonical_source_path(path)?;

    let entries = with_archive(path, |archive| {
        let mut entries = Vec::new();
        for member in archive.entries().map_err(|e| tar_error(path, e))? {
            let member = member.map_err(|e| tar_error(path, e))?;
            let header = member.header();
            if !header.entry_type().is_file() {
                continue;
            }

            let inner_path = String::from_utf8_lossy(&member.path_bytes()).into_owned();
            if !MediaConfig::is_media(&inner_path) {
                continue;
            }

            let date = header.mtime().map(|m| m as f64).unwrap_or(0.0);
            entries.push(ScanEntry::archived(
                SourceType::Tar,
                source_path.as_str(),
                inner_path,
                date,
            ));
        }
        Ok(entries)
    })?;

    debug!("Found {} media entries in {}", entries.len(), path.display());
    Ok(entries)
}

/// Bytes of the regular-file member named `inner_path`.
pub fn read_tar_entry(path: &Path, inner_path: &str) -> Result<Vec<u8>> {
    with_archive(path, |archive| {
        for member in archive.entries().map_err(|e| tar_error(path, e))? {
            let mut member = member.map_err(|e| tar_error(path, e))?;
            if !member.header().entry_type().is_file() {
                continue;
            }
            if String::from_utf8_lossy(&member.path_bytes()) != inner_path {
                continue;
            }

            let mut data = Vec::new();
            member
                .read_to_end(&mut data)
                .map_err(|e| tar_error(path, e))?;
            return Ok(data);
        }

        Err(ArtdexError::ArchiveEntryNotFound {
            archive: path.to_path_buf(),
            inner_path: inner_path.to_string(),
        })
    })
}
