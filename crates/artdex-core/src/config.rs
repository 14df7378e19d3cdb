//! Centralized configuration for the artdex engine.
//!
//! File names, extension tables, and tuning constants shared by the scanner,
//! the stores, and the export pass.

/// Catalog document names, relative to the catalog directory.
pub struct PathsConfig;

impl PathsConfig {
    pub const METADATA_FILENAME: &'static str = "artlist.json";
    pub const LEGACY_METADATA_FILENAME: &'static str = "artlist.txt";
    pub const REGISTRY_FILENAME: &'static str = "archives.json";
}

/// Media recognition.
pub struct MediaConfig;

impl MediaConfig {
    /// Extensions (lowercase, without the dot) that count as artwork.
    pub const EXTENSIONS: &'static [&'static str] = &[
        "png", "jpg", "jpeg", "gif", "webp", "bmp", "tiff", "svg", "avif", "mp4",
    ];

    /// Extensions that must be transcoded to an animated image on export.
    pub const VIDEO_EXTENSIONS: &'static [&'static str] = &["mp4"];

    /// Extension of transcoded output.
    pub const ANIMATED_EXTENSION: &'static str = "gif";

    /// Whether a file name carries a supported media extension.
    pub fn is_media(name: &str) -> bool {
        extension_lower(name).is_some_and(|ext| Self::EXTENSIONS.contains(&ext.as_str()))
    }

    /// Whether a file name is a video that needs transcoding.
    pub fn is_video(name: &str) -> bool {
        extension_lower(name).is_some_and(|ext| Self::VIDEO_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// Archive recognition.
pub struct ArchiveConfig;

impl ArchiveConfig {
    pub const ZIP_SUFFIXES: &'static [&'static str] = &[".zip"];

    pub const TAR_SUFFIXES: &'static [&'static str] = &[
        ".tar", ".tgz", ".tar.gz", ".tar.bz2", ".tbz", ".tbz2", ".txz", ".tar.xz", ".tar.zst",
        ".tzst",
    ];
}

/// Ordering constants.
pub struct OrderConfig;

impl OrderConfig {
    /// Sort key for records without a usable persisted id.
    pub const UNASSIGNED_ID: u64 = 1_000_000_000;
}

/// Parameters for the default ffmpeg transcoder.
pub struct TranscodeConfig;

impl TranscodeConfig {
    pub const TOOL: &'static str = "ffmpeg";
    pub const FPS: u32 = 12;
    pub const MAX_WIDTH: u32 = 720;
    pub const PALETTE_SUFFIX: &'static str = "palette.png";
}

/// Lowercased extension of a file name, without the dot.
fn extension_lower(name: &str) -> Option<String> {
    std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}
