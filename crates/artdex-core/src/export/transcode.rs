//! Video to animated image transcoding.

use crate::config::TranscodeConfig;
use crate::{ArtdexError, Result};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, warn};

/// Converts one video file into an animated image.
///
/// Implementations either write `dst` or return an error. Leaving `dst`
/// behind on error is allowed; the export pass treats any existing output
/// as success.
pub trait Transcoder {
    fn transcode(&self, src: &Path, dst: &Path) -> Result<()>;
}

/// Transcoder backed by the `ffmpeg` executable.
///
/// Uses a two-pass palette pipeline (12 fps, scaled to 720 px wide) and
/// falls back to a plain conversion when either pass fails. Without an
/// `ffmpeg` on `PATH` it writes an empty placeholder so the export pass can
/// continue.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTranscoder {
    tool: Option<PathBuf>,
}

impl FfmpegTranscoder {
    /// Locate `ffmpeg` on `PATH`.
    pub fn new() -> Self {
        let tool = find_on_path(TranscodeConfig::TOOL);
        match &tool {
            Some(path) => debug!("Using {} for transcoding", path.display()),
            None => warn!(
                "{} not found on PATH; videos export as placeholders",
                TranscodeConfig::TOOL
            ),
        }
        Self { tool }
    }

    /// Use a specific executable, or none at all.
    pub fn with_tool(tool: Option<PathBuf>) -> Self {
        Self { tool }
    }

    pub fn is_available(&self) -> bool {
        self.tool.is_some()
    }

    fn run(&self, tool: &Path, args: &[&OsStr]) -> Result<()> {
        let output: Output = Command::new(tool)
            .args(args)
            .output()
            .map_err(|e| ArtdexError::TranscodeFailed {
                message: format!("failed to execute {}: {}", tool.display(), e),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("{} stderr: {}", tool.display(), stderr.trim());
            Err(ArtdexError::TranscodeFailed {
                message: format!("{} exited with {}", tool.display(), output.status),
            })
        }
    }

    fn palette_pipeline(&self, tool: &Path, src: &Path, dst: &Path, palette: &Path) -> Result<()> {
        let scale = format!(
            "fps={},scale={}:-1:flags=lanczos",
            TranscodeConfig::FPS,
            TranscodeConfig::MAX_WIDTH
        );
        let palettegen = format!("{},palettegen", scale);
        let paletteuse = format!("{} [x]; [x][1:v] paletteuse", scale);

        self.run(
            tool,
            &[
                OsStr::new("-y"),
                OsStr::new("-i"),
                src.as_os_str(),
                OsStr::new("-vf"),
                OsStr::new(&palettegen),
                palette.as_os_str(),
            ],
        )?;
        self.run(
            tool,
            &[
                OsStr::new("-y"),
                OsStr::new("-i"),
                src.as_os_str(),
                OsStr::new("-i"),
                palette.as_os_str(),
                OsStr::new("-lavfi"),
                OsStr::new(&paletteuse),
                dst.as_os_str(),
            ],
        )
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, src: &Path, dst: &Path) -> Result<()> {
        let Some(tool) = &self.tool else {
            let missing = ArtdexError::TranscodeUnavailable {
                tool: TranscodeConfig::TOOL.to_string(),
            };
            warn!("{}; writing empty placeholder {}", missing, dst.display());
            fs::write(dst, b"").map_err(|e| ArtdexError::io_with_path(e, dst))?;
            return Ok(());
        };

        let palette = dst.with_extension(TranscodeConfig::PALETTE_SUFFIX);
        let result = match self.palette_pipeline(tool, src, dst, &palette) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Palette transcode of {} failed ({}); retrying plain", src.display(), e);
                let fps = TranscodeConfig::FPS.to_string();
                self.run(
                    tool,
                    &[
                        OsStr::new("-y"),
                        OsStr::new("-i"),
                        src.as_os_str(),
                        OsStr::new("-r"),
                        OsStr::new(&fps),
                        dst.as_os_str(),
                    ],
                )
            }
        };

        if palette.exists() {
            if let Err(e) = fs::remove_file(&palette) {
                debug!("Could not remove palette {}: {}", palette.display(), e);
            }
        }
        result
    }
}

/// First executable named `name` on `PATH`.
fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths).find_map(|dir| {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = dir.join(format!("{}.exe", name));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}
