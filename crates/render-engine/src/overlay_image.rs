//! Overlay image resolution.

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use reelsmith_common::error::{ReelError, ReelResult};
use reelsmith_project_model::artifact::{OUTPUT_HEIGHT, OUTPUT_WIDTH};
use reelsmith_project_model::workspace::RunDir;

/// The overlay image a run composites, and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOverlay {
    pub path: PathBuf,
    /// Whether a transparent placeholder was generated.
    pub generated: bool,
}

/// Use `configured` when it exists, otherwise write a fully transparent
/// placeholder into the run's scratch directory.
pub fn resolve_overlay_image(configured: &Path, run: &RunDir) -> ReelResult<ResolvedOverlay> {
    if configured.is_file() {
        let path = if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            std::env::current_dir()?.join(configured)
        };
        return Ok(ResolvedOverlay {
            path,
            generated: false,
        });
    }

    let path = run.generated_overlay_path();
    write_transparent_png(&path, OUTPUT_WIDTH, OUTPUT_HEIGHT)?;
    tracing::warn!(
        configured = %configured.display(),
        generated = %path.display(),
        "Overlay image not found, using a transparent placeholder"
    );
    Ok(ResolvedOverlay {
        path,
        generated: true,
    })
}

fn write_transparent_png(path: &Path, width: u32, height: u32) -> ReelResult<()> {
    // New RGBA buffers are zeroed, i.e. fully transparent.
    RgbaImage::new(width, height)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| ReelError::file_io(path, std::io::Error::other(e)))
}
