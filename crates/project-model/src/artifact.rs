//! Files produced while a run progresses.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::clip::ClipSource;
use crate::overlay::OverlaySpec;

/// Fixed output geometry of every rendered part.
pub const OUTPUT_WIDTH: u32 = 1280;
pub const OUTPUT_HEIGHT: u32 = 720;

/// One clip's composite render: input clip, decoration, destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    /// Position of the clip in pipeline order.
    pub index: usize,
    pub clip: ClipSource,
    pub overlay: OverlaySpec,
    pub output: PathBuf,
}

/// A rendered, normalized clip with its original audio stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartFile {
    pub index: usize,
    pub path: PathBuf,
}

/// All parts concatenated by stream copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledVideo {
    pub path: PathBuf,
    pub part_count: usize,
}

/// The single deliverable of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub has_audio: bool,
}

impl FinalArtifact {
    /// Stat `path` and describe it as the deliverable.
    pub fn from_path(path: impl Into<PathBuf>, has_audio: bool) -> std::io::Result<Self> {
        let path = path.into();
        let size_bytes = std::fs::metadata(&path)?.len();
        Ok(Self {
            path,
            size_bytes,
            has_audio,
        })
    }

    pub fn size_mib(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}
