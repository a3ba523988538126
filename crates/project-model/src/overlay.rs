//! Overlay graphic and burn-in text for a run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The four free-form text fields supplied by the input provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayText {
    pub heading: String,
    pub line_1: String,
    pub line_2: String,
    pub date: String,
}

impl Default for OverlayText {
    fn default() -> Self {
        Self {
            heading: "HELLO".to_string(),
            line_1: "Name".to_string(),
            line_2: "Place".to_string(),
            date: "2026".to_string(),
        }
    }
}

/// Everything the compositor needs to decorate a clip. Immutable per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySpec {
    pub heading: String,
    pub line_1: String,
    pub line_2: String,
    pub date: String,

    /// Resolved font file. `None` means the engine's built-in default.
    pub font: Option<PathBuf>,

    /// Overlay image composited over the scaled clip.
    pub image: PathBuf,
}

impl OverlaySpec {
    pub fn new(text: OverlayText, font: Option<PathBuf>, image: impl Into<PathBuf>) -> Self {
        Self {
            heading: text.heading,
            line_1: text.line_1,
            line_2: text.line_2,
            date: text.date,
            font,
            image: image.into(),
        }
    }

    pub fn font(&self) -> Option<&Path> {
        self.font.as_deref()
    }
}
