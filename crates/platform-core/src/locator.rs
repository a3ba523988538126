//! Font and engine binary resolution.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Fonts tried in order when no explicit font is configured.
pub const DEFAULT_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Arial.ttf",
];

/// External engine programs the pipeline invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineTool {
    /// Renders, concatenates, loops and muxes.
    Transcoder,
    /// Reports container durations.
    Prober,
}

impl EngineTool {
    /// Executable name searched on `PATH`.
    pub fn binary_name(self) -> &'static str {
        match self {
            Self::Transcoder => "ffmpeg",
            Self::Prober => "ffprobe",
        }
    }
}

/// Resolves resources the pipeline needs from its host.
pub trait ResourceLocator: Send + Sync {
    /// A usable font file, or `None` when none could be found.
    fn locate_font(&self) -> Option<PathBuf>;

    /// Absolute path of an engine binary, or `None` when unavailable.
    fn locate_engine(&self, tool: EngineTool) -> Option<PathBuf>;
}

/// Looks resources up on the local filesystem and `PATH`.
#[derive(Debug, Clone)]
pub struct SystemLocator {
    font_override: Option<PathBuf>,
    font_candidates: Vec<PathBuf>,
    transcoder_override: Option<PathBuf>,
    prober_override: Option<PathBuf>,
    search_path: Option<OsString>,
}

impl Default for SystemLocator {
    fn default() -> Self {
        Self {
            font_override: None,
            font_candidates: DEFAULT_FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
            transcoder_override: None,
            prober_override: None,
            search_path: None,
        }
    }
}

impl SystemLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer `font` over the candidate list when it exists.
    pub fn with_font(mut self, font: Option<PathBuf>) -> Self {
        self.font_override = font;
        self
    }

    /// Replace the candidate font list.
    pub fn with_font_candidates(mut self, candidates: Vec<PathBuf>) -> Self {
        self.font_candidates = candidates;
        self
    }

    /// Use an explicit binary for `tool` instead of searching `PATH`.
    pub fn with_engine(mut self, tool: EngineTool, path: Option<PathBuf>) -> Self {
        match tool {
            EngineTool::Transcoder => self.transcoder_override = path,
            EngineTool::Prober => self.prober_override = path,
        }
        self
    }

    /// Search this value instead of the process `PATH`.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    fn engine_override(&self, tool: EngineTool) -> Option<&Path> {
        match tool {
            EngineTool::Transcoder => self.transcoder_override.as_deref(),
            EngineTool::Prober => self.prober_override.as_deref(),
        }
    }
}

impl ResourceLocator for SystemLocator {
    fn locate_font(&self) -> Option<PathBuf> {
        if let Some(font) = &self.font_override {
            if font.is_file() {
                return Some(absolute(font));
            }
            tracing::warn!(font = %font.display(), "Configured font not found, trying defaults");
        }

        self.font_candidates
            .iter()
            .find(|candidate| candidate.is_file())
            .map(|font| absolute(font))
    }

    fn locate_engine(&self, tool: EngineTool) -> Option<PathBuf> {
        if let Some(path) = self.engine_override(tool) {
            if path.is_file() {
                return Some(absolute(path));
            }
            // A bare name such as "ffmpeg-6" is looked up on PATH.
            if path.components().count() == 1 {
                return find_in_path(&path.to_string_lossy(), self.search_path.clone());
            }
            tracing::warn!(
                tool = tool.binary_name(),
                path = %path.display(),
                "Configured engine binary not found"
            );
            return None;
        }

        find_in_path(tool.binary_name(), self.search_path.clone())
    }
}

/// A locator with fixed answers, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedLocator {
    pub font: Option<PathBuf>,
    pub transcoder: Option<PathBuf>,
    pub prober: Option<PathBuf>,
}

impl ResourceLocator for FixedLocator {
    fn locate_font(&self) -> Option<PathBuf> {
        self.font.clone()
    }

    fn locate_engine(&self, tool: EngineTool) -> Option<PathBuf> {
        match tool {
            EngineTool::Transcoder => self.transcoder.clone(),
            EngineTool::Prober => self.prober.clone(),
        }
    }
}

/// Find `binary` in the directories of `search_path` (or `PATH`).
pub fn find_in_path(binary: &str, search_path: Option<OsString>) -> Option<PathBuf> {
    let search_path = search_path.or_else(|| std::env::var_os("PATH"))?;
    std::env::split_paths(&search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| executable_names(binary).map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
        .map(|found| absolute(&found))
}

fn executable_names(binary: &str) -> impl Iterator<Item = String> {
    let exe = if cfg!(windows) && !binary.ends_with(".exe") {
        Some(format!("{binary}.exe"))
    } else {
        None
    };
    std::iter::once(binary.to_string()).chain(exe)
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
