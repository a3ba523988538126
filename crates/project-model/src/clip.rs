//! Source clips and their deterministic ordering.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One raw input clip discovered in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipSource {
    /// Absolute path to the clip.
    pub path: PathBuf,

    /// First integer embedded in the file name, extension included (0 when
    /// there is none).
    pub ordinal: u64,

    /// Position in the directory enumeration, used to break ordinal ties.
    pub enumeration_index: usize,
}

impl ClipSource {
    pub fn new(path: impl Into<PathBuf>, enumeration_index: usize) -> Self {
        let path = path.into();
        let ordinal = path
            .file_name()
            .map(|name| extract_ordinal(&name.to_string_lossy()))
            .unwrap_or(0);
        Self {
            path,
            ordinal,
            enumeration_index,
        }
    }

    /// File name for logs and reports.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Extract the first run of ASCII digits in `name`.
///
/// The whole name is scanned, so `source.mp4` yields 4. Names without digits
/// map to 0. Runs too large for `u64` saturate.
pub fn extract_ordinal(name: &str) -> u64 {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return 0;
    }

    digits.chars().fold(0u64, |acc, c| {
        acc.saturating_mul(10)
            .saturating_add(u64::from(c as u8 - b'0'))
    })
}

/// Stable sort by ordinal, ties resolved by enumeration order.
pub fn sort_clips(clips: &mut [ClipSource]) {
    clips.sort_by_key(|clip| (clip.ordinal, clip.enumeration_index));
}
