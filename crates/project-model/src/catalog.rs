//! Clip discovery.

use std::path::Path;

use reelsmith_common::error::{ReelError, ReelResult};

use crate::clip::{sort_clips, ClipSource};
use crate::workspace::{CLIP_EXTENSION, CLIP_PREFIX};

/// Finds the input clips of a run and puts them in pipeline order.
#[derive(Debug, Clone)]
pub struct ClipCatalog {
    prefix: String,
    extension: String,
}

impl Default for ClipCatalog {
    fn default() -> Self {
        Self::new(CLIP_PREFIX, CLIP_EXTENSION)
    }
}

impl ClipCatalog {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    /// Whether `file_name` is an input clip (`<prefix>*.<extension>`).
    pub fn matches(&self, file_name: &str) -> bool {
        let suffix = format!(".{}", self.extension);
        file_name.starts_with(&self.prefix) && file_name.ends_with(&suffix)
    }

    /// Scan `directory` and return its clips ordered by numeric ordinal.
    ///
    /// The directory is created when missing. An empty result is a
    /// [`ReelError::NoInput`].
    pub fn discover(&self, directory: &Path) -> ReelResult<Vec<ClipSource>> {
        std::fs::create_dir_all(directory).map_err(|e| ReelError::file_io(directory, e))?;
        let directory = if directory.is_absolute() {
            directory.to_path_buf()
        } else {
            std::env::current_dir()?.join(directory)
        };

        let entries =
            std::fs::read_dir(&directory).map_err(|e| ReelError::file_io(&directory, e))?;

        let mut clips = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ReelError::file_io(&directory, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                tracing::warn!(name = ?entry.file_name(), "Skipping clip with non UTF-8 name");
                continue;
            };
            if !self.matches(name) {
                continue;
            }
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            clips.push(ClipSource::new(path, clips.len()));
        }

        if clips.is_empty() {
            return Err(ReelError::no_input(directory));
        }

        sort_clips(&mut clips);
        tracing::info!(
            clips = clips.len(),
            dir = %directory.display(),
            order = ?clips.iter().map(ClipSource::file_name).collect::<Vec<_>>(),
            "Discovered clips"
        );
        Ok(clips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"clip").unwrap();
    }

    #[test]
    fn test_discover_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["source10.mp4", "source2.mp4", "source1.mp4"] {
            touch(dir.path(), name);
        }

        let clips = ClipCatalog::default().discover(dir.path()).unwrap();
        let names: Vec<_> = clips.iter().map(ClipSource::file_name).collect();
        assert_eq!(names, ["source1.mp4", "source2.mp4", "source10.mp4"]);
        assert!(clips.iter().all(|c| c.path.is_absolute()));
    }

    #[test]
    fn test_discover_ignores_non_matching_entries() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "source1.mp4");
        touch(dir.path(), "source2.mov");
        touch(dir.path(), "clip3.mp4");
        std::fs::create_dir(dir.path().join("source4.mp4")).unwrap();

        let clips = ClipCatalog::default().discover(dir.path()).unwrap();
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].ordinal, 1);
    }

    #[test]
    fn test_discover_extension_digit_counts_as_ordinal() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "source5.mp4");
        touch(dir.path(), "source3.mp4");
        touch(dir.path(), "source.mp4");

        let clips = ClipCatalog::default().discover(dir.path()).unwrap();
        let names: Vec<_> = clips.iter().map(ClipSource::file_name).collect();
        assert_eq!(names, ["source3.mp4", "source.mp4", "source5.mp4"]);
        assert_eq!(clips[1].ordinal, 4);
    }

    #[test]
    fn test_empty_directory_is_no_input_and_created() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("video");

        let err = ClipCatalog::default().discover(&video).unwrap_err();
        assert!(matches!(err, ReelError::NoInput { .. }));
        assert!(video.is_dir());

        let err = ClipCatalog::default().discover(&video).unwrap_err();
        assert!(matches!(err, ReelError::NoInput { .. }));
    }
}
