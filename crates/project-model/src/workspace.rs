//! On-disk layout of a working root.
//!
//! ```text
//! <root>/
//! ├── video/source1.mp4 …     (input clips)
//! ├── audio/voice.mp3         (optional audio track)
//! ├── runs/<run-id>/          (scratch owned by one run)
//! │   ├── temp_parts/part_000.mp4 …
//! │   ├── list.txt
//! │   ├── medium.mp4
//! │   └── silent.mp4
//! └── youtube_ready.mp4       (deliverable)
//! ```
//!
//! Inputs and the deliverable are shared by every run against the root.
//! Temporary state lives in a fresh `runs/<run-id>/` directory per run, so
//! concurrent runs never clobber each other's intermediates.

use std::path::{Path, PathBuf};

use reelsmith_common::error::{ReelError, ReelResult};

pub const VIDEO_DIR: &str = "video";
pub const AUDIO_DIR: &str = "audio";
pub const RUNS_DIR: &str = "runs";
pub const CLIP_PREFIX: &str = "source";
pub const CLIP_EXTENSION: &str = "mp4";
pub const AUDIO_FILE: &str = "voice.mp3";
pub const DEFAULT_FINAL_NAME: &str = "youtube_ready.mp4";

const PARTS_DIR: &str = "temp_parts";
const MANIFEST_FILE: &str = "list.txt";
const ASSEMBLED_FILE: &str = "medium.mp4";
const LOOPED_FILE: &str = "silent.mp4";
const MUXED_FILE: &str = "final.mp4";
const GENERATED_OVERLAY_FILE: &str = "overlay.png";
const REPORT_EXTENSION: &str = "report.json";

/// Attempts at allocating a run directory while `runs/` keeps vanishing.
const RUN_DIR_ATTEMPTS: u32 = 64;

/// A working root and the paths derived from it.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    final_name: String,
}

impl Workspace {
    /// Open a working root. Relative paths are anchored at the current
    /// directory so every engine argument is absolute.
    pub fn new(root: impl AsRef<Path>, final_name: impl Into<String>) -> ReelResult<Self> {
        let root = root.as_ref();
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };
        Ok(Self {
            root,
            final_name: final_name.into(),
        })
    }

    pub fn open(root: impl AsRef<Path>) -> ReelResult<Self> {
        Self::new(root, DEFAULT_FINAL_NAME)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn video_dir(&self) -> PathBuf {
        self.root.join(VIDEO_DIR)
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root.join(AUDIO_DIR)
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.root.join(RUNS_DIR)
    }

    pub fn audio_track_path(&self) -> PathBuf {
        self.audio_dir().join(AUDIO_FILE)
    }

    pub fn final_path(&self) -> PathBuf {
        self.root.join(&self.final_name)
    }

    /// Create the input directories. Idempotent.
    pub fn init(&self) -> ReelResult<()> {
        for dir in [self.video_dir(), self.audio_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| ReelError::file_io(&dir, e))?;
        }
        Ok(())
    }

    /// The optional audio track, if one has been supplied.
    pub fn audio_track(&self) -> Option<PathBuf> {
        let path = self.audio_track_path();
        path.is_file().then_some(path)
    }

    /// Replace the clip batch with `clips`, persisted as
    /// `source1.mp4 … sourceN.mp4` in the given order.
    pub fn ingest_clips<B: AsRef<[u8]>>(&self, clips: &[B]) -> ReelResult<Vec<PathBuf>> {
        self.init()?;
        let removed = self.clear_clips()?;
        if removed > 0 {
            tracing::debug!(removed, "Cleared previous clip batch");
        }

        let video_dir = self.video_dir();
        let mut written = Vec::with_capacity(clips.len());
        for (i, bytes) in clips.iter().enumerate() {
            let path = video_dir.join(format!("{CLIP_PREFIX}{}.{CLIP_EXTENSION}", i + 1));
            std::fs::write(&path, bytes.as_ref()).map_err(|e| ReelError::file_io(&path, e))?;
            written.push(path);
        }

        tracing::info!(clips = written.len(), dir = %video_dir.display(), "Ingested clips");
        Ok(written)
    }

    /// Remove every file in `video/`. Returns how many were removed.
    pub fn clear_clips(&self) -> ReelResult<usize> {
        let video_dir = self.video_dir();
        if !video_dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        let entries = std::fs::read_dir(&video_dir).map_err(|e| ReelError::file_io(&video_dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| ReelError::file_io(&video_dir, e))?.path();
            if path.is_file() {
                std::fs::remove_file(&path).map_err(|e| ReelError::file_io(&path, e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Store the audio track, replacing any previous one.
    pub fn ingest_audio(&self, bytes: &[u8]) -> ReelResult<PathBuf> {
        self.init()?;
        let path = self.audio_track_path();
        std::fs::write(&path, bytes).map_err(|e| ReelError::file_io(&path, e))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Ingested audio track");
        Ok(path)
    }

    /// Drop the audio track. Returns whether one existed.
    pub fn clear_audio(&self) -> ReelResult<bool> {
        let path = self.audio_track_path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ReelError::file_io(&path, e)),
        }
    }

    /// Run report written next to the deliverable.
    pub fn report_path(&self) -> PathBuf {
        self.final_path().with_extension(REPORT_EXTENSION)
    }

    /// Delete the deliverable and run report left by an earlier run.
    ///
    /// Returns whether a deliverable was removed.
    pub fn remove_stale_final(&self) -> ReelResult<bool> {
        let removed = remove_if_present(&self.final_path())?;
        remove_if_present(&self.report_path())?;
        Ok(removed)
    }

    /// Allocate a fresh scratch directory for one run.
    ///
    /// A finishing run may remove the empty `runs/` directory at any time,
    /// so it is recreated whenever the new run directory has no parent.
    pub fn create_run(&self) -> ReelResult<RunDir> {
        let runs_dir = self.runs_dir();
        let stamp = chrono::Local::now().format("%Y%m%dT%H%M%S%3f");
        let pid = std::process::id();

        let mut suffix = 0u32;
        let mut missing_parent = 0u32;
        loop {
            std::fs::create_dir_all(&runs_dir).map_err(|e| ReelError::file_io(&runs_dir, e))?;

            let id = if suffix == 0 {
                format!("run-{stamp}-{pid}")
            } else {
                format!("run-{stamp}-{pid}-{suffix}")
            };
            let root = runs_dir.join(&id);
            match std::fs::create_dir(&root) {
                Ok(()) => {
                    let parts = root.join(PARTS_DIR);
                    std::fs::create_dir(&parts).map_err(|e| ReelError::file_io(&parts, e))?;
                    return Ok(RunDir { id, root });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e)
                    if e.kind() == std::io::ErrorKind::NotFound
                        && missing_parent + 1 < RUN_DIR_ATTEMPTS =>
                {
                    missing_parent += 1;
                    tracing::debug!(
                        runs = %runs_dir.display(),
                        "runs directory vanished, recreating"
                    );
                }
                Err(e) => return Err(ReelError::file_io(&root, e)),
            }
        }
    }
}

fn remove_if_present(path: &Path) -> ReelResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ReelError::file_io(path, e)),
    }
}

/// Scratch directory owned by a single run.
#[derive(Debug, Clone)]
pub struct RunDir {
    id: String,
    root: PathBuf,
}

impl RunDir {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn parts_dir(&self) -> PathBuf {
        self.root.join(PARTS_DIR)
    }

    /// Destination of the `index`-th rendered part.
    pub fn part_path(&self, index: usize) -> PathBuf {
        self.parts_dir().join(format!("part_{index:03}.{CLIP_EXTENSION}"))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn assembled_path(&self) -> PathBuf {
        self.root.join(ASSEMBLED_FILE)
    }

    pub fn looped_path(&self) -> PathBuf {
        self.root.join(LOOPED_FILE)
    }

    /// Where the muxer writes before the result is promoted.
    pub fn muxed_path(&self) -> PathBuf {
        self.root.join(MUXED_FILE)
    }

    pub fn generated_overlay_path(&self) -> PathBuf {
        self.root.join(GENERATED_OVERLAY_FILE)
    }

    /// Delete the whole scratch directory.
    pub fn remove(&self) -> std::io::Result<()> {
        match std::fs::remove_dir_all(&self.root) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
