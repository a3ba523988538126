//! Final muxing and promotion of the deliverable.

use std::path::Path;

use reelsmith_common::config::EngineConfig;
use reelsmith_common::error::{ReelError, ReelResult};
use reelsmith_project_model::artifact::FinalArtifact;

use crate::engine::{EngineCommand, MediaEngine};
use crate::renderer::require_output;

/// Encoder settings for the external audio track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEncoding {
    pub codec: String,
    pub bitrate_kbps: u32,
}

impl Default for AudioEncoding {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl AudioEncoding {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            codec: config.audio_codec.clone(),
            bitrate_kbps: config.audio_bitrate_kbps,
        }
    }
}

pub struct Muxer<'a> {
    engine: &'a dyn MediaEngine,
    audio: AudioEncoding,
}

impl<'a> Muxer<'a> {
    pub fn new(engine: &'a dyn MediaEngine, audio: AudioEncoding) -> Self {
        Self { engine, audio }
    }

    /// Video stream copied, audio re-encoded, cut to the shorter stream.
    pub fn build_command(&self, video: &Path, audio: &Path, output: &Path) -> EngineCommand {
        EngineCommand::new("mux", output)
            .arg("-i")
            .path_arg(video)
            .arg("-i")
            .path_arg(audio)
            .args(["-map", "0:v", "-map", "1:a", "-c:v", "copy"])
            .args([
                "-c:a".to_string(),
                self.audio.codec.clone(),
                "-b:a".to_string(),
                format!("{}k", self.audio.bitrate_kbps),
            ])
            .arg("-shortest")
    }

    /// Mux `video` with `audio` into `staging`, then promote it to
    /// `final_path`.
    pub fn mux(
        &self,
        video: &Path,
        audio: &Path,
        staging: &Path,
        final_path: &Path,
    ) -> ReelResult<FinalArtifact> {
        tracing::info!(video = %video.display(), audio = %audio.display(), "Muxing audio track");
        self.engine
            .transcode(&self.build_command(video, audio, staging))?;
        require_output(staging, "ffmpeg mux")?;
        promote(staging, final_path, true)
    }

    /// Publish a video-only deliverable without invoking the engine.
    pub fn finalize_video_only(
        &self,
        video: &Path,
        final_path: &Path,
    ) -> ReelResult<FinalArtifact> {
        tracing::info!(video = %video.display(), "No audio track, publishing video as is");
        promote(video, final_path, false)
    }
}

/// Move `from` to `to`, falling back to copy and remove across devices.
///
/// A failed copy never leaves a partial file at `to`.
pub fn promote(from: &Path, to: &Path, has_audio: bool) -> ReelResult<FinalArtifact> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ReelError::file_io(parent, e))?;
    }

    if let Err(rename_err) = std::fs::rename(from, to) {
        tracing::debug!(error = %rename_err, "Rename failed, copying deliverable instead");
        if let Err(e) = std::fs::copy(from, to) {
            let _ = std::fs::remove_file(to);
            return Err(ReelError::file_io(to, e));
        }
        if let Err(e) = std::fs::remove_file(from) {
            tracing::warn!(path = %from.display(), error = %e, "Failed to remove promoted source");
        }
    }

    FinalArtifact::from_path(to, has_audio).map_err(|e| ReelError::file_io(to, e))
}
