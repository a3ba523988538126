//! Audio duration matching.
//!
//! When the audio track outlasts the assembled video, the video is repeated
//! by stream copy until it covers the audio. The muxer then cuts both to the
//! shorter stream.

use std::path::{Path, PathBuf};

use reelsmith_common::config::ProbeFailurePolicy;
use reelsmith_common::error::{ReelError, ReelResult};
use reelsmith_project_model::plan::LoopPlan;

use crate::engine::{EngineCommand, MediaEngine};
use crate::renderer::require_output;

pub struct AudioDurationMatcher<'a> {
    engine: &'a dyn MediaEngine,
    policy: ProbeFailurePolicy,
}

impl<'a> AudioDurationMatcher<'a> {
    pub fn new(engine: &'a dyn MediaEngine, policy: ProbeFailurePolicy) -> Self {
        Self { engine, policy }
    }

    /// Probe both files and decide how often the video must play.
    pub fn plan(&self, audio: &Path, video: &Path) -> ReelResult<LoopPlan> {
        let audio_secs = self.engine.probe_duration(audio);
        let video_secs = self.engine.probe_duration(video);

        let plan = match (audio_secs, video_secs) {
            (Ok(a), Ok(v)) => LoopPlan::from_durations(a, v),
            (Err(e), v) => self.fallback(e, None, v.ok())?,
            (Ok(a), Err(e)) => self.fallback(e, Some(a), None)?,
        };

        tracing::info!(
            audio_secs = ?plan.audio_secs,
            video_secs = ?plan.video_secs,
            loop_count = plan.loop_count,
            "Planned audio match"
        );
        Ok(plan)
    }

    fn fallback(
        &self,
        error: ReelError,
        audio_secs: Option<f64>,
        video_secs: Option<f64>,
    ) -> ReelResult<LoopPlan> {
        if self.policy == ProbeFailurePolicy::Abort {
            return Err(error);
        }
        tracing::warn!(error = %error, "Duration probe failed, playing video once");
        Ok(LoopPlan::single_play(audio_secs, video_secs, error.to_string()))
    }

    pub fn build_loop_command(plan: &LoopPlan, video: &Path, output: &Path) -> EngineCommand {
        EngineCommand::new("loop", output)
            .args(["-stream_loop".to_string(), plan.extra_repeats().to_string()])
            .arg("-i")
            .path_arg(video)
            .args(["-c", "copy"])
    }

    /// Produce the duration-matched video at `output`.
    ///
    /// A single play is a plain file copy.
    pub fn apply(&self, plan: &LoopPlan, video: &Path, output: &Path) -> ReelResult<PathBuf> {
        if plan.needs_engine_loop() {
            self.engine
                .transcode(&Self::build_loop_command(plan, video, output))?;
            require_output(output, "ffmpeg loop")?;
        } else {
            std::fs::copy(video, output).map_err(|e| ReelError::file_io(output, e))?;
        }
        Ok(output.to_path_buf())
    }
}
