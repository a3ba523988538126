//! Assembly orchestration.
//!
//! Sequences discovery, per-clip rendering, concatenation, audio matching
//! and muxing for one run. Each run owns a scratch directory under
//! `runs/` that is removed when the run ends.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reelsmith_common::config::AppConfig;
use reelsmith_common::error::{ReelError, ReelResult};
use reelsmith_platform_core::{EngineTool, ResourceLocator, SystemLocator};
use reelsmith_project_model::artifact::{FinalArtifact, RenderJob};
use reelsmith_project_model::catalog::ClipCatalog;
use reelsmith_project_model::overlay::{OverlaySpec, OverlayText};
use reelsmith_project_model::plan::LoopPlan;
use reelsmith_project_model::workspace::{RunDir, Workspace};

use crate::audio_match::AudioDurationMatcher;
use crate::concat::Concatenator;
use crate::engine::{EngineContext, FfmpegEngine, MediaEngine};
use crate::mux::{AudioEncoding, Muxer};
use crate::overlay_image::resolve_overlay_image;
use crate::progress::{CancelToken, PipelineProgress, PipelineStage, ProgressCallback};
use crate::renderer::{ClipRenderer, VideoEncoding};

/// A run that stopped at `stage`.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    #[source]
    pub error: ReelError,
}

impl PipelineFailure {
    pub fn new(stage: PipelineStage, error: ReelError) -> Self {
        Self { stage, error }
    }
}

/// What a successful run did, written next to the deliverable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    /// Input clips in render order.
    pub clips: Vec<PathBuf>,
    /// Configured overlay image, `None` when a transparent placeholder was
    /// generated in the run's scratch directory.
    pub overlay_image: Option<PathBuf>,
    pub overlay_generated: bool,
    /// Font burned into the text, `None` for the engine default.
    pub font: Option<PathBuf>,
    /// Present when an audio track was muxed.
    pub loop_plan: Option<LoopPlan>,
    pub warnings: Vec<String>,
    pub elapsed_secs: f64,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct AssemblyOutcome {
    pub artifact: FinalArtifact,
    pub report: RunReport,
    /// Where the report was written, `None` if writing it failed.
    pub report_path: Option<PathBuf>,
}

/// Build a [`SystemLocator`] honoring the configured overrides.
pub fn locator_from_config(config: &AppConfig) -> SystemLocator {
    SystemLocator::new()
        .with_font(config.overlay.font.clone())
        .with_engine(EngineTool::Transcoder, config.engine.ffmpeg_path.clone())
        .with_engine(EngineTool::Prober, config.engine.ffprobe_path.clone())
}

/// Tracks the current stage and forwards notifications.
struct RunState<'a> {
    stage: PipelineStage,
    progress: Option<ProgressCallback>,
    cancel: &'a CancelToken,
}

impl RunState<'_> {
    fn enter(&mut self, stage: PipelineStage) -> ReelResult<()> {
        self.stage = stage;
        if self.cancel.is_cancelled() {
            return Err(ReelError::cancelled(stage.label()));
        }
        tracing::info!(stage = %stage, "Pipeline stage");
        self.notify(PipelineProgress::entering(stage));
        Ok(())
    }

    fn notify(&self, update: PipelineProgress) {
        if let Some(cb) = &self.progress {
            cb(update);
        }
    }
}

/// Batch assembly pipeline bound to one working root.
pub struct AssemblyPipeline {
    config: AppConfig,
    workspace: Workspace,
    catalog: ClipCatalog,
    engine: Arc<dyn MediaEngine>,
    locator: Arc<dyn ResourceLocator>,
}

impl AssemblyPipeline {
    pub fn new(
        config: AppConfig,
        engine: Arc<dyn MediaEngine>,
        locator: Arc<dyn ResourceLocator>,
    ) -> ReelResult<Self> {
        let workspace = Workspace::new(&config.workspace_dir, &config.pipeline.final_name)?;
        Ok(Self {
            config,
            workspace,
            catalog: ClipCatalog::default(),
            engine,
            locator,
        })
    }

    /// Resolve the ffmpeg engine from the host and build a pipeline.
    pub fn from_config(config: AppConfig) -> ReelResult<Self> {
        let locator = locator_from_config(&config);
        let context = EngineContext::resolve(&locator, &config.engine)?;
        Self::new(
            config,
            Arc::new(FfmpegEngine::new(context)),
            Arc::new(locator),
        )
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Run the whole pipeline once.
    ///
    /// Blocks until the deliverable is published or the first failure.
    pub fn run(
        &self,
        text: &OverlayText,
        progress: Option<ProgressCallback>,
        cancel: &CancelToken,
    ) -> Result<AssemblyOutcome, PipelineFailure> {
        let mut state = RunState {
            stage: PipelineStage::Idle,
            progress,
            cancel,
        };
        let mut scratch = None;

        match self.execute(text, &mut state, &mut scratch) {
            Ok(mut outcome) => {
                if let Some(dir) = &scratch {
                    self.discard_scratch(dir);
                }
                outcome.report_path = self.write_report(&outcome.report);
                tracing::info!(
                    output = %outcome.artifact.path.display(),
                    size_bytes = outcome.artifact.size_bytes,
                    has_audio = outcome.artifact.has_audio,
                    elapsed_secs = outcome.report.elapsed_secs,
                    "Assembly complete"
                );
                state.stage = PipelineStage::Done;
                state.notify(PipelineProgress::entering(PipelineStage::Done));
                Ok(outcome)
            }
            Err(error) => {
                let stage = state.stage;
                tracing::error!(
                    stage = %stage,
                    kind = error.kind(),
                    error = %error,
                    "Assembly failed"
                );
                if let Some(dir) = &scratch {
                    if self.config.pipeline.keep_temp_on_failure {
                        tracing::warn!(
                            path = %dir.root().display(),
                            "Keeping scratch directory of failed run"
                        );
                    } else {
                        self.discard_scratch(dir);
                    }
                }
                state.notify(PipelineProgress {
                    stage: PipelineStage::Failed,
                    label: format!("{stage} failed: {error}"),
                    fraction: stage.fraction(),
                });
                Err(PipelineFailure::new(stage, error))
            }
        }
    }

    fn execute(
        &self,
        text: &OverlayText,
        state: &mut RunState<'_>,
        scratch: &mut Option<RunDir>,
    ) -> ReelResult<AssemblyOutcome> {
        let started = Instant::now();
        let started_at = Utc::now();
        let engine = self.engine.as_ref();
        let final_path = self.workspace.final_path();
        let mut warnings = Vec::new();

        state.enter(PipelineStage::Discovering)?;
        if self.workspace.remove_stale_final()? {
            tracing::info!(
                path = %final_path.display(),
                "Removed deliverable and report of a previous run"
            );
        }
        let clips = self.catalog.discover(&self.workspace.video_dir())?;
        let dir = scratch.insert(self.workspace.create_run()?);
        tracing::info!(run_id = dir.id(), scratch = %dir.root().display(), "Allocated run scratch");

        let font = self.resolve_font(&mut warnings)?;
        let overlay_image = resolve_overlay_image(&self.config.overlay.image, dir)?;
        if overlay_image.generated {
            warnings.push(format!(
                "overlay image {} not found, a transparent placeholder was used",
                self.config.overlay.image.display()
            ));
        }
        let overlay = OverlaySpec::new(text.clone(), font.clone(), &overlay_image.path);

        let renderer = ClipRenderer::new(engine, VideoEncoding::from_config(&self.config.engine));
        let total = clips.len();
        let mut parts = Vec::with_capacity(total);
        for (index, clip) in clips.iter().enumerate() {
            state.enter(PipelineStage::RenderingClips {
                index: index + 1,
                total,
            })?;
            let job = RenderJob {
                index,
                clip: clip.clone(),
                overlay: overlay.clone(),
                output: dir.part_path(index),
            };
            parts.push(renderer.render(&job)?);
        }

        state.enter(PipelineStage::Concatenating)?;
        let assembled =
            Concatenator::new(engine).concat(&parts, &dir.manifest_path(), &dir.assembled_path())?;

        let muxer = Muxer::new(engine, AudioEncoding::from_config(&self.config.engine));
        let (artifact, loop_plan) = match self.workspace.audio_track() {
            Some(audio) => {
                state.enter(PipelineStage::MatchingAudio)?;
                let matcher =
                    AudioDurationMatcher::new(engine, self.config.pipeline.probe_failure);
                let plan = matcher.plan(&audio, &assembled.path)?;
                if let Some(reason) = &plan.fallback {
                    warnings.push(format!("duration probe failed, video played once: {reason}"));
                }
                let looped = matcher.apply(&plan, &assembled.path, &dir.looped_path())?;

                state.enter(PipelineStage::Muxing)?;
                let artifact = muxer.mux(&looped, &audio, &dir.muxed_path(), &final_path)?;
                (artifact, Some(plan))
            }
            None => {
                state.enter(PipelineStage::Muxing)?;
                (muxer.finalize_video_only(&assembled.path, &final_path)?, None)
            }
        };

        let report = RunReport {
            run_id: dir.id().to_string(),
            started_at,
            clips: clips.into_iter().map(|c| c.path).collect(),
            overlay_image: (!overlay_image.generated).then_some(overlay_image.path),
            overlay_generated: overlay_image.generated,
            font,
            loop_plan,
            warnings,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };
        Ok(AssemblyOutcome {
            artifact,
            report,
            report_path: None,
        })
    }

    fn resolve_font(&self, warnings: &mut Vec<String>) -> ReelResult<Option<PathBuf>> {
        match self.locator.locate_font() {
            Some(font) => {
                tracing::debug!(font = %font.display(), "Using font");
                Ok(Some(font))
            }
            None if self.config.overlay.require_font => Err(ReelError::resource_unavailable(
                "font",
                "no usable font file found and overlay.require_font is set",
            )),
            None => {
                tracing::warn!("No font found, burning text with the engine's default font");
                warnings.push("no font found, the engine's default font was used".to_string());
                Ok(None)
            }
        }
    }

    fn discard_scratch(&self, dir: &RunDir) {
        if let Err(e) = dir.remove() {
            tracing::warn!(
                path = %dir.root().display(),
                error = %e,
                "Failed to remove run scratch"
            );
        }
        // Only succeeds once no other run is using runs/.
        let _ = std::fs::remove_dir(self.workspace.runs_dir());
    }

    fn write_report(&self, report: &RunReport) -> Option<PathBuf> {
        let path = self.workspace.report_path();
        let written = serde_json::to_string_pretty(report)
            .map_err(ReelError::from)
            .and_then(|json| std::fs::write(&path, json).map_err(|e| ReelError::file_io(&path, e)));
        match written {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to write run report");
                None
            }
        }
    }
}

/// Resolve the host engine and run the pipeline off the async runtime.
pub async fn assemble(
    config: AppConfig,
    text: OverlayText,
    progress: Option<ProgressCallback>,
    cancel: CancelToken,
) -> Result<AssemblyOutcome, PipelineFailure> {
    let pipeline = match AssemblyPipeline::from_config(config) {
        Ok(pipeline) => pipeline,
        Err(error) => {
            if let Some(cb) = &progress {
                cb(PipelineProgress {
                    stage: PipelineStage::Failed,
                    label: format!("{} failed: {error}", PipelineStage::Idle),
                    fraction: 0.0,
                });
            }
            return Err(PipelineFailure::new(PipelineStage::Idle, error));
        }
    };

    tokio::task::spawn_blocking(move || pipeline.run(&text, progress, &cancel))
        .await
        .map_err(|e| {
            PipelineFailure::new(
                PipelineStage::Idle,
                ReelError::Other(anyhow::anyhow!("pipeline task failed: {e}")),
            )
        })?
}
