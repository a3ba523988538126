//! Show the loop plan for a video and an audio track.

use std::path::PathBuf;

use reelsmith_common::config::AppConfig;
use reelsmith_project_model::Workspace;
use reelsmith_render_engine::audio_match::AudioDurationMatcher;
use reelsmith_render_engine::{locator_from_config, EngineContext, FfmpegEngine};

pub fn run(
    config: &AppConfig,
    video: Option<PathBuf>,
    audio: Option<PathBuf>,
) -> anyhow::Result<()> {
    let workspace = Workspace::new(&config.workspace_dir, &config.pipeline.final_name)?;

    let video = video.unwrap_or_else(|| workspace.final_path());
    if !video.is_file() {
        anyhow::bail!("Video not found: {} (pass --video)", video.display());
    }
    let audio = match audio.or_else(|| workspace.audio_track()) {
        Some(audio) => audio,
        None => anyhow::bail!("No audio track ingested (pass --audio)"),
    };

    let locator = locator_from_config(config);
    let engine = FfmpegEngine::new(EngineContext::resolve(&locator, &config.engine)?);
    let plan =
        AudioDurationMatcher::new(&engine, config.pipeline.probe_failure).plan(&audio, &video)?;

    let secs = |d: Option<f64>| d.map_or_else(|| "unknown".to_string(), |d| format!("{d:.2}s"));
    println!("Video:  {} ({})", video.display(), secs(plan.video_secs));
    println!("Audio:  {} ({})", audio.display(), secs(plan.audio_secs));
    println!("Plays:  {}", plan.loop_count);
    if let Some(reason) = &plan.fallback {
        println!("Note:   fell back to a single play: {reason}");
    }

    Ok(())
}
