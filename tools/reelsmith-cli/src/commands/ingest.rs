//! Copy clips and an audio track into the working root.

use std::path::PathBuf;

use anyhow::Context;
use reelsmith_common::config::AppConfig;
use reelsmith_project_model::Workspace;

pub fn run(
    config: &AppConfig,
    clips: Vec<PathBuf>,
    audio: Option<PathBuf>,
    clear_audio: bool,
) -> anyhow::Result<()> {
    let workspace = Workspace::new(&config.workspace_dir, &config.pipeline.final_name)?;

    if clips.is_empty() && audio.is_none() && !clear_audio {
        anyhow::bail!("Nothing to ingest: pass --clip and/or --audio");
    }

    if !clips.is_empty() {
        let buffers = clips
            .iter()
            .map(|path| {
                std::fs::read(path)
                    .with_context(|| format!("Failed to read clip {}", path.display()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let written = workspace.ingest_clips(&buffers)?;
        println!("Ingested {} clip(s):", written.len());
        for (source, dest) in clips.iter().zip(&written) {
            println!("  {} -> {}", source.display(), dest.display());
        }
    }

    if let Some(audio) = audio {
        let bytes = std::fs::read(&audio)
            .with_context(|| format!("Failed to read audio {}", audio.display()))?;
        let dest = workspace.ingest_audio(&bytes)?;
        println!("Audio track: {} -> {}", audio.display(), dest.display());
    } else if clear_audio {
        if workspace.clear_audio()? {
            println!("Removed audio track");
        } else {
            println!("No audio track to remove");
        }
    }

    Ok(())
}
