//! Reelsmith CLI: batch clip assembly from the command line.
//!
//! Usage:
//!   reelsmith init                 Create the working layout
//!   reelsmith ingest [OPTIONS]     Copy clips and an audio track into it
//!   reelsmith check                Check system capabilities
//!   reelsmith plan [OPTIONS]       Show how a video would be looped to its audio
//!   reelsmith assemble [OPTIONS]   Render, concatenate and mux the deliverable
//!   reelsmith config [--save]      Show the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reelsmith_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "reelsmith",
    about = "Turn a batch of clips into one captioned, audio-matched video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the standard location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Working root (overrides `workspace_dir`)
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the video/ and audio/ directories
    Init,

    /// Copy clips and an optional audio track into the working root
    Ingest {
        /// Clip files in playback order; replaces the previous batch
        #[arg(short, long = "clip")]
        clips: Vec<PathBuf>,

        /// Audio track to lay under the video
        #[arg(short, long)]
        audio: Option<PathBuf>,

        /// Remove the current audio track
        #[arg(long, conflicts_with = "audio")]
        clear_audio: bool,
    },

    /// Check system capabilities
    Check,

    /// Probe a video and the audio track and print the loop plan
    Plan {
        /// Video to probe (defaults to the current deliverable)
        #[arg(long)]
        video: Option<PathBuf>,

        /// Audio to probe (defaults to the ingested audio track)
        #[arg(long)]
        audio: Option<PathBuf>,
    },

    /// Run the full assembly pipeline
    Assemble {
        /// Heading line
        #[arg(long, default_value = "HELLO")]
        heading: String,

        /// First text line
        #[arg(long, default_value = "Name")]
        line1: String,

        /// Second text line
        #[arg(long, default_value = "Place")]
        line2: String,

        /// Date line
        #[arg(long, default_value = "2026")]
        date: String,

        /// Font file for the burned-in text
        #[arg(long)]
        font: Option<PathBuf>,

        /// Overlay image composited over every clip
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// Keep the run's scratch directory if the run fails
        #[arg(long)]
        keep_temp: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write it to the standard config location
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => AppConfig::load(),
    };
    if let Some(workspace) = cli.workspace {
        config.workspace_dir = workspace;
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    reelsmith_common::logging::init_logging(&config.logging);
    tracing::debug!(workspace = %config.workspace_dir.display(), "Loaded configuration");

    match cli.command {
        Commands::Init => commands::init::run(&config),
        Commands::Ingest {
            clips,
            audio,
            clear_audio,
        } => commands::ingest::run(&config, clips, audio, clear_audio),
        Commands::Check => commands::check::run(&config),
        Commands::Plan { video, audio } => commands::plan::run(&config, video, audio),
        Commands::Assemble {
            heading,
            line1,
            line2,
            date,
            font,
            overlay,
            keep_temp,
        } => {
            if font.is_some() {
                config.overlay.font = font;
            }
            if let Some(overlay) = overlay {
                config.overlay.image = overlay;
            }
            config.pipeline.keep_temp_on_failure |= keep_temp;
            commands::assemble::run(config, heading, line1, line2, date).await
        }
        Commands::Config { save } => commands::config::run(&config, save),
    }
}
