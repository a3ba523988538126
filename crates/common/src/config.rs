//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ReelError, ReelResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Working root holding `video/`, `audio/`, `runs/` and the deliverable.
    pub workspace_dir: PathBuf,

    /// External engine settings.
    pub engine: EngineConfig,

    /// Overlay and text-burn settings.
    pub overlay: OverlayConfig,

    /// Orchestration policies.
    pub pipeline: PipelineConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// External transcoding/probing engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Explicit transcoder binary; resolved from `PATH` when unset.
    pub ffmpeg_path: Option<PathBuf>,

    /// Explicit prober binary; resolved from `PATH` when unset.
    pub ffprobe_path: Option<PathBuf>,

    /// Upper bound for any transcoding invocation (seconds).
    pub render_timeout_secs: u64,

    /// Upper bound for any probe invocation (seconds).
    pub probe_timeout_secs: u64,

    /// Video encoder used for per-clip renders.
    pub video_codec: String,

    /// Encoder preset.
    pub video_preset: String,

    /// Output pixel format.
    pub pixel_format: String,

    /// Audio encoder used when muxing the external track.
    pub audio_codec: String,

    /// Audio bitrate in kbps for the muxed track.
    pub audio_bitrate_kbps: u32,
}

/// Overlay graphic and font settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Overlay image composited over every clip. A transparent frame is
    /// generated when the file does not exist.
    pub image: PathBuf,

    /// Preferred font file, checked before the built-in candidate list.
    pub font: Option<PathBuf>,

    /// Fail the run instead of falling back to the engine's default font.
    pub require_font: bool,
}

/// What to do when a duration probe yields no usable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProbeFailurePolicy {
    /// Play the video once and still mux the audio (truncated to the
    /// shorter stream). The fallback reason is recorded on the loop plan.
    #[default]
    LoopOnce,
    /// Fail the run with a probe failure.
    Abort,
}

/// Orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fallback when audio or video duration cannot be measured.
    pub probe_failure: ProbeFailurePolicy,

    /// Leave the run's scratch directory behind after a failure.
    pub keep_temp_on_failure: bool,

    /// File name of the deliverable inside the workspace root.
    pub final_name: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelsmith=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from("temp_video"),
            engine: EngineConfig::default(),
            overlay: OverlayConfig::default(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            render_timeout_secs: 600,
            probe_timeout_secs: 30,
            video_codec: "libx264".to_string(),
            video_preset: "medium".to_string(),
            pixel_format: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate_kbps: 192,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            image: PathBuf::from("overlay.png"),
            font: None,
            require_font: false,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            probe_failure: ProbeFailurePolicy::default(),
            keep_temp_on_failure: false,
            final_name: "youtube_ready.mp4".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit file.
    pub fn load_from(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ReelError::file_io(path, e))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(config_file_path())
    }

    /// Save config to an explicit file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> ReelResult<()> {
        if self.engine.render_timeout_secs == 0 || self.engine.probe_timeout_secs == 0 {
            return Err(ReelError::config("engine timeouts must be at least 1 second"));
        }
        let name = self.pipeline.final_name.trim();
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(ReelError::config(format!(
                "final_name must be a plain file name, got {:?}",
                self.pipeline.final_name
            )));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelsmith").join("config.json")
}
