//! Per-clip rendering.

use std::path::Path;

use reelsmith_common::config::EngineConfig;
use reelsmith_common::error::{ReelError, ReelResult};
use reelsmith_project_model::artifact::{PartFile, RenderJob};

use crate::compositor::{OverlayCompositor, VIDEO_OUT_LABEL};
use crate::engine::{EngineCommand, MediaEngine};

/// Video encoder settings for rendered parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEncoding {
    pub codec: String,
    pub preset: String,
    pub pixel_format: String,
}

impl Default for VideoEncoding {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl VideoEncoding {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            codec: config.video_codec.clone(),
            preset: config.video_preset.clone(),
            pixel_format: config.pixel_format.clone(),
        }
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
        ]
    }
}

/// Renders one clip into a normalized, overlaid part file.
pub struct ClipRenderer<'a> {
    engine: &'a dyn MediaEngine,
    compositor: OverlayCompositor,
    encoding: VideoEncoding,
}

impl<'a> ClipRenderer<'a> {
    pub fn new(engine: &'a dyn MediaEngine, encoding: VideoEncoding) -> Self {
        Self {
            engine,
            compositor: OverlayCompositor::new(),
            encoding,
        }
    }

    /// The engine invocation for `job`.
    pub fn build_command(&self, job: &RenderJob) -> EngineCommand {
        let graph = self.compositor.build(&job.overlay);

        EngineCommand::new("render", &job.output)
            .arg("-i")
            .path_arg(&job.clip.path)
            .args(["-loop", "1", "-i"])
            .path_arg(&job.overlay.image)
            .arg("-filter_complex")
            .arg(graph)
            .args(["-map".to_string(), format!("[{VIDEO_OUT_LABEL}]")])
            .args(["-map", "0:a?"])
            .args(self.encoding.args())
            .args(["-c:a", "copy"])
    }

    pub fn render(&self, job: &RenderJob) -> ReelResult<PartFile> {
        non_empty_file(&job.clip.path)?;

        tracing::info!(
            index = job.index,
            clip = %job.clip.path.display(),
            output = %job.output.display(),
            "Rendering clip"
        );
        self.engine.transcode(&self.build_command(job))?;

        require_output(&job.output, "ffmpeg render")?;
        Ok(PartFile {
            index: job.index,
            path: job.output.clone(),
        })
    }
}

/// Size of `path`, failing when it is missing or empty.
pub(crate) fn non_empty_file(path: &Path) -> ReelResult<u64> {
    let meta = std::fs::metadata(path).map_err(|e| ReelError::file_io(path, e))?;
    if !meta.is_file() || meta.len() == 0 {
        return Err(ReelError::file_io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, "file is empty or not a file"),
        ));
    }
    Ok(meta.len())
}

/// Check that an engine invocation actually produced `output`.
pub(crate) fn require_output(output: &Path, tool: &str) -> ReelResult<()> {
    match std::fs::metadata(output) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(ReelError::EngineExecution {
            tool: tool.to_string(),
            reason: "produced no output".to_string(),
            diagnostics: format!("{} is missing or empty", output.display()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedEngine;
    use reelsmith_project_model::clip::ClipSource;
    use reelsmith_project_model::overlay::{OverlaySpec, OverlayText};
    use std::path::PathBuf;

    fn job(dir: &Path) -> RenderJob {
        let clip = dir.join("source1.mp4");
        std::fs::write(&clip, b"clip").unwrap();
        RenderJob {
            index: 0,
            clip: ClipSource::new(clip, 0),
            overlay: OverlaySpec::new(OverlayText::default(), None, "/w/overlay.png"),
            output: dir.join("part_000.mp4"),
        }
    }

    #[test]
    fn test_render_command_contract() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::new();
        let renderer = ClipRenderer::new(&engine, VideoEncoding::default());
        let job = job(dir.path());

        let cmd = renderer.build_command(&job);
        let line = cmd.command_line();
        assert_eq!(line[0], "-i");
        assert_eq!(PathBuf::from(&line[1]), job.clip.path);
        assert_eq!(&line[2..5], ["-loop", "1", "-i"]);
        assert_eq!(line[5], "/w/overlay.png");
        assert!(cmd.value_of("-filter_complex").unwrap().ends_with("[vout]"));
        assert_eq!(cmd.value_of("-map"), Some("[vout]"));
        assert!(line.windows(2).any(|w| w == ["-map", "0:a?"]));
        assert_eq!(cmd.value_of("-c:v"), Some("libx264"));
        assert_eq!(cmd.value_of("-preset"), Some("medium"));
        assert_eq!(cmd.value_of("-pix_fmt"), Some("yuv420p"));
        assert_eq!(cmd.value_of("-c:a"), Some("copy"));
        assert_eq!(PathBuf::from(line.last().unwrap()), job.output);
    }

    #[test]
    fn test_render_produces_part() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::new();
        let renderer = ClipRenderer::new(&engine, VideoEncoding::default());
        let job = job(dir.path());

        let part = renderer.render(&job).unwrap();
        assert_eq!(part.path, job.output);
        assert_eq!(engine.labels(), ["render"]);
    }

    #[test]
    fn test_empty_clip_is_rejected_before_engine() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::new();
        let renderer = ClipRenderer::new(&engine, VideoEncoding::default());
        let job = job(dir.path());
        std::fs::write(&job.clip.path, b"").unwrap();

        let err = renderer.render(&job).unwrap_err();
        assert!(matches!(err, ReelError::FileIo { .. }));
        assert!(engine.labels().is_empty());
    }

    #[test]
    fn test_engine_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::new().fail_on("render", "Invalid data found");
        let renderer = ClipRenderer::new(&engine, VideoEncoding::default());

        let err = renderer.render(&job(dir.path())).unwrap_err();
        assert!(matches!(
            err,
            ReelError::EngineExecution { ref diagnostics, .. } if diagnostics.contains("Invalid data")
        ));
    }

    #[test]
    fn test_missing_output_is_engine_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::new().skip_output("render");
        let renderer = ClipRenderer::new(&engine, VideoEncoding::default());

        let err = renderer.render(&job(dir.path())).unwrap_err();
        assert!(matches!(
            err,
            ReelError::EngineExecution { ref reason, .. } if reason == "produced no output"
        ));
    }
}
