//! Stream-copy concatenation of rendered parts.

use std::path::Path;

use reelsmith_common::error::{ReelError, ReelResult};
use reelsmith_project_model::artifact::{AssembledVideo, PartFile};

use crate::engine::{EngineCommand, MediaEngine};
use crate::renderer::require_output;

/// Concat demuxer manifest for `parts`, one `file '<path>'` line each.
pub fn manifest_contents(parts: &[PartFile]) -> String {
    parts
        .iter()
        .map(|part| {
            let path = part.path.display().to_string().replace('\'', "'\\''");
            format!("file '{path}'\n")
        })
        .collect()
}

/// Joins parts into one video without re-encoding.
pub struct Concatenator<'a> {
    engine: &'a dyn MediaEngine,
}

impl<'a> Concatenator<'a> {
    pub fn new(engine: &'a dyn MediaEngine) -> Self {
        Self { engine }
    }

    pub fn build_command(manifest: &Path, output: &Path) -> EngineCommand {
        EngineCommand::new("concat", output)
            .args(["-f", "concat", "-safe", "0", "-i"])
            .path_arg(manifest)
            .args(["-c", "copy"])
    }

    /// Concatenate `parts` in order into `output`.
    ///
    /// The manifest at `manifest` only exists for the duration of the call.
    pub fn concat(
        &self,
        parts: &[PartFile],
        manifest: &Path,
        output: &Path,
    ) -> ReelResult<AssembledVideo> {
        if parts.is_empty() {
            return Err(ReelError::concatenation("no parts to concatenate"));
        }

        std::fs::write(manifest, manifest_contents(parts))
            .map_err(|e| ReelError::file_io(manifest, e))?;
        tracing::info!(parts = parts.len(), output = %output.display(), "Concatenating parts");

        let result = self.engine.transcode(&Self::build_command(manifest, output));

        if let Err(e) = std::fs::remove_file(manifest) {
            tracing::warn!(
                manifest = %manifest.display(),
                error = %e,
                "Failed to remove concat manifest"
            );
        }

        match result {
            Ok(()) => {}
            Err(e) if e.is_engine_timeout() => return Err(e),
            Err(ReelError::EngineExecution {
                reason, diagnostics, ..
            }) => {
                return Err(ReelError::concatenation(format!(
                    "{reason}: {diagnostics}"
                )))
            }
            Err(e) => return Err(e),
        }

        require_output(output, "ffmpeg concat")?;
        Ok(AssembledVideo {
            path: output.to_path_buf(),
            part_count: parts.len(),
        })
    }
}
