//! Pipeline progress reporting and cancellation.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Stages of an assembly run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage")]
pub enum PipelineStage {
    Idle,
    Discovering,
    /// Rendering clip `index` (1-based) of `total`.
    RenderingClips { index: usize, total: usize },
    Concatenating,
    MatchingAudio,
    Muxing,
    Done,
    Failed,
}

impl PipelineStage {
    /// Overall completion reached when this stage starts.
    pub fn fraction(self) -> f64 {
        match self {
            Self::Idle | Self::Discovering => 0.0,
            Self::RenderingClips { index, total } => {
                let done = index.saturating_sub(1) as f64 / total.max(1) as f64;
                0.05 + 0.75 * done
            }
            Self::Concatenating => 0.80,
            Self::MatchingAudio => 0.85,
            Self::Muxing => 0.90,
            Self::Done => 1.0,
            Self::Failed => 0.0,
        }
    }

    /// Human-readable progress label.
    pub fn label(self) -> String {
        match self {
            Self::Idle => "Waiting".to_string(),
            Self::Discovering => "Discovering clips".to_string(),
            Self::RenderingClips { index, total } => format!("Rendering clip {index}/{total}"),
            Self::Concatenating => "Concatenating clips".to_string(),
            Self::MatchingAudio => "Matching audio duration".to_string(),
            Self::Muxing => "Adding audio".to_string(),
            Self::Done => "Done".to_string(),
            Self::Failed => "Failed".to_string(),
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineProgress {
    pub stage: PipelineStage,
    pub label: String,
    /// Overall progress in [0.0, 1.0].
    pub fraction: f64,
}

impl PipelineProgress {
    pub fn entering(stage: PipelineStage) -> Self {
        Self {
            stage,
            label: stage.label(),
            fraction: stage.fraction(),
        }
    }
}

/// Progress callback for assembly runs.
pub type ProgressCallback = Box<dyn Fn(PipelineProgress) + Send>;

/// Cooperative cancellation flag shared with a running pipeline.
///
/// The pipeline checks it before every stage and before every clip render.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
