//! Error types shared across Reelsmith crates.

use std::path::PathBuf;

/// Top-level error type for Reelsmith operations.
///
/// Every pipeline component returns one of these; the orchestrator never
/// retries, so each variant is terminal for the run that produced it.
#[derive(Debug, thiserror::Error)]
pub enum ReelError {
    #[error("No input clips found in {}", .dir.display())]
    NoInput { dir: PathBuf },

    #[error("Resource unavailable: {resource}: {message}")]
    ResourceUnavailable { resource: String, message: String },

    #[error("{tool} {reason}: {diagnostics}")]
    EngineExecution {
        tool: String,
        reason: String,
        diagnostics: String,
    },

    #[error("Could not probe duration of {}: {message}", .path.display())]
    ProbeFailure { path: PathBuf, message: String },

    #[error("Concatenation failed: {message}")]
    Concatenation { message: String },

    #[error("File I/O error at {}: {source}", .path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Run cancelled before {stage}")]
    Cancelled { stage: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

const TIMEOUT_REASON: &str = "timed out";

/// Result type alias using ReelError.
pub type ReelResult<T> = Result<T, ReelError>;

impl ReelError {
    pub fn no_input(dir: impl Into<PathBuf>) -> Self {
        Self::NoInput { dir: dir.into() }
    }

    pub fn resource_unavailable(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ResourceUnavailable {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    /// Engine process exited unsuccessfully.
    pub fn engine_failed(
        tool: impl Into<String>,
        status: impl std::fmt::Display,
        diagnostics: impl Into<String>,
    ) -> Self {
        Self::EngineExecution {
            tool: tool.into(),
            reason: format!("failed ({status})"),
            diagnostics: diagnostics.into(),
        }
    }

    /// Engine process exceeded its time budget and was killed.
    pub fn engine_timed_out(
        tool: impl Into<String>,
        timeout: std::time::Duration,
        diagnostics: impl Into<String>,
    ) -> Self {
        Self::EngineExecution {
            tool: tool.into(),
            reason: format!("{TIMEOUT_REASON} after {}s", timeout.as_secs_f64()),
            diagnostics: diagnostics.into(),
        }
    }

    pub fn probe_failure(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::ProbeFailure {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn concatenation(msg: impl Into<String>) -> Self {
        Self::Concatenation {
            message: msg.into(),
        }
    }

    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    pub fn cancelled(stage: impl Into<String>) -> Self {
        Self::Cancelled {
            stage: stage.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether an engine invocation was killed for exceeding its timeout.
    pub fn is_engine_timeout(&self) -> bool {
        matches!(self, Self::EngineExecution { reason, .. } if reason.starts_with(TIMEOUT_REASON))
    }

    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoInput { .. } => "no_input",
            Self::ResourceUnavailable { .. } => "resource_unavailable",
            Self::EngineExecution { .. } => "engine_execution",
            Self::ProbeFailure { .. } => "probe_failure",
            Self::Concatenation { .. } => "concatenation",
            Self::FileIo { .. } | Self::Io(_) => "file_io",
            Self::Cancelled { .. } => "cancelled",
            Self::Config { .. } | Self::Json(_) => "config",
            Self::Other(_) => "other",
        }
    }
}
