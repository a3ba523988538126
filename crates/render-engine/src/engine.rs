//! External engine invocation.
//!
//! Every component describes its work as an [`EngineCommand`] and hands it
//! to a [`MediaEngine`]. [`FfmpegEngine`] runs the commands as child
//! processes with a hard timeout; tests substitute a scripted engine.

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use reelsmith_common::config::EngineConfig;
use reelsmith_common::error::{ReelError, ReelResult};
use reelsmith_platform_core::{EngineTool, ResourceLocator};

/// Arguments prepended to every transcoder invocation.
const TRANSCODER_PREAMBLE: &[&str] = &["-y", "-hide_banner", "-nostdin", "-loglevel", "error"];

const PROBE_ARGS: &[&str] = &[
    "-v",
    "error",
    "-show_entries",
    "format=duration",
    "-of",
    "default=noprint_wrappers=1:nokey=1",
];

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One transcoder invocation. The output path is always the last argument.
///
/// Arguments are kept as `OsString` so paths reach the engine byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Short operation name used in logs and errors ("render", "concat", …).
    pub label: &'static str,
    pub args: Vec<OsString>,
    pub output: PathBuf,
}

impl EngineCommand {
    pub fn new(label: &'static str, output: impl Into<PathBuf>) -> Self {
        Self {
            label,
            args: Vec::new(),
            output: output.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    /// Arguments as passed to the process, output included.
    pub fn command_line(&self) -> Vec<OsString> {
        let mut line = self.args.clone();
        line.push(self.output.clone().into_os_string());
        line
    }

    /// Value following `flag`, if present and valid UTF-8.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .and_then(|v| v.to_str())
    }
}

/// Black-box transcoding and probing engine.
pub trait MediaEngine: Send + Sync {
    /// Run a transcoder command to completion.
    fn transcode(&self, command: &EngineCommand) -> ReelResult<()>;

    /// Container duration of `path` in seconds.
    fn probe_duration(&self, path: &Path) -> ReelResult<f64>;
}

/// Resolved engine binaries and time budgets for one process.
#[derive(Debug, Clone)]
pub struct EngineContext {
    pub transcoder: PathBuf,
    pub prober: PathBuf,
    pub render_timeout: Duration,
    pub probe_timeout: Duration,
}

impl EngineContext {
    /// Resolve both binaries through `locator`.
    pub fn resolve(locator: &dyn ResourceLocator, config: &EngineConfig) -> ReelResult<Self> {
        let locate = |tool: EngineTool| {
            locator.locate_engine(tool).ok_or_else(|| {
                ReelError::resource_unavailable(
                    tool.binary_name(),
                    "binary not found on PATH and no usable override configured",
                )
            })
        };

        let context = Self {
            transcoder: locate(EngineTool::Transcoder)?,
            prober: locate(EngineTool::Prober)?,
            render_timeout: config.render_timeout(),
            probe_timeout: config.probe_timeout(),
        };
        tracing::debug!(
            transcoder = %context.transcoder.display(),
            prober = %context.prober.display(),
            "Resolved engine binaries"
        );
        Ok(context)
    }
}

/// Runs commands through the ffmpeg/ffprobe binaries.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    context: EngineContext,
}

impl FfmpegEngine {
    pub fn new(context: EngineContext) -> Self {
        Self { context }
    }
}

impl MediaEngine for FfmpegEngine {
    fn transcode(&self, command: &EngineCommand) -> ReelResult<()> {
        let mut args: Vec<OsString> = TRANSCODER_PREAMBLE.iter().map(OsString::from).collect();
        args.extend(command.command_line());

        tracing::debug!(label = command.label, args = ?args, "Running ffmpeg");
        let started = Instant::now();
        let output = run_with_timeout(&self.context.transcoder, &args, self.context.render_timeout)
            .map_err(|e| e.into_reel_error("ffmpeg", self.context.render_timeout))?;

        if !output.status.success() {
            return Err(ReelError::engine_failed(
                format!("ffmpeg {}", command.label),
                output.status,
                output.stderr.trim(),
            ));
        }

        tracing::debug!(
            label = command.label,
            elapsed_ms = started.elapsed().as_millis(),
            "ffmpeg finished"
        );
        Ok(())
    }

    fn probe_duration(&self, path: &Path) -> ReelResult<f64> {
        let mut args: Vec<OsString> = PROBE_ARGS.iter().map(OsString::from).collect();
        args.push(path.as_os_str().to_owned());

        let output = run_with_timeout(&self.context.prober, &args, self.context.probe_timeout)
            .map_err(|e| ReelError::probe_failure(path, e.to_string()))?;

        if !output.status.success() {
            return Err(ReelError::probe_failure(
                path,
                format!("ffprobe failed ({}): {}", output.status, output.stderr.trim()),
            ));
        }

        parse_duration(&output.stdout).map_err(|msg| ReelError::probe_failure(path, msg))
    }
}

/// Parse the prober's bare duration output into positive seconds.
pub fn parse_duration(stdout: &str) -> Result<f64, String> {
    let raw = stdout.lines().map(str::trim).find(|l| !l.is_empty());
    let Some(raw) = raw else {
        return Err("prober printed no duration".to_string());
    };

    let secs: f64 = raw
        .parse()
        .map_err(|_| format!("non-numeric duration {raw:?}"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("non-positive duration {raw:?}"));
    }
    Ok(secs)
}

/// Captured result of a finished child process.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Why a child process produced no [`ProcessOutput`].
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait on process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("timed out after {}s", .timeout.as_secs_f64())]
    TimedOut { timeout: Duration, stderr: String },
}

impl ProcessError {
    fn into_reel_error(self, tool: &str, timeout: Duration) -> ReelError {
        match self {
            Self::Spawn { program, source } => {
                ReelError::resource_unavailable(program, source.to_string())
            }
            Self::Wait(e) => ReelError::engine_failed(tool, "wait error", e.to_string()),
            Self::TimedOut { stderr, .. } => ReelError::engine_timed_out(tool, timeout, stderr),
        }
    }
}

/// Run `program` to completion, killing it once `timeout` elapses.
///
/// Both pipes are drained on helper threads so a chatty child never blocks
/// on a full pipe.
pub fn run_with_timeout(
    program: &Path,
    args: &[OsString],
    timeout: Duration,
) -> Result<ProcessOutput, ProcessError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: program.display().to_string(),
            source,
        })?;

    let stdout_task = drain(child.stdout.take());
    let stderr_task = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                tracing::warn!(
                    pid = child.id(),
                    program = %program.display(),
                    timeout_secs = timeout.as_secs_f64(),
                    "Engine process exceeded its timeout, killing"
                );
                let _ = child.kill();
                let _ = child.wait();
                let _ = join_drain(stdout_task);
                return Err(ProcessError::TimedOut {
                    timeout,
                    stderr: join_drain(stderr_task),
                });
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Wait(e));
            }
        }
    };

    Ok(ProcessOutput {
        status,
        stdout: join_drain(stdout_task),
        stderr: join_drain(stderr_task),
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let Some(mut pipe) = pipe else {
            return String::new();
        };
        let mut buf = Vec::new();
        match pipe.read_to_end(&mut buf) {
            Ok(_) => String::from_utf8_lossy(&buf).into_owned(),
            Err(err) => format!("<failed to read engine output: {err}>"),
        }
    })
}

fn join_drain(task: JoinHandle<String>) -> String {
    task.join()
        .unwrap_or_else(|_| "<failed to join output reader>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsmith_platform_core::FixedLocator;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12.480000\n"), Ok(12.48));
        assert_eq!(parse_duration("\n  7\n"), Ok(7.0));
        assert!(parse_duration("N/A\n").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0.000000").is_err());
        assert!(parse_duration("-3").is_err());
    }

    #[test]
    fn test_command_line_ends_with_output() {
        let cmd = EngineCommand::new("concat", "/w/medium.mp4")
            .args(["-f", "concat"])
            .arg("-i")
            .path_arg(Path::new("/w/list.txt"));
        assert_eq!(
            cmd.command_line(),
            ["-f", "concat", "-i", "/w/list.txt", "/w/medium.mp4"]
        );
        assert_eq!(cmd.value_of("-f"), Some("concat"));
        assert_eq!(cmd.value_of("-c"), None);
    }

    #[test]
    fn test_context_requires_both_binaries() {
        let locator = FixedLocator {
            transcoder: Some(PathBuf::from("/usr/bin/ffmpeg")),
            ..FixedLocator::default()
        };
        let err = EngineContext::resolve(&locator, &EngineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ReelError::ResourceUnavailable { ref resource, .. } if resource == "ffprobe"
        ));
    }

    #[test]
    fn test_spawn_failure_is_resource_unavailable() {
        let err = run_with_timeout(
            Path::new("/definitely/not/a/binary"),
            &[],
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(
            err.into_reel_error("ffmpeg", Duration::from_secs(1)),
            ReelError::ResourceUnavailable { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_process() {
        let started = Instant::now();
        let err = run_with_timeout(
            Path::new("/bin/sh"),
            &["-c".into(), "exec sleep 5".into()],
            Duration::from_millis(200),
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stderr_of_failed_process() {
        let out = run_with_timeout(
            Path::new("/bin/sh"),
            &["-c".into(), "echo boom >&2; exit 3".into()],
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(!out.status.success());
        assert_eq!(out.stderr.trim(), "boom");
    }

    #[cfg(unix)]
    #[test]
    fn test_path_arguments_keep_non_utf8_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let clip = Path::new(OsStr::from_bytes(b"/w/video/source\xff1.mp4"));
        let cmd = EngineCommand::new("render", "/w/part.mp4")
            .arg("-i")
            .path_arg(clip);
        assert_eq!(cmd.command_line()[1].as_bytes(), b"/w/video/source\xff1.mp4");
        assert_eq!(cmd.value_of("-i"), None);
    }

    #[cfg(unix)]
    fn stub_prober(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("ffprobe");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn engine_with_prober(prober: PathBuf) -> FfmpegEngine {
        FfmpegEngine::new(EngineContext {
            transcoder: PathBuf::from("/usr/bin/ffmpeg"),
            prober,
            render_timeout: Duration::from_secs(5),
            probe_timeout: Duration::from_millis(200),
        })
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_timeout_is_probe_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_prober(stub_prober(dir.path(), "exec sleep 5"));

        let started = Instant::now();
        let err = engine.probe_duration(Path::new("/w/voice.mp3")).unwrap_err();
        assert!(matches!(
            err,
            ReelError::ProbeFailure { ref path, .. } if path.ends_with("voice.mp3")
        ));
        assert!(!err.is_engine_timeout());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_probe_spawn_failure_is_probe_failure() {
        let engine = engine_with_prober(PathBuf::from("/definitely/not/ffprobe"));
        let err = engine.probe_duration(Path::new("/w/voice.mp3")).unwrap_err();
        assert!(matches!(err, ReelError::ProbeFailure { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_reads_prober_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let ok = engine_with_prober(stub_prober(dir.path(), "echo 12.5"));
        assert_eq!(ok.probe_duration(Path::new("/w/voice.mp3")).unwrap(), 12.5);

        let dir = tempfile::tempdir().unwrap();
        let prober = stub_prober(dir.path(), "echo 'Invalid data' >&2; exit 1");
        let failing = engine_with_prober(prober);
        let err = failing.probe_duration(Path::new("/w/voice.mp3")).unwrap_err();
        assert!(err.to_string().contains("Invalid data"));
    }
}
