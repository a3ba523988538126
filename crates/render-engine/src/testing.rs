//! Scripted in-memory engine for unit tests.
//!
//! Media files are small text files of `key=value` lines (`duration=5`,
//! `audio=true`). The engine derives each output from its inputs the way
//! the real transcoder would, so durations can be checked end to end.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use reelsmith_common::error::{ReelError, ReelResult};

use crate::engine::{EngineCommand, MediaEngine};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct FakeMedia {
    pub duration: Option<f64>,
    pub audio: bool,
}

impl FakeMedia {
    pub fn video(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            audio: false,
        }
    }

    pub fn with_audio(mut self) -> Self {
        self.audio = true;
        self
    }

    pub fn write(&self, path: &Path) {
        let mut text = String::new();
        if let Some(d) = self.duration {
            text.push_str(&format!("duration={d}\n"));
        }
        text.push_str(&format!("audio={}\n", self.audio));
        std::fs::write(path, text).unwrap();
    }

    pub fn read(path: &Path) -> Self {
        let text = std::fs::read_to_string(path).unwrap_or_default();
        let mut media = Self::default();
        for line in text.lines() {
            match line.split_once('=') {
                Some(("duration", v)) => media.duration = v.parse().ok(),
                Some(("audio", v)) => media.audio = v == "true",
                _ => {}
            }
        }
        media
    }
}

#[derive(Default)]
pub(crate) struct ScriptedEngine {
    calls: Mutex<Vec<EngineCommand>>,
    failures: HashMap<&'static str, String>,
    timeouts: HashSet<&'static str>,
    no_output: HashSet<&'static str>,
    unprobeable: HashSet<String>,
    on_transcode: Option<Box<dyn Fn(&EngineCommand) + Send + Sync>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocations labelled `label` exit nonzero with `stderr`.
    pub fn fail_on(mut self, label: &'static str, stderr: &str) -> Self {
        self.failures.insert(label, stderr.to_string());
        self
    }

    /// Invocations labelled `label` hit the timeout.
    pub fn time_out_on(mut self, label: &'static str) -> Self {
        self.timeouts.insert(label);
        self
    }

    /// Invocations labelled `label` succeed without writing their output.
    pub fn skip_output(mut self, label: &'static str) -> Self {
        self.no_output.insert(label);
        self
    }

    /// Probing a file with this name fails.
    pub fn unprobeable(mut self, file_name: &str) -> Self {
        self.unprobeable.insert(file_name.to_string());
        self
    }

    /// Run `hook` before every transcode.
    pub fn on_transcode(mut self, hook: impl Fn(&EngineCommand) + Send + Sync + 'static) -> Self {
        self.on_transcode = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<EngineCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.calls().iter().map(|c| c.label).collect()
    }

    fn inputs(command: &EngineCommand) -> Vec<PathBuf> {
        command
            .args
            .windows(2)
            .filter(|w| w[0] == "-i")
            .map(|w| PathBuf::from(&w[1]))
            .collect()
    }

    fn derive_output(command: &EngineCommand) -> FakeMedia {
        let inputs = Self::inputs(command);
        match command.label {
            "concat" => {
                let manifest = std::fs::read_to_string(&inputs[0]).unwrap();
                let parts: Vec<FakeMedia> = manifest
                    .lines()
                    .filter_map(|l| l.strip_prefix("file '")?.strip_suffix('\''))
                    .map(|p| FakeMedia::read(Path::new(&p.replace("'\\''", "'"))))
                    .collect();
                FakeMedia {
                    duration: Some(parts.iter().filter_map(|p| p.duration).sum()),
                    audio: parts.iter().any(|p| p.audio),
                }
            }
            "loop" => {
                let plays = command
                    .value_of("-stream_loop")
                    .and_then(|v| v.parse::<f64>().ok())
                    .unwrap_or(0.0)
                    + 1.0;
                let input = FakeMedia::read(&inputs[0]);
                FakeMedia {
                    duration: input.duration.map(|d| d * plays),
                    audio: input.audio,
                }
            }
            "mux" => {
                let video = FakeMedia::read(&inputs[0]);
                let audio = FakeMedia::read(&inputs[1]);
                FakeMedia {
                    duration: match (video.duration, audio.duration) {
                        (Some(v), Some(a)) => Some(v.min(a)),
                        (v, a) => v.or(a),
                    },
                    audio: true,
                }
            }
            // render keeps the clip's duration and optional audio stream
            _ => FakeMedia::read(&inputs[0]),
        }
    }
}

impl MediaEngine for ScriptedEngine {
    fn transcode(&self, command: &EngineCommand) -> ReelResult<()> {
        self.calls.lock().unwrap().push(command.clone());
        if let Some(hook) = &self.on_transcode {
            hook(command);
        }

        if self.timeouts.contains(command.label) {
            return Err(ReelError::engine_timed_out(
                format!("ffmpeg {}", command.label),
                std::time::Duration::from_secs(600),
                "",
            ));
        }
        if let Some(stderr) = self.failures.get(command.label) {
            return Err(ReelError::engine_failed(
                format!("ffmpeg {}", command.label),
                "exit status: 1",
                stderr.clone(),
            ));
        }
        if !self.no_output.contains(command.label) {
            Self::derive_output(command).write(&command.output);
        }
        Ok(())
    }

    fn probe_duration(&self, path: &Path) -> ReelResult<f64> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.unprobeable.contains(&name) {
            return Err(ReelError::probe_failure(path, "non-numeric duration \"N/A\""));
        }
        FakeMedia::read(path)
            .duration
            .filter(|d| *d > 0.0)
            .ok_or_else(|| ReelError::probe_failure(path, "prober printed no duration"))
    }
}
