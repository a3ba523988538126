//! Tracing subscriber setup for the CLI.
//!
//! A bare level such as `debug` applies to the Reelsmith crates only; other
//! crates stay at `warn`. Anything containing a directive (`=` or `,`) is
//! passed to [`EnvFilter`] unchanged. `RUST_LOG` always wins.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Crate targets that a bare level applies to.
const REELSMITH_TARGETS: &[&str] = &[
    "reelsmith",
    "reelsmith_common",
    "reelsmith_project_model",
    "reelsmith_platform_core",
    "reelsmith_render_engine",
];

const FALLBACK_LEVEL: &str = "info";

/// Expand the configured level into `EnvFilter` directives.
pub fn filter_directives(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        return filter_directives(FALLBACK_LEVEL);
    }
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }

    let mut directives = vec!["warn".to_string()];
    directives.extend(REELSMITH_TARGETS.iter().map(|t| format!("{t}={level}")));
    directives.join(",")
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(filter_directives(&config.level)).unwrap_or_else(|e| {
        eprintln!(
            "invalid logging.level {:?} ({e}), using {FALLBACK_LEVEL}",
            config.level
        );
        EnvFilter::new(filter_directives(FALLBACK_LEVEL))
    })
}

/// Install the global subscriber writing to stderr.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(build_filter(config))
        .with_writer(std::io::stderr);

    let installed = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.with_target(true).finish())
    };
    installed.is_ok()
}
