//! Tracing subscriber installation for the binary.
//!
//! Library code only emits `tracing` events; nothing in the crate keeps a
//! global logger. The binary calls [`init`] once and holds on to the returned
//! guard so buffered file output is flushed on exit.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// File name of the run log inside the cache directory.
pub const LOG_FILE_NAME: &str = "report.log";

/// Where and how much to log.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Verbosity from `build.log_level`
    pub log_level: i32,
    /// Directory receiving [`LOG_FILE_NAME`]; no file layer when `None`
    pub log_dir: Option<PathBuf>,
    /// Mirror events to stderr
    pub stderr: bool,
}

impl LogSettings {
    pub fn new(log_level: i32) -> Self {
        Self {
            log_level,
            log_dir: None,
            stderr: true,
        }
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_stderr(mut self, stderr: bool) -> Self {
        self.stderr = stderr;
        self
    }
}

/// Filter directive for a configured verbosity.
pub fn level_directive(log_level: i32) -> &'static str {
    match log_level {
        i32::MIN..=-1 => "warn",
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// `RUST_LOG` when set, otherwise the configured verbosity for this crate
/// (dependencies stay at `warn`).
fn env_filter(log_level: i32) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,autodoc={}", level_directive(log_level))))
}

/// Install the global subscriber.
///
/// Returns the file writer's guard when a log directory was given; dropping
/// it flushes and closes the file.
pub fn init(settings: &LogSettings) -> Result<Option<WorkerGuard>> {
    let stderr_layer = settings
        .stderr
        .then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

    let (file_layer, guard) = match &settings.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(settings.log_level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_level_directive_mapping() {
        assert_eq!(level_directive(-5), "warn");
        assert_eq!(level_directive(-1), "warn");
        assert_eq!(level_directive(0), "info");
        assert_eq!(level_directive(1), "debug");
        assert_eq!(level_directive(2), "trace");
        assert_eq!(level_directive(9), "trace");
    }

    #[test]
    fn test_settings_builder() {
        let settings = LogSettings::new(1).with_log_dir("/tmp/x").with_stderr(false);
        assert_eq!(settings.log_level, 1);
        assert_eq!(settings.log_dir.as_deref(), Some(Path::new("/tmp/x")));
        assert!(!settings.stderr);
    }
}
