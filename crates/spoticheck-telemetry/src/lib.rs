pub mod test_utils;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Console level. Overridden by RUST_LOG env var.
    pub log_level: Level,
    /// Directory for the per-run log file. `None` disables it.
    pub log_dir: Option<PathBuf>,
    /// Level written to the log file.
    pub file_level: Level,
    /// Send console output to stderr instead of stdout.
    pub stderr: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            log_dir: None,
            file_level: Level::DEBUG,
            stderr: false,
        }
    }
}

impl TelemetryConfig {
    /// Console at info, or debug when `debug` is set.
    pub fn for_run(debug: bool, log_dir: Option<PathBuf>) -> Self {
        Self {
            log_level: if debug { Level::DEBUG } else { Level::INFO },
            log_dir,
            ..Self::default()
        }
    }
}

/// Handle returned by [`init_telemetry`].
#[derive(Debug)]
pub struct TelemetryGuard {
    log_file: Option<PathBuf>,
}

impl TelemetryGuard {
    /// Path of this run's log file, if file logging is active.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Initialize the telemetry subsystem. Call once at startup.
pub fn init_telemetry(config: TelemetryConfig) -> TelemetryGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string().to_lowercase()));

    let console = if config.stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(console)
        .compact()
        .with_target(false)
        .with_thread_names(true)
        .with_filter(env_filter);

    // Optional per-run file, always at `file_level`
    let (file_layer, log_file) = match &config.log_dir {
        Some(dir) => match open_log_file(dir, Utc::now()) {
            Ok((file, path)) => {
                let layer = tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_thread_names(true)
                    .with_writer(Arc::new(file))
                    .with_filter(LevelFilter::from_level(config.file_level));
                (Some(layer), Some(path))
            }
            Err(e) => {
                eprintln!("spoticheck-telemetry: failed to open log file in {}: {e}", dir.display());
                (None, None)
            }
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(path) = &log_file {
        tracing::debug!(path = %path.display(), "logging to file");
    }

    TelemetryGuard { log_file }
}

/// `spoticheck-<UTC timestamp>.log`
pub fn log_file_name(now: DateTime<Utc>) -> String {
    format!("spoticheck-{}.log", now.format("%Y%m%d-%H%M%S"))
}

fn open_log_file(dir: &Path, now: DateTime<Utc>) -> std::io::Result<(File, PathBuf)> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(log_file_name(now));
    let file = File::options().create(true).append(true).open(&path)?;
    Ok((file, path))
}
