//! Stderr logging for the gateway CLI.
//!
//! Subcommand output (tables, JSON) owns stdout, so every diagnostic the
//! gateway emits goes to stderr where a pipeline can keep the two apart.
//! Both flags also read `WIREBRIDGE_LOG_FORMAT` / `WIREBRIDGE_LOG_LEVEL`
//! via the clap wiring in `main.rs`.

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

/// How log events are rendered on stderr.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event, for log collectors.
    Json,
}

/// Minimum severity that reaches stderr. `info` keeps peer
/// connect/disconnect lifecycle visible; `debug` adds per-message
/// dispatch and send records.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Install the global subscriber. Later calls lose to the first, so
/// in-process tests that reach `main` twice do not panic.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::from(level))
        .with_ansi(false)
        .with_target(false);

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
