//! Logging initialization for GradeTrack.
//!
//! Auth events are logged with structured fields (user_id, purpose, counts);
//! the filter keeps dependency internals quiet so those events stay readable.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Parse log level string to tracing Level.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Filter directive string for the configured level.
///
/// sqlx logs every statement at info and lettre is chatty during delivery;
/// both are capped at warn unless `RUST_LOG` overrides the whole filter.
fn filter_directives(level: &str) -> String {
    format!("{},sqlx=warn,lettre=warn", parse_level(level))
}

/// Build the subscriber filter, letting `RUST_LOG` take precedence.
fn build_filter(level: &str) -> EnvFilter {
    if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(filter_directives(level))
    }
}

/// Initialize the logging system with the given configuration.
///
/// Output goes to stdout and to the configured log file.
pub fn init(config: &LoggingConfig) -> Result<()> {
    // Ensure log directory exists
    if let Some(parent) = Path::new(&config.file).parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let log_file = Arc::new(File::create(&config.file)?);
    let writer = std::io::stdout.and(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(build_filter(&config.level))
        .init();

    Ok(())
}
