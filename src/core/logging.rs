//! Logging Module
//!
//! Sets up:
//! - console output on stderr (stdout carries the compile result)
//! - optional JSON logs in a daily rolling file
//! - `log` crate records redirected to `tracing`
//! - miette reporting for user-facing errors

use std::fs;
use std::io::{self, IsTerminal};
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

const LOG_FILE: &str = "lessonforge.log";

/// Filter from `RUST_LOG`, falling back to the configured level.
fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Initialize the logging system.
///
/// Returns the file writer's `WorkerGuard` when file logging is enabled; keep it alive
/// for the life of the process so buffered records are flushed on exit.
pub fn init(config: &LoggingConfig, log_dir: &Path) -> Option<WorkerGuard> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .with_filter(env_filter(config));

    let (file_layer, guard) = if config.file_logging {
        match fs::create_dir_all(log_dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .json()
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(true)
                    .with_filter(env_filter(config));
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!("Failed to create log directory {}: {}", log_dir.display(), e);
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Logging already initialized: {}", e);
        return guard;
    }

    // Fails harmlessly when the subscriber already installed the bridge
    let _ = tracing_log::LogTracer::init();

    init_miette();

    if guard.is_some() {
        log::debug!("Logging to {} (daily rolling)", log_dir.join(LOG_FILE).display());
    }
    guard
}

fn init_miette() {
    let colorize = io::stderr().is_terminal();
    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .color(colorize)
                .unicode(colorize)
                .context_lines(3)
                .tab_width(4)
                .build(),
        )
    }))
    .ok();
}
