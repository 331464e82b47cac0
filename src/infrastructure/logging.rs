//! Logging system configuration and initialization
//!
//! This module provides the logging setup for the crawler:
//! - Console output (on by default)
//! - Optional file output through a non-blocking appender
//! - Structured JSON logging (optional)
//! - Configuration based log level, overridable with `RUST_LOG`
//! - Local timezone timestamps

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use chrono::Local;
use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::Mutex;
use tracing::{Subscriber, info};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    Layer,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

// Re-export LoggingConfig from config module
pub use crate::infrastructure::config::LoggingConfig;

// Global guard to keep the log file writer alive
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Noisy dependency targets, kept quiet unless TRACE is requested
const QUIET_TARGETS: &[&str] = &["reqwest=info", "hyper=warn", "hyper_util=warn", "h2=warn", "html5ever=warn", "selectors=warn"];

/// Timestamps in the machine's local timezone
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Build the level filter: `RUST_LOG` wins, otherwise the configured level
/// with dependency noise suppressed below TRACE.
pub fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

        if !config.level.to_lowercase().contains("trace") {
            for directive in QUIET_TARGETS {
                if let Ok(directive) = directive.parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }

        filter
    })
}

/// Plain stdout layer that sits next to the file layer
fn console_layer<S>(enabled: bool) -> Option<impl Layer<S>>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    enabled.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
    })
}

fn file_writer(log_dir: &Path, file_name: &str) -> Result<NonBlocking> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

    let file_appender = rolling::never(log_dir, file_name);
    let (writer, guard) = non_blocking(file_appender);

    // Store the guard globally to prevent it from being dropped
    LOG_GUARDS
        .lock()
        .map_err(|_| anyhow!("Log guard registry poisoned"))?
        .push(guard);

    Ok(writer)
}

/// Initialize logging with custom configuration
///
/// Returns an error when no output is enabled or when a global subscriber
/// is already installed.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let registry = Registry::default().with(build_env_filter(config));

    // Handle different combinations of output types
    let installed = match (config.file_output, config.console_output) {
        (true, console) => {
            let writer = file_writer(&config.log_dir, &config.file_name)?;

            if config.json_format {
                let file_layer = fmt::Layer::new()
                    .json()
                    .with_writer(writer)
                    .with_timer(LocalTimeFormatter)
                    .with_target(true)
                    .with_ansi(false); // No ANSI color codes for file output
                registry.with(file_layer).with(console_layer(console)).try_init()
            } else {
                let file_layer = fmt::Layer::new()
                    .with_writer(writer)
                    .with_timer(LocalTimeFormatter)
                    .with_target(false)
                    .with_ansi(false);
                registry.with(file_layer).with(console_layer(console)).try_init()
            }
        }
        (false, true) => {
            if config.json_format {
                let console_layer = fmt::Layer::new()
                    .json()
                    .with_writer(std::io::stdout)
                    .with_timer(LocalTimeFormatter);
                registry.with(console_layer).try_init()
            } else {
                let console_layer = fmt::Layer::new()
                    .with_writer(std::io::stdout)
                    .with_timer(LocalTimeFormatter)
                    .with_target(false);
                registry.with(console_layer).try_init()
            }
        }
        (false, false) => {
            return Err(anyhow!("No logging output configured"));
        }
    };
    installed.map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    info!("JSON format: {}", config.json_format);
    info!("Console output: {}", config.console_output);
    if config.file_output {
        info!("Log file: {:?}", config.log_dir.join(&config.file_name));
    }

    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== Auction Scout System Information ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
    info!("=========================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console_output);
        assert!(!config.file_output);
    }

    #[test]
    fn test_no_output_is_rejected() {
        let config = LoggingConfig {
            console_output: false,
            file_output: false,
            ..LoggingConfig::default()
        };
        assert!(init_logging_with_config(&config).is_err());
    }

    #[test]
    fn test_bad_level_falls_back() {
        let config = LoggingConfig {
            level: "not a level[".into(),
            ..LoggingConfig::default()
        };
        // Must not panic whatever RUST_LOG holds
        let _ = build_env_filter(&config);
    }

    #[test]
    fn test_file_output_with_console_installs_once() {
        let dir = tempfile::tempdir().unwrap();
        let json = LoggingConfig {
            file_output: true,
            console_output: true,
            json_format: true,
            log_dir: dir.path().join("json"),
            ..LoggingConfig::default()
        };
        let plain = LoggingConfig {
            json_format: false,
            log_dir: dir.path().join("plain"),
            ..json.clone()
        };

        // Only one global subscriber per process: the second install must fail
        // cleanly, and both must have created their file writer first
        let results = [init_logging_with_config(&json), init_logging_with_config(&plain)];
        assert!(results.iter().filter(|r| r.is_err()).count() >= 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(err.to_string().contains("Failed to install log subscriber"), "{err}");
        }
        assert!(dir.path().join("json").is_dir());
        assert!(dir.path().join("plain").is_dir());
    }

    #[test]
    fn test_file_writer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested/logs");
        assert!(file_writer(&log_dir, "test.log").is_ok());
        assert!(log_dir.is_dir());
    }
}
