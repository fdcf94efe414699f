//! Structured logging for strata hosts.
//!
//! Installs a `tracing` subscriber with console output timed from startup
//! and, in debug builds, a JSON log file for post-mortem analysis. The
//! level comes from the config's `debug.log_level` unless `RUST_LOG` is set.

use std::fs::File;
use std::path::{Path, PathBuf};

use strata_config::StrataConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config provides one.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "strata.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - enables file logging
/// * `config` - source of the log level override
///
/// Calling this twice panics inside `tracing-subscriber`; hosts call it once
/// at startup.
///
/// ```no_run
/// use strata_config::StrataConfig;
/// use strata_log::init_logging;
///
/// let config = StrataConfig::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&StrataConfig>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    let log_file = if debug_build {
        log_dir.and_then(open_log_file)
    } else {
        None
    };

    let file_logging = log_file.is_some();
    match log_file {
        Some(file) => {
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::uptime())
                .json();
            subscriber.with(file_layer).init();
        }
        None => subscriber.init(),
    }
    tracing::debug!(file_logging, "logging initialised");
}

/// The filter directive taken from `config`, or [`DEFAULT_FILTER`].
pub fn filter_directive(config: Option<&StrataConfig>) -> String {
    config
        .map(|c| c.debug.log_level.trim())
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Path of the JSON log file inside `log_dir`.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

fn open_log_file(log_dir: &Path) -> Option<File> {
    std::fs::create_dir_all(log_dir).ok()?;
    File::create(log_file_path(log_dir)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_without_config() {
        assert_eq!(filter_directive(None), "info");
    }

    #[test]
    fn test_config_level_is_used() {
        let mut config = StrataConfig::default();
        config.debug.log_level = "debug,strata_stream=trace".to_string();
        assert_eq!(filter_directive(Some(&config)), "debug,strata_stream=trace");
    }

    #[test]
    fn test_blank_level_falls_back() {
        let mut config = StrataConfig::default();
        config.debug.log_level = "  ".to_string();
        assert_eq!(filter_directive(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_env_filter_parsing() {
        for directive in ["info", "debug,strata_stream=trace", "warn,strata_terrain=debug"] {
            assert!(
                EnvFilter::try_new(directive).is_ok(),
                "failed to parse filter: {directive}"
            );
        }
    }

    #[test]
    fn test_log_file_created_in_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs").join("run");
        assert!(open_log_file(&nested).is_some());
        assert!(log_file_path(&nested).exists());
        assert_eq!(log_file_path(&nested).file_name().unwrap(), LOG_FILE_NAME);
    }
}
