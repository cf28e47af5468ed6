//! Tracing subscriber setup

use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type Filtered = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync>;

/// Build the filter: `RUST_LOG` wins, otherwise the configured level
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber
///
/// Logs go to stderr, and to a daily rolling file when `config.file` is set.
/// Keep the returned guard alive for the life of the program so buffered file
/// output gets flushed. Calling this twice leaves the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.json {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    } else {
        layers.push(fmt::layer().with_writer(std::io::stderr).boxed());
    }

    let mut guard = None;
    let mut file_error = None;
    if config.file {
        match open_log_file(config) {
            Ok(appender) => {
                let (writer, worker) = tracing_appender::non_blocking(appender);
                layers.push(fmt::layer().with_ansi(false).with_writer(writer).boxed());
                guard = Some(worker);
            }
            Err(e) => file_error = Some(e),
        }
    }

    let installed = tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(layers)
        .try_init()
        .is_ok();

    if !installed {
        tracing::debug!("Tracing subscriber already installed");
    }
    if let Some(e) = file_error {
        tracing::warn!("File logging disabled: {}", e);
    }

    guard
}

fn open_log_file(config: &LoggingConfig) -> Result<RollingFileAppender, String> {
    let dir = config
        .directory
        .clone()
        .or_else(crate::config::log_dir)
        .ok_or_else(|| "could not determine log directory".to_string())?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("hwlink")
        .filename_suffix("log")
        .build(&dir)
        .map_err(|e| format!("{}: {}", dir.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logging_writes_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            level: "info".to_string(),
            file: true,
            directory: Some(dir.path().to_path_buf()),
            json: false,
        };

        let appender = open_log_file(&config);
        assert!(appender.is_ok());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LoggingConfig::default();
        let _first = init_logging(&config);
        let _second = init_logging(&config);
    }
}
