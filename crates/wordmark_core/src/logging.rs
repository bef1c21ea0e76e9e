//! Logging setup, the log file is written through a non-blocking appender.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use wordmark_config::LogConfig;

/// The log file is truncated on startup beyond this size.
const MAX_LOG_FILE_SIZE: u64 = 8 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log file path: {0}")]
    InvalidPath(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Installs the global subscriber if a log file is configured.
///
/// The returned guard must be held for as long as logs are expected to be flushed.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let Some(log_path) = config.log_file.as_ref().map(PathBuf::from) else {
        return Ok(None);
    };

    truncate_oversized(&log_path)?;

    let file_name = log_path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(log_path.clone()))?;
    let directory = log_path
        .parent()
        .ok_or_else(|| LoggingError::InvalidPath(log_path.clone()))?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(env_filter(config))
        .with_line_number(true)
        .with_writer(non_blocking)
        .with_ansi(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(Some(guard))
}

fn truncate_oversized(log_path: &Path) -> std::io::Result<()> {
    if let Ok(metadata) = std::fs::metadata(log_path) {
        if log_path.is_file() && metadata.len() > MAX_LOG_FILE_SIZE {
            std::fs::remove_file(log_path)?;
        }
    }
    Ok(())
}

/// `max-level` applies everywhere, `log-target` adds per target directives on top.
fn filter_directives(config: &LogConfig) -> String {
    let max_level = config
        .max_level
        .parse()
        .unwrap_or(tracing::Level::DEBUG)
        .to_string()
        .to_lowercase();

    let log_target = config.log_target.trim();
    if log_target.is_empty() {
        max_level
    } else {
        format!("{max_level},{log_target}")
    }
}

fn env_filter(config: &LogConfig) -> EnvFilter {
    let directives = filter_directives(config);
    EnvFilter::try_new(&directives).unwrap_or_else(|err| {
        eprintln!("Invalid log directives {directives:?}: {err}");
        EnvFilter::new("debug")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        let config = LogConfig {
            max_level: "info".into(),
            log_target: " wordmark_core::service=trace ".into(),
            ..Default::default()
        };
        assert_eq!(
            filter_directives(&config),
            "info,wordmark_core::service=trace"
        );

        let config = LogConfig {
            max_level: "loud".into(),
            ..Default::default()
        };
        assert_eq!(filter_directives(&config), "debug");
    }

    #[test]
    fn test_truncate_oversized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordmark.log");

        std::fs::write(&path, b"small").unwrap();
        truncate_oversized(&path).unwrap();
        assert!(path.exists());

        std::fs::write(&path, vec![b'x'; MAX_LOG_FILE_SIZE as usize + 1]).unwrap();
        truncate_oversized(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_no_log_file() {
        assert!(init(&LogConfig::default()).unwrap().is_none());
    }
}
