use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Configuration for the tracing subscriber.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub filter: String,
    /// Log file. The terminal UI owns stdout, so without a file logs go to
    /// stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "info".into(),
            file: Some(PathBuf::from("four_in_a_row.log")),
        }
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.filter))
        .with_target(true)
        .compact();

    match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            filter: "debug".into(),
            file: Some(dir.path().join("test.log")),
        };
        init(&config).unwrap();
        init(&LoggingConfig {
            filter: "warn".into(),
            file: None,
        })
        .unwrap();
        assert!(dir.path().join("test.log").exists());
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            filter: "info".into(),
            file: Some(dir.path().join("missing").join("test.log")),
        };
        assert!(init(&config).is_err());
    }
}
