use std::path::Path;

use tracing::warn;

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::online::OnlineConfig;
use crate::persistence::SnapshotConfig;

/// Names prefilled on the terminal setup screen.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayersConfig {
    pub default_player1: String,
    pub default_player2: String,
}

impl Default for PlayersConfig {
    fn default() -> Self {
        PlayersConfig {
            default_player1: "Player 1".into(),
            default_player2: "Player 2".into(),
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub snapshot: SnapshotConfig,
    pub online: OnlineConfig,
    pub logging: LoggingConfig,
    pub players: PlayersConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot.autosave_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "snapshot.autosave_interval_secs must be > 0".into(),
            ));
        }
        if self.snapshot.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "snapshot.path must not be empty".into(),
            ));
        }
        if self.online.code_attempts == 0 {
            return Err(ConfigError::Validation(
                "online.code_attempts must be >= 1".into(),
            ));
        }
        if self.online.event_capacity == 0 {
            return Err(ConfigError::Validation(
                "online.event_capacity must be >= 1".into(),
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::Validation(
                "logging.filter must not be empty".into(),
            ));
        }
        if self.players.default_player1.trim().is_empty()
            || self.players.default_player2.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "players.default_player1/2 must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).unwrap_or_default()
    }
}
