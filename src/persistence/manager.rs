use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::SnapshotError;
use crate::persistence::snapshot::SessionSnapshot;
use crate::session::Session;

/// Configuration for the resume snapshot.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub path: PathBuf,
    pub autosave_interval_secs: u64,
    pub enabled: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        SnapshotConfig {
            path: PathBuf::from("four_in_a_row_state.json"),
            autosave_interval_secs: 30,
            enabled: true,
        }
    }
}

/// What prompted a save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    /// Periodic autosave; throttled to the configured interval.
    Interval,
    /// The front end lost focus or was suspended.
    Hidden,
    /// The process is about to exit.
    Unload,
}

/// Saves, loads and discards the single resume snapshot.
pub struct SnapshotManager {
    config: SnapshotConfig,
    last_saved: Option<Instant>,
}

impl SnapshotManager {
    pub fn new(config: SnapshotConfig) -> Self {
        SnapshotManager {
            config,
            last_saved: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Write the snapshot atomically: temp file, then rename over the target.
    pub fn save(&mut self, snapshot: &SessionSnapshot) -> Result<PathBuf, SnapshotError> {
        let path = &self.config.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(snapshot)?)?;
        fs::rename(&tmp, path)?;

        self.last_saved = Some(Instant::now());
        debug!(path = %path.display(), moves = snapshot.move_count, "snapshot saved");
        Ok(path.clone())
    }

    /// Load the saved snapshot, if any.
    pub fn load(&self) -> Result<Option<SessionSnapshot>, SnapshotError> {
        let path = &self.config.path;
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path).map_err(|e| SnapshotError::Read {
            path: path.clone(),
            source: e,
        })?;
        let snapshot: SessionSnapshot =
            serde_json::from_str(&json).map_err(|e| SnapshotError::Parse {
                path: path.clone(),
                source: e,
            })?;
        if snapshot.version != SessionSnapshot::VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        info!(path = %path.display(), moves = snapshot.move_count, "snapshot loaded");
        Ok(Some(snapshot))
    }

    /// Delete the saved snapshot. Missing files are not an error.
    pub fn discard(&self) -> Result<(), SnapshotError> {
        match fs::remove_file(&self.config.path) {
            Ok(()) => {
                debug!(path = %self.config.path.display(), "snapshot discarded");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Save the session if it has an active game and `trigger` calls for it.
    /// Returns whether a snapshot was written.
    pub fn persist(
        &mut self,
        session: &Session,
        trigger: SaveTrigger,
    ) -> Result<bool, SnapshotError> {
        if !self.config.enabled || !session.is_active() {
            return Ok(false);
        }
        if trigger == SaveTrigger::Interval && !self.interval_elapsed() {
            return Ok(false);
        }
        self.save(&session.snapshot())?;
        Ok(true)
    }

    fn interval_elapsed(&self) -> bool {
        let interval = Duration::from_secs(self.config.autosave_interval_secs);
        self.last_saved.map_or(true, |saved| saved.elapsed() >= interval)
    }
}
