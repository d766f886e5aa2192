use std::path::PathBuf;

use crate::game::Player;

/// Rejections from the session controller. None of them mutate state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("column {0} does not exist")]
    InvalidColumn(usize),

    #[error("column {} is full", .0 + 1)]
    ColumnFull(usize),

    #[error("it's not your turn")]
    NotYourTurn,

    #[error("no move is pending confirmation")]
    NoPendingMove,

    #[error("no game in progress")]
    GameNotActive,

    #[error("undo is not available in online games")]
    UndoUnsupportedOnline,

    #[error("no moves to undo")]
    NothingToUndo,

    #[error("player names must not be empty")]
    EmptyName,

    #[error("players must have different names")]
    DuplicateNames,

    #[error("session is not connected to a room")]
    NotOnline,

    #[error("remote move at row {row}, column {column} does not fit the local board")]
    RemoteMoveRejected { row: usize, column: usize },
}

/// Errors from creating, joining, or writing to a shared room.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("invalid room code '{0}' (expected 6 characters A-Z or 0-9)")]
    InvalidCode(String),

    #[error("room {0} not found")]
    NotFound(String),

    #[error("room {0} is full")]
    Full(String),

    #[error("room {0} already exists")]
    AlreadyExists(String),

    #[error("turn conflict: room expects player {found} to move, not player {}", .expected.number())]
    TurnConflict { expected: Player, found: u8 },

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors that can occur while saving or loading the resume snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse snapshot from {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
