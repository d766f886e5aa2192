use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::game::Player;
use crate::online::RoomCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Both players share this device and alternate turns.
    #[default]
    Local,
    /// Each peer plays one seat through a shared room record.
    Online,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Winner(Player),
    Draw,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    pub score: u32,
}

/// A committed disc. `seq` is the 1-based move number within the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub row: usize,
    pub column: usize,
    pub player: Player,
    pub seq: usize,
}

/// This peer's place in an online room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineSeat {
    pub code: RoomCode,
    pub is_host: bool,
    pub me: Player,
    /// Timestamp of the newest `lastMove` applied or authored here.
    pub last_applied_ts: i64,
    /// Mirror of the room's `gameActive` flag.
    pub room_active: bool,
}

impl OnlineSeat {
    pub fn host(code: RoomCode) -> Self {
        OnlineSeat {
            code,
            is_host: true,
            me: Player::One,
            last_applied_ts: 0,
            room_active: false,
        }
    }

    pub fn guest(code: RoomCode, last_applied_ts: i64) -> Self {
        OnlineSeat {
            code,
            is_host: false,
            me: Player::Two,
            last_applied_ts,
            room_active: true,
        }
    }

    /// Timestamp for a move authored now: wall clock, but never at or
    /// before anything already seen.
    pub fn next_timestamp(&self, now_ms: i64) -> i64 {
        now_ms.max(self.last_applied_ts + 1)
    }
}

/// Trim a player name and reject blanks.
pub fn validate_name(name: &str) -> Result<String, SessionError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SessionError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Validate a local pairing: both named, and not the same name ignoring case.
pub fn validate_pair(player1: &str, player2: &str) -> Result<(String, String), SessionError> {
    let p1 = validate_name(player1)?;
    let p2 = validate_name(player2)?;
    if p1.to_lowercase() == p2.to_lowercase() {
        return Err(SessionError::DuplicateNames);
    }
    Ok((p1, p2))
}
