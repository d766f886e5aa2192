use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RoomError;
use crate::game::{Board, Player};

pub const CODE_LENGTH: usize = 6;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Six-character room address drawn from `[A-Z0-9]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Draw a code uniformly from the alphabet.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..CODE_LENGTH)
            .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
            .collect();
        RoomCode(code)
    }

    /// Parse user input: trims and uppercases before validating.
    pub fn parse(input: &str) -> Result<Self, RoomError> {
        let normalized = input.trim().to_ascii_uppercase();
        let valid = normalized.len() == CODE_LENGTH
            && normalized.bytes().all(|b| CODE_ALPHABET.contains(&b));
        if valid {
            Ok(RoomCode(normalized))
        } else {
            Err(RoomError::InvalidCode(input.trim().to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = RoomError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RoomCode::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> String {
        code.0
    }
}

/// The move that produced the current record, as seen by the other peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMove {
    pub row: usize,
    pub column: usize,
    pub player: Player,
    pub is_win: bool,
    pub is_draw: bool,
    /// Milliseconds since the Unix epoch; strictly increases move to move.
    pub timestamp: i64,
}

/// The shared, last-writer-wins room document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineRoomState {
    pub host_name: String,
    pub player1_name: String,
    pub player2_name: Option<String>,
    pub board: Board,
    pub current_player: Player,
    pub game_active: bool,
    pub last_move: Option<LastMove>,
    pub created_at: i64,
}

impl OnlineRoomState {
    /// Record written by the host: empty board, no guest yet, inactive.
    pub fn hosted(host_name: &str, created_at: i64) -> Self {
        OnlineRoomState {
            host_name: host_name.to_string(),
            player1_name: host_name.to_string(),
            player2_name: None,
            board: Board::new(),
            current_player: Player::One,
            game_active: false,
            last_move: None,
            created_at,
        }
    }

    /// Write the fields a committed move touches.
    pub fn apply_move(&mut self, update: &MoveUpdate) {
        self.board = update.board;
        self.current_player = update.current_player;
        self.game_active = update.game_active;
        self.last_move = Some(update.last_move);
    }

    /// Fresh board with player one to move, keeping both seats.
    pub fn restart(&mut self) {
        self.board = Board::new();
        self.current_player = Player::One;
        self.game_active = true;
        self.last_move = None;
    }

    /// Fresh round: nothing played since the board was last cleared.
    pub fn is_fresh_round(&self) -> bool {
        self.last_move.is_none() && self.board.is_empty()
    }
}

/// Partial update pushed after a locally committed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveUpdate {
    /// Seat that authored the move; the record must still list it as the
    /// player to move for the write to be accepted.
    pub mover: Player,
    pub board: Board,
    pub current_player: Player,
    pub game_active: bool,
    pub last_move: LastMove,
}
