use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::{Board, Player};
use crate::session::{GameOutcome, Mode, Move, OnlineSeat, Phase, PlayerInfo};

/// Everything needed to pick a game back up after the process exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub mode: Mode,
    pub phase: Phase,
    pub board: Board,
    pub current_player: Player,
    pub players: [PlayerInfo; 2],
    pub pending_column: Option<usize>,
    pub history: Vec<Move>,
    pub move_count: usize,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub outcome: Option<GameOutcome>,
    pub online: Option<OnlineSeat>,
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub const VERSION: u32 = 1;

    /// Short human-readable description for the resume prompt.
    pub fn summary(&self) -> String {
        let names = format!("{} vs {}", self.players[0].name, self.players[1].name);
        let to_move = &self.players[self.current_player.index()].name;
        format!(
            "{names}, {} moves played, {to_move} to move (saved {})",
            self.move_count,
            self.saved_at.format("%Y-%m-%d %H:%M")
        )
    }
}
