//! Notifications the core emits for the presentation layer.

use tokio::sync::broadcast;

use crate::error::{RoomError, SessionError};
use crate::game::{Board, Player};
use crate::online::RoomCode;

use super::state::GameOutcome;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Full grid, plus the cell that just received a disc (for animation).
    BoardChanged {
        board: Board,
        landed: Option<(usize, usize)>,
    },
    TurnChanged {
        player: Player,
        name: String,
    },
    /// The column awaiting confirmation, or `None` once cleared.
    PendingMoveChanged { column: Option<usize> },
    MoveRejected { reason: SessionError },
    SetupRejected { reason: SessionError },
    GameEnded {
        outcome: GameOutcome,
        winner_name: Option<String>,
        winning_cells: Vec<(usize, usize)>,
        move_count: usize,
        elapsed_secs: u64,
    },
    HintAvailable { column: usize },
    RoomCreated { code: RoomCode },
    RoomCreateFailed { reason: RoomError },
    RoomJoinFailed { reason: RoomError },
    PlayerJoined { name: String },
    /// A committed move could not be mirrored to the room. The local board
    /// keeps the move.
    SyncFailed { reason: RoomError },
}

/// Broadcast fan-out of [`Notification`]s. `emit` never blocks; receivers
/// that fall behind lose the oldest entries.
#[derive(Debug, Clone)]
pub struct NotificationEmitter {
    tx: broadcast::Sender<Notification>,
}

impl NotificationEmitter {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        NotificationEmitter { tx }
    }

    /// Returns how many receivers got the notification.
    pub fn emit(&self, notification: Notification) -> usize {
        self.tx.send(notification).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for NotificationEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers() {
        let emitter = NotificationEmitter::new();
        assert_eq!(emitter.emit(Notification::HintAvailable { column: 3 }), 0);
    }

    #[test]
    fn test_every_subscriber_receives() {
        let emitter = NotificationEmitter::new();
        let mut rx1 = emitter.subscribe();
        let mut rx2 = emitter.clone().subscribe();

        assert_eq!(emitter.emit(Notification::HintAvailable { column: 2 }), 2);
        assert_eq!(rx1.try_recv().unwrap(), Notification::HintAvailable { column: 2 });
        assert_eq!(rx2.try_recv().unwrap(), Notification::HintAvailable { column: 2 });
    }

    #[test]
    fn test_slow_receiver_lags() {
        let emitter = NotificationEmitter::with_capacity(2);
        let mut rx = emitter.subscribe();
        for column in 0..3 {
            emitter.emit(Notification::HintAvailable { column });
        }
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(1))
        ));
        assert_eq!(rx.try_recv().unwrap(), Notification::HintAvailable { column: 1 });
    }
}
