//! Translation of shared-record notifications into typed session input.
//!
//! The forwarder owns the store subscription; the session only ever sees
//! [`RemoteEvent`]s drained from its input queue, so network callback timing
//! never mutates game state directly.

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::game::Player;

use super::room::{LastMove, OnlineRoomState, RoomCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    /// The record names a guest in seat two.
    PeerJoined { name: String },
    /// The record carries a `lastMove`; the session decides whether it is new.
    RemoteMoveApplied {
        last_move: LastMove,
        current_player: Player,
    },
    /// Mirror of `gameActive`.
    RoomFlagsChanged { game_active: bool },
    /// Board cleared with no `lastMove`: a rematch was started.
    RoomRestarted,
}

/// Map one room snapshot to the events it implies, in application order.
pub fn translate(room: &OnlineRoomState) -> Vec<RemoteEvent> {
    let mut events = Vec::with_capacity(3);

    if let Some(name) = &room.player2_name {
        events.push(RemoteEvent::PeerJoined { name: name.clone() });
    }

    match room.last_move {
        Some(last_move) => events.push(RemoteEvent::RemoteMoveApplied {
            last_move,
            current_player: room.current_player,
        }),
        None if room.is_fresh_round() && room.game_active => {
            events.push(RemoteEvent::RoomRestarted);
        }
        None => {}
    }

    events.push(RemoteEvent::RoomFlagsChanged {
        game_active: room.game_active,
    });
    events
}

/// Spawn a task that forwards translated room snapshots into `tx` until the
/// subscription closes or the receiving side is dropped.
pub fn spawn_forwarder(
    code: RoomCode,
    mut rx: broadcast::Receiver<OnlineRoomState>,
    tx: mpsc::UnboundedSender<RemoteEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let room = match rx.recv().await {
                Ok(room) => room,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Skipped snapshots are gone. The next one carries the
                    // full record, but a skipped restart is not replayed.
                    warn!(room = %code, skipped, "room subscription lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(room = %code, "room subscription closed");
                    break;
                }
            };

            for event in translate(&room) {
                if tx.send(event).is_err() {
                    debug!(room = %code, "session input queue dropped");
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Board;

    fn joined_room() -> OnlineRoomState {
        let mut room = OnlineRoomState::hosted("Ann", 0);
        room.player2_name = Some("Bo".into());
        room.game_active = true;
        room
    }

    #[test]
    fn test_waiting_room_only_reports_flags() {
        let room = OnlineRoomState::hosted("Ann", 0);
        assert_eq!(
            translate(&room),
            vec![RemoteEvent::RoomFlagsChanged { game_active: false }]
        );
    }

    #[test]
    fn test_joined_fresh_room() {
        assert_eq!(
            translate(&joined_room()),
            vec![
                RemoteEvent::PeerJoined { name: "Bo".into() },
                RemoteEvent::RoomRestarted,
                RemoteEvent::RoomFlagsChanged { game_active: true },
            ]
        );
    }

    #[test]
    fn test_move_snapshot() {
        let mut room = joined_room();
        let mut board = Board::new();
        board.drop_piece(2, Player::One).unwrap();
        let last_move = LastMove {
            row: 5,
            column: 2,
            player: Player::One,
            is_win: false,
            is_draw: false,
            timestamp: 99,
        };
        room.board = board;
        room.current_player = Player::Two;
        room.last_move = Some(last_move);

        let events = translate(&room);
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[1],
            RemoteEvent::RemoteMoveApplied {
                last_move,
                current_player: Player::Two,
            }
        );
    }

    #[tokio::test]
    async fn test_forwarder_translates_and_stops_on_close() {
        let (room_tx, room_rx) = broadcast::channel(8);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let code = RoomCode::parse("QWERTY").unwrap();
        let handle = spawn_forwarder(code, room_rx, tx);

        room_tx.send(OnlineRoomState::hosted("Ann", 0)).unwrap();
        drop(room_tx);
        handle.await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(RemoteEvent::RoomFlagsChanged { game_active: false })
        );
        assert_eq!(rx.recv().await, None);
    }
}
