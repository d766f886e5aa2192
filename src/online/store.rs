//! The shared room record: an async key-value surface addressed by room
//! code, with change subscriptions.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::RoomError;

use super::room::{MoveUpdate, OnlineRoomState, RoomCode};

/// Backend holding room records. Every successful write is broadcast to the
/// room's subscribers as a full snapshot of the new record.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Create a record under `code`. Fails with `AlreadyExists` when taken.
    async fn create(&self, code: &RoomCode, room: OnlineRoomState) -> Result<(), RoomError>;

    async fn fetch(&self, code: &RoomCode) -> Result<Option<OnlineRoomState>, RoomError>;

    /// Write `player2Name` and activate the room, only if seat two is free.
    /// Returns the record as written.
    async fn claim_guest_seat(
        &self,
        code: &RoomCode,
        name: &str,
    ) -> Result<OnlineRoomState, RoomError>;

    /// Apply a move, only if the record still lists the mover as the
    /// player to move.
    async fn commit_move(&self, code: &RoomCode, update: &MoveUpdate) -> Result<(), RoomError>;

    /// Clear the board for a rematch, keeping both seats, but only while the
    /// round is over. Returns `false` when the record is already in play.
    async fn restart(&self, code: &RoomCode) -> Result<bool, RoomError>;

    async fn subscribe(
        &self,
        code: &RoomCode,
    ) -> Result<broadcast::Receiver<OnlineRoomState>, RoomError>;
}

struct RoomEntry {
    room: OnlineRoomState,
    tx: broadcast::Sender<OnlineRoomState>,
}

impl RoomEntry {
    fn publish(&self) {
        // No subscribers is fine; the record itself is the source of truth.
        let _ = self.tx.send(self.room.clone());
    }
}

/// In-process store shared by every peer holding the same `Arc`.
pub struct MemoryRoomStore {
    rooms: Mutex<HashMap<RoomCode, RoomEntry>>,
    event_capacity: usize,
}

impl MemoryRoomStore {
    pub fn new(event_capacity: usize) -> Self {
        MemoryRoomStore {
            rooms: Mutex::new(HashMap::new()),
            event_capacity: event_capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.lock().is_empty()
    }

    fn with_room<T>(
        &self,
        code: &RoomCode,
        f: impl FnOnce(&mut RoomEntry) -> Result<T, RoomError>,
    ) -> Result<T, RoomError> {
        let mut rooms = self.rooms.lock();
        let entry = rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.to_string()))?;
        f(entry)
    }
}

impl Default for MemoryRoomStore {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn create(&self, code: &RoomCode, room: OnlineRoomState) -> Result<(), RoomError> {
        let mut rooms = self.rooms.lock();
        if rooms.contains_key(code) {
            return Err(RoomError::AlreadyExists(code.to_string()));
        }
        let (tx, _) = broadcast::channel(self.event_capacity);
        debug!(room = %code, "room record created");
        rooms.insert(code.clone(), RoomEntry { room, tx });
        Ok(())
    }

    async fn fetch(&self, code: &RoomCode) -> Result<Option<OnlineRoomState>, RoomError> {
        Ok(self.rooms.lock().get(code).map(|entry| entry.room.clone()))
    }

    async fn claim_guest_seat(
        &self,
        code: &RoomCode,
        name: &str,
    ) -> Result<OnlineRoomState, RoomError> {
        self.with_room(code, |entry| {
            if entry.room.player2_name.is_some() {
                return Err(RoomError::Full(code.to_string()));
            }
            entry.room.player2_name = Some(name.to_string());
            entry.room.game_active = true;
            entry.publish();
            Ok(entry.room.clone())
        })
    }

    async fn commit_move(&self, code: &RoomCode, update: &MoveUpdate) -> Result<(), RoomError> {
        self.with_room(code, |entry| {
            if entry.room.current_player != update.mover {
                return Err(RoomError::TurnConflict {
                    expected: update.mover,
                    found: entry.room.current_player.number(),
                });
            }
            entry.room.apply_move(update);
            entry.publish();
            Ok(())
        })
    }

    async fn restart(&self, code: &RoomCode) -> Result<bool, RoomError> {
        self.with_room(code, |entry| {
            if entry.room.game_active {
                return Ok(false);
            }
            entry.room.restart();
            entry.publish();
            Ok(true)
        })
    }

    async fn subscribe(
        &self,
        code: &RoomCode,
    ) -> Result<broadcast::Receiver<OnlineRoomState>, RoomError> {
        self.with_room(code, |entry| Ok(entry.tx.subscribe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Player};
    use crate::online::LastMove;

    fn code() -> RoomCode {
        RoomCode::parse("ABC123").unwrap()
    }

    fn opening_move(mover: Player) -> MoveUpdate {
        let mut board = Board::new();
        let row = board.drop_piece(3, mover).unwrap();
        MoveUpdate {
            mover,
            board,
            current_player: mover.other(),
            game_active: true,
            last_move: LastMove {
                row,
                column: 3,
                player: mover,
                is_win: false,
                is_draw: false,
                timestamp: 1,
            },
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_code() {
        let store = MemoryRoomStore::default();
        store
            .create(&code(), OnlineRoomState::hosted("Ann", 0))
            .await
            .unwrap();
        let err = store
            .create(&code(), OnlineRoomState::hosted("Cy", 0))
            .await
            .unwrap_err();
        assert_eq!(err, RoomError::AlreadyExists("ABC123".into()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_claim_seat_once() {
        let store = MemoryRoomStore::default();
        store
            .create(&code(), OnlineRoomState::hosted("Ann", 0))
            .await
            .unwrap();

        let room = store.claim_guest_seat(&code(), "Bo").await.unwrap();
        assert_eq!(room.player2_name.as_deref(), Some("Bo"));
        assert!(room.game_active);

        let err = store.claim_guest_seat(&code(), "Cy").await.unwrap_err();
        assert_eq!(err, RoomError::Full("ABC123".into()));
    }

    #[tokio::test]
    async fn test_unknown_room() {
        let store = MemoryRoomStore::default();
        assert_eq!(store.fetch(&code()).await.unwrap(), None);
        assert_eq!(
            store.claim_guest_seat(&code(), "Bo").await.unwrap_err(),
            RoomError::NotFound("ABC123".into())
        );
        assert!(store.subscribe(&code()).await.is_err());
    }

    #[tokio::test]
    async fn test_commit_requires_mover_to_hold_the_turn() {
        let store = MemoryRoomStore::default();
        store
            .create(&code(), OnlineRoomState::hosted("Ann", 0))
            .await
            .unwrap();

        let err = store
            .commit_move(&code(), &opening_move(Player::Two))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RoomError::TurnConflict {
                expected: Player::Two,
                found: 1
            }
        );

        store
            .commit_move(&code(), &opening_move(Player::One))
            .await
            .unwrap();
        let room = store.fetch(&code()).await.unwrap().unwrap();
        assert_eq!(room.current_player, Player::Two);
        assert_eq!(room.last_move.map(|m| m.column), Some(3));
    }

    #[tokio::test]
    async fn test_writes_are_broadcast() {
        let store = MemoryRoomStore::default();
        store
            .create(&code(), OnlineRoomState::hosted("Ann", 0))
            .await
            .unwrap();
        let mut rx = store.subscribe(&code()).await.unwrap();

        store.claim_guest_seat(&code(), "Bo").await.unwrap();
        let mut finishing = opening_move(Player::One);
        finishing.game_active = false;
        store.commit_move(&code(), &finishing).await.unwrap();
        assert!(store.restart(&code()).await.unwrap());

        assert_eq!(rx.recv().await.unwrap().player2_name.as_deref(), Some("Bo"));
        assert!(rx.recv().await.unwrap().last_move.is_some());
        assert!(rx.recv().await.unwrap().is_fresh_round());
    }

    #[tokio::test]
    async fn test_restart_only_when_round_is_over() {
        let store = MemoryRoomStore::default();
        store
            .create(&code(), OnlineRoomState::hosted("Ann", 0))
            .await
            .unwrap();
        store.claim_guest_seat(&code(), "Bo").await.unwrap();
        store
            .commit_move(&code(), &opening_move(Player::One))
            .await
            .unwrap();

        assert!(!store.restart(&code()).await.unwrap());
        let room = store.fetch(&code()).await.unwrap().unwrap();
        assert_eq!(room.board.disc_count(), 1);
        assert_eq!(room.current_player, Player::Two);
    }
}
