use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::game::{suggest_move, Board, Player, WinningLine, COLS, ROWS};
use crate::online::{LastMove, MoveUpdate, OnlineRoomState, RemoteEvent, RoomCode};
use crate::persistence::SessionSnapshot;

use super::notify::{Notification, NotificationEmitter};
use super::state::{
    validate_name, validate_pair, GameOutcome, Mode, Move, OnlineSeat, Phase, PlayerInfo,
};

/// Result of a confirmed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub mv: Move,
    pub outcome: Option<GameOutcome>,
    /// Update to mirror into the room record; `None` in local games.
    pub outbound: Option<MoveUpdate>,
}

/// One game's lifecycle and turn-taking: the only long-lived mutable state.
///
/// Every operation runs to completion before returning, so at most one move
/// is ever in flight. Rejections leave the session untouched and are both
/// returned and emitted as [`Notification`]s.
#[derive(Debug)]
pub struct Session {
    mode: Mode,
    phase: Phase,
    board: Board,
    current_player: Player,
    players: [PlayerInfo; 2],
    pending_column: Option<usize>,
    history: Vec<Move>,
    move_count: usize,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    outcome: Option<GameOutcome>,
    winning_line: Option<WinningLine>,
    online: Option<OnlineSeat>,
    emitter: NotificationEmitter,
}

impl Session {
    pub fn new() -> Self {
        Self::with_emitter(NotificationEmitter::new())
    }

    pub fn with_emitter(emitter: NotificationEmitter) -> Self {
        Session {
            mode: Mode::Local,
            phase: Phase::Idle,
            board: Board::new(),
            current_player: Player::One,
            players: [PlayerInfo::default(), PlayerInfo::default()],
            pending_column: None,
            history: Vec::new(),
            move_count: 0,
            started_at: None,
            ended_at: None,
            outcome: None,
            winning_line: None,
            online: None,
            emitter,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.emitter.subscribe()
    }

    pub fn emitter(&self) -> &NotificationEmitter {
        &self.emitter
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn player(&self, player: Player) -> &PlayerInfo {
        &self.players[player.index()]
    }

    pub fn pending_column(&self) -> Option<usize> {
        self.pending_column
    }

    pub fn has_pending_move(&self) -> bool {
        self.pending_column.is_some()
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn winning_line(&self) -> Option<&WinningLine> {
        self.winning_line.as_ref()
    }

    pub fn online_seat(&self) -> Option<&OnlineSeat> {
        self.online.as_ref()
    }

    pub fn room_code(&self) -> Option<&RoomCode> {
        self.online.as_ref().map(|seat| &seat.code)
    }

    /// Whole seconds since the game started, frozen once it ends.
    pub fn elapsed_secs(&self) -> u64 {
        let Some(started) = self.started_at else {
            return 0;
        };
        let end = self.ended_at.unwrap_or_else(Utc::now);
        u64::try_from((end - started).num_seconds()).unwrap_or(0)
    }

    /// True when local input may act for the player to move.
    pub fn is_my_turn(&self) -> bool {
        self.check_can_act().is_ok()
    }

    // ---- lifecycle ----

    pub fn set_players(&mut self, player1: &str, player2: &str) -> Result<(), SessionError> {
        let (p1, p2) = validate_pair(player1, player2).map_err(|e| self.setup_rejected(e))?;
        self.players[0].name = p1;
        self.players[1].name = p2;
        Ok(())
    }

    /// Start a same-device game between two validated names.
    pub fn start_local(&mut self, player1: &str, player2: &str) -> Result<(), SessionError> {
        self.set_players(player1, player2)?;
        self.mode = Mode::Local;
        self.online = None;
        self.start();
        Ok(())
    }

    /// Idle/Ended → Active on a fresh board with player one to move.
    pub fn start(&mut self) {
        self.clear_board();
        self.phase = Phase::Active;
        self.started_at = Some(Utc::now());
        info!(
            mode = ?self.mode,
            player1 = %self.players[0].name,
            player2 = %self.players[1].name,
            "game started"
        );
        self.emit_board(None);
        self.emit_turn();
    }

    /// Back to Idle with an empty board. Scores are kept.
    pub fn reset(&mut self) {
        self.clear_board();
        self.phase = Phase::Idle;
        self.started_at = None;
        self.emit_board(None);
    }

    pub fn rematch(&mut self) {
        self.reset();
        if let Some(seat) = self.online.as_mut() {
            seat.room_active = true;
        }
        self.start();
    }

    /// Any state → Idle, forgetting players, scores and room.
    pub fn quit(&mut self) {
        let emitter = self.emitter.clone();
        *self = Session::with_emitter(emitter);
        info!("session quit");
        self.emit_board(None);
    }

    fn clear_board(&mut self) {
        self.board = Board::new();
        self.current_player = Player::One;
        self.pending_column = None;
        self.history.clear();
        self.move_count = 0;
        self.ended_at = None;
        self.outcome = None;
        self.winning_line = None;
    }

    // ---- move workflow ----

    /// Record `column` as the pending move. Returns the row the disc would
    /// land in. Replaces any earlier pending selection.
    pub fn select_column(&mut self, column: usize) -> Result<usize, SessionError> {
        self.check_can_act().map_err(|e| self.move_rejected(e))?;
        if column >= COLS {
            return Err(self.move_rejected(SessionError::InvalidColumn(column)));
        }
        let Some(row) = self.board.lowest_empty_row(column) else {
            return Err(self.move_rejected(SessionError::ColumnFull(column)));
        };

        self.pending_column = Some(column);
        self.emitter.emit(Notification::PendingMoveChanged {
            column: Some(column),
        });
        Ok(row)
    }

    /// Drop the current player's disc into the pending column.
    pub fn confirm_move(&mut self) -> Result<MoveReport, SessionError> {
        let Some(column) = self.pending_column else {
            return Err(self.move_rejected(SessionError::NoPendingMove));
        };
        self.check_can_act().map_err(|e| self.move_rejected(e))?;
        let Some(row) = self.board.lowest_empty_row(column) else {
            self.pending_column = None;
            return Err(self.move_rejected(SessionError::ColumnFull(column)));
        };

        let player = self.current_player;
        self.board.place(row, column, player);
        self.move_count += 1;
        let mv = Move {
            row,
            column,
            player,
            seq: self.move_count,
        };
        self.history.push(mv);
        self.pending_column = None;
        debug!(row, column, player = player.number(), seq = mv.seq, "move committed");
        self.emitter
            .emit(Notification::PendingMoveChanged { column: None });
        self.emit_board(Some((row, column)));

        let line = self.board.check_win(row, column);
        let outcome = if line.is_some() {
            Some(GameOutcome::Winner(player))
        } else if self.board.check_draw() {
            Some(GameOutcome::Draw)
        } else {
            None
        };
        if outcome.is_none() {
            self.current_player = player.other();
        }

        let outbound = self.online.as_mut().map(|seat| {
            let timestamp = seat.next_timestamp(Utc::now().timestamp_millis());
            seat.last_applied_ts = timestamp;
            MoveUpdate {
                mover: player,
                board: self.board,
                current_player: self.current_player,
                game_active: outcome.is_none(),
                last_move: LastMove {
                    row,
                    column,
                    player,
                    is_win: matches!(outcome, Some(GameOutcome::Winner(_))),
                    is_draw: outcome == Some(GameOutcome::Draw),
                    timestamp,
                },
            }
        });

        match outcome {
            Some(GameOutcome::Winner(winner)) => self.finish(Some(winner), line),
            Some(GameOutcome::Draw) => self.finish(None, None),
            None => self.emit_turn(),
        }

        Ok(MoveReport {
            mv,
            outcome,
            outbound,
        })
    }

    /// Clear the pending selection. Returns the column that was pending.
    pub fn cancel_move(&mut self) -> Option<usize> {
        let column = self.pending_column.take();
        if column.is_some() {
            self.emitter
                .emit(Notification::PendingMoveChanged { column: None });
        }
        column
    }

    /// Take back the last move. Local games only; reopens a finished game.
    pub fn undo_move(&mut self) -> Result<Move, SessionError> {
        if self.mode == Mode::Online {
            return Err(self.move_rejected(SessionError::UndoUnsupportedOnline));
        }
        let Some(mv) = self.history.pop() else {
            return Err(self.move_rejected(SessionError::NothingToUndo));
        };

        self.board.clear(mv.row, mv.column);
        self.current_player = mv.player;
        self.move_count -= 1;
        self.pending_column = None;
        if self.phase == Phase::Ended {
            if let Some(GameOutcome::Winner(winner)) = self.outcome {
                let score = &mut self.players[winner.index()].score;
                *score = score.saturating_sub(1);
            }
            self.phase = Phase::Active;
            self.outcome = None;
            self.winning_line = None;
            self.ended_at = None;
        }

        debug!(row = mv.row, column = mv.column, seq = mv.seq, "move undone");
        self.emit_board(None);
        self.emit_turn();
        Ok(mv)
    }

    /// Suggested column for the player to move, if a game is running.
    pub fn show_hint(&self) -> Option<usize> {
        if !self.is_active() {
            return None;
        }
        let column = suggest_move(&self.board, self.current_player)?;
        self.emitter.emit(Notification::HintAvailable { column });
        Some(column)
    }

    // ---- online ----

    /// Enter a freshly created room as host, waiting for a guest.
    pub fn host_online(&mut self, code: RoomCode, name: &str) -> Result<(), SessionError> {
        let name = validate_name(name).map_err(|e| self.setup_rejected(e))?;
        self.quit();
        self.mode = Mode::Online;
        self.players[0].name = name;
        info!(room = %code, "hosting room");
        self.online = Some(OnlineSeat::host(code));
        Ok(())
    }

    /// Enter a joined room as guest, adopting its board and turn.
    pub fn join_online(
        &mut self,
        code: RoomCode,
        name: &str,
        room: &OnlineRoomState,
    ) -> Result<(), SessionError> {
        let name = validate_name(name).map_err(|e| self.setup_rejected(e))?;
        self.quit();
        self.mode = Mode::Online;
        self.players[0].name = room.player1_name.clone();
        self.players[1].name = name;

        let last_ts = room.last_move.map_or(0, |m| m.timestamp);
        info!(room = %code, host = %room.host_name, "joined room");
        self.online = Some(OnlineSeat::guest(code, last_ts));

        self.board = room.board;
        self.current_player = room.current_player;
        self.move_count = room.board.disc_count();
        self.phase = Phase::Active;
        self.started_at = Some(Utc::now());
        self.emit_board(None);
        self.emit_turn();
        Ok(())
    }

    /// Start a new round from a record the other peer already restarted,
    /// taking its board, turn and newest move as the local state.
    pub fn adopt_round(&mut self, room: &OnlineRoomState) -> Result<(), SessionError> {
        if self.online.is_none() {
            return Err(SessionError::NotOnline);
        }
        self.rematch();
        self.board = room.board;
        self.current_player = room.current_player;
        self.move_count = room.board.disc_count();
        if let Some(seat) = self.online.as_mut() {
            seat.room_active = room.game_active;
            if let Some(last) = room.last_move {
                seat.last_applied_ts = seat.last_applied_ts.max(last.timestamp);
            }
        }
        info!(moves = self.move_count, "adopted restarted room");
        self.emit_board(room.last_move.map(|m| (m.row, m.column)));
        self.emit_turn();
        Ok(())
    }

    /// Apply one event from the room subscription. Returns whether local
    /// state changed.
    pub fn apply_remote(&mut self, event: RemoteEvent) -> Result<bool, SessionError> {
        let Some(seat) = self.online.as_mut() else {
            return Err(SessionError::NotOnline);
        };

        match event {
            RemoteEvent::PeerJoined { name } => {
                if !seat.is_host || !self.players[1].name.is_empty() {
                    return Ok(false);
                }
                seat.room_active = true;
                info!(room = %seat.code, guest = %name, "player joined");
                self.players[1].name = name.clone();
                self.emitter.emit(Notification::PlayerJoined { name });
                self.start();
                Ok(true)
            }
            RemoteEvent::RemoteMoveApplied {
                last_move,
                current_player,
            } => self.apply_remote_move(last_move, current_player),
            RemoteEvent::RoomFlagsChanged { game_active } => {
                let changed = seat.room_active != game_active;
                seat.room_active = game_active;
                Ok(changed)
            }
            RemoteEvent::RoomRestarted => {
                // Only a finished game follows the other peer into a rematch.
                if self.phase != Phase::Ended {
                    return Ok(false);
                }
                seat.room_active = true;
                info!(room = %seat.code, "rematch started by peer");
                self.start();
                Ok(true)
            }
        }
    }

    fn apply_remote_move(
        &mut self,
        last_move: LastMove,
        current_player: Player,
    ) -> Result<bool, SessionError> {
        let Some(seat) = self.online.as_mut() else {
            return Err(SessionError::NotOnline);
        };
        // Replayed or out-of-order notification.
        if last_move.timestamp <= seat.last_applied_ts {
            return Ok(false);
        }
        // Own move echoed back by the room.
        if last_move.player == seat.me {
            seat.last_applied_ts = last_move.timestamp;
            return Ok(false);
        }
        seat.last_applied_ts = last_move.timestamp;

        if self.phase != Phase::Active {
            warn!(phase = ?self.phase, "ignoring remote move outside an active game");
            return Ok(false);
        }
        let LastMove { row, column, player, .. } = last_move;
        let fits = row < ROWS && column < COLS && self.board.lowest_empty_row(column) == Some(row);
        if !fits {
            warn!(row, column, "remote move does not fit the local board");
            return Err(self.move_rejected(SessionError::RemoteMoveRejected { row, column }));
        }

        self.board.place(row, column, player);
        self.move_count += 1;
        self.history.push(Move {
            row,
            column,
            player,
            seq: self.move_count,
        });
        self.current_player = current_player;
        self.pending_column = None;
        debug!(row, column, player = player.number(), "remote move applied");
        self.emit_board(Some((row, column)));

        let line = self.board.check_win(row, column);
        if last_move.is_win || line.is_some() {
            self.finish(Some(player), line);
        } else if last_move.is_draw || self.board.check_draw() {
            self.finish(None, None);
        } else {
            self.emit_turn();
        }
        Ok(true)
    }

    // ---- persistence ----

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SessionSnapshot::VERSION,
            mode: self.mode,
            phase: self.phase,
            board: self.board,
            current_player: self.current_player,
            players: self.players.clone(),
            pending_column: self.pending_column,
            history: self.history.clone(),
            move_count: self.move_count,
            started_at: self.started_at,
            ended_at: self.ended_at,
            outcome: self.outcome,
            online: self.online.clone(),
            saved_at: Utc::now(),
        }
    }

    /// Rebuild a session from a saved snapshot, keeping this session's
    /// notification subscribers.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        let emitter = self.emitter.clone();
        *self = Session {
            mode: snapshot.mode,
            phase: snapshot.phase,
            board: snapshot.board,
            current_player: snapshot.current_player,
            players: snapshot.players,
            pending_column: snapshot.pending_column,
            history: snapshot.history,
            move_count: snapshot.move_count,
            started_at: snapshot.started_at,
            ended_at: snapshot.ended_at,
            outcome: snapshot.outcome,
            winning_line: None,
            online: snapshot.online,
            emitter,
        };
        if let (Some(GameOutcome::Winner(_)), Some(last)) = (self.outcome, self.history.last()) {
            self.winning_line = self.board.check_win(last.row, last.column);
        }
        info!(moves = self.move_count, mode = ?self.mode, "session restored");
        self.emit_board(None);
        if self.is_active() {
            self.emit_turn();
        }
        if let Some(column) = self.pending_column {
            self.emitter.emit(Notification::PendingMoveChanged {
                column: Some(column),
            });
        }
    }

    // ---- helpers ----

    fn check_can_act(&self) -> Result<(), SessionError> {
        if self.phase != Phase::Active {
            return Err(SessionError::GameNotActive);
        }
        if let Some(seat) = &self.online {
            if !seat.room_active {
                return Err(SessionError::GameNotActive);
            }
            if self.current_player != seat.me {
                return Err(SessionError::NotYourTurn);
            }
        }
        Ok(())
    }

    fn finish(&mut self, winner: Option<Player>, line: Option<WinningLine>) {
        self.phase = Phase::Ended;
        self.ended_at = Some(Utc::now());
        self.pending_column = None;
        let outcome = match winner {
            Some(player) => {
                self.players[player.index()].score += 1;
                GameOutcome::Winner(player)
            }
            None => GameOutcome::Draw,
        };
        self.outcome = Some(outcome);
        self.winning_line = line;

        let winner_name = winner.map(|p| self.players[p.index()].name.clone());
        let elapsed_secs = self.elapsed_secs();
        info!(
            ?outcome,
            moves = self.move_count,
            elapsed_secs,
            "game ended"
        );
        self.emitter.emit(Notification::GameEnded {
            outcome,
            winner_name,
            winning_cells: self
                .winning_line
                .as_ref()
                .map(|l| l.cells.clone())
                .unwrap_or_default(),
            move_count: self.move_count,
            elapsed_secs,
        });
    }

    fn move_rejected(&self, reason: SessionError) -> SessionError {
        debug!(%reason, "move rejected");
        self.emitter.emit(Notification::MoveRejected {
            reason: reason.clone(),
        });
        reason
    }

    fn setup_rejected(&self, reason: SessionError) -> SessionError {
        debug!(%reason, "setup rejected");
        self.emitter.emit(Notification::SetupRejected {
            reason: reason.clone(),
        });
        reason
    }

    fn emit_board(&self, landed: Option<(usize, usize)>) {
        self.emitter.emit(Notification::BoardChanged {
            board: self.board,
            landed,
        });
    }

    fn emit_turn(&self) {
        self.emitter.emit(Notification::TurnChanged {
            player: self.current_player,
            name: self.players[self.current_player.index()].name.clone(),
        });
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
