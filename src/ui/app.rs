use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{backend::Backend, Terminal};
use std::io;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;

use crate::config::PlayersConfig;
use crate::game::COLS;
use crate::persistence::{SaveTrigger, SessionSnapshot, SnapshotManager};
use crate::session::{GameOutcome, Notification, Phase, Session};

/// What the terminal is currently showing.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    /// A saved game was found at startup.
    Resume(SessionSnapshot),
    /// Entering the two player names.
    Setup { names: [String; 2], field: usize },
    Game,
}

pub struct App {
    session: Session,
    snapshots: SnapshotManager,
    notes: broadcast::Receiver<Notification>,
    screen: Screen,
    players: PlayersConfig,
    cursor: usize,
    landed: Option<(usize, usize)>,
    should_quit: bool,
    message: Option<String>,
}

impl App {
    pub fn new(
        snapshots: SnapshotManager,
        players: PlayersConfig,
        saved: Option<SessionSnapshot>,
    ) -> Self {
        let session = Session::new();
        let notes = session.subscribe();
        let screen = match saved {
            Some(snapshot) => Screen::Resume(snapshot),
            None => setup_screen(&players),
        };
        App {
            session,
            snapshots,
            notes,
            screen,
            players,
            cursor: COLS / 2,
            landed: None,
            should_quit: false,
            message: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn landed(&self) -> Option<(usize, usize)> {
        self.landed
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Main application loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal
                .draw(|f| super::game_view::render(f, self))
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

            if self.should_quit {
                break;
            }

            self.handle_events()?;
            self.autosave(SaveTrigger::Interval);
        }
        Ok(())
    }

    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                Event::FocusLost => self.autosave(SaveTrigger::Hidden),
                _ => {}
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.screen {
            Screen::Resume(_) => self.handle_resume_key(key),
            Screen::Setup { .. } => self.handle_setup_key(key),
            Screen::Game => self.handle_game_key(key),
        }
        self.drain_notifications();
    }

    fn handle_resume_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let screen = std::mem::replace(&mut self.screen, Screen::Game);
                if let Screen::Resume(snapshot) = screen {
                    self.session.restore(snapshot);
                    self.message = Some("Game resumed".into());
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                if let Err(e) = self.snapshots.discard() {
                    warn!(error = %e, "failed to discard snapshot");
                }
                self.screen = setup_screen(&self.players);
            }
            _ => {}
        }
    }

    fn handle_setup_key(&mut self, key: KeyEvent) {
        let Screen::Setup { names, field } = &mut self.screen else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down | KeyCode::Up => *field = 1 - *field,
            KeyCode::Backspace => {
                names[*field].pop();
            }
            KeyCode::Char(c) => names[*field].push(c),
            KeyCode::Enter => {
                let [p1, p2] = names.clone();
                if self.session.start_local(&p1, &p2).is_ok() {
                    self.screen = Screen::Game;
                    self.cursor = COLS / 2;
                }
            }
            _ => {}
        }
    }

    fn handle_game_key(&mut self, key: KeyEvent) {
        self.message = None;

        match key.code {
            KeyCode::Char('q') => {
                self.autosave(SaveTrigger::Unload);
                self.should_quit = true;
            }
            KeyCode::Char(c @ '1'..='7') => {
                self.cursor = c as usize - '1' as usize;
                let _ = self.session.select_column(self.cursor);
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                self.follow_cursor();
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(COLS - 1);
                self.follow_cursor();
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.session.pending_column() == Some(self.cursor) {
                    let _ = self.session.confirm_move();
                } else {
                    let _ = self.session.select_column(self.cursor);
                }
            }
            KeyCode::Esc => {
                self.session.cancel_move();
            }
            KeyCode::Char('u') => {
                let _ = self.session.undo_move();
            }
            KeyCode::Char('h') => {
                if let Some(column) = self.session.show_hint() {
                    self.cursor = column;
                }
            }
            KeyCode::Char('n') if self.session.phase() == Phase::Ended => {
                self.session.rematch();
                self.cursor = COLS / 2;
            }
            _ => {}
        }
    }

    /// Arrow keys move an existing selection along with the cursor.
    fn follow_cursor(&mut self) {
        if self.session.has_pending_move() {
            let _ = self.session.select_column(self.cursor);
        }
    }

    fn autosave(&mut self, trigger: SaveTrigger) {
        if let Err(e) = self.snapshots.persist(&self.session, trigger) {
            warn!(error = %e, ?trigger, "failed to save snapshot");
        }
    }

    /// Turn session notifications into the status line.
    fn drain_notifications(&mut self) {
        loop {
            let note = match self.notes.try_recv() {
                Ok(note) => note,
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            };
            match note {
                Notification::BoardChanged { landed, .. } => self.landed = landed,
                Notification::PendingMoveChanged { column: Some(column) } => {
                    self.message = Some(format!(
                        "Column {} selected, Enter to drop, Esc to cancel",
                        column + 1
                    ));
                }
                Notification::MoveRejected { reason } | Notification::SetupRejected { reason } => {
                    self.message = Some(capitalize(&reason.to_string()));
                }
                Notification::HintAvailable { column } => {
                    self.message = Some(format!("Hint: try column {}", column + 1));
                }
                Notification::GameEnded {
                    outcome,
                    winner_name,
                    move_count,
                    elapsed_secs,
                    ..
                } => {
                    let result = match (outcome, winner_name) {
                        (GameOutcome::Winner(_), Some(name)) => format!("{name} wins!"),
                        _ => "It's a draw!".to_string(),
                    };
                    self.message = Some(format!(
                        "{result} {move_count} moves in {}:{:02}. Press 'n' for a rematch.",
                        elapsed_secs / 60,
                        elapsed_secs % 60
                    ));
                    if let Err(e) = self.snapshots.discard() {
                        warn!(error = %e, "failed to discard snapshot");
                    }
                }
                _ => {}
            }
        }
    }
}

fn setup_screen(players: &PlayersConfig) -> Screen {
    Screen::Setup {
        names: [
            players.default_player1.clone(),
            players.default_player2.clone(),
        ],
        field: 0,
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Player;
    use crate::persistence::SnapshotConfig;

    fn app_in(dir: &std::path::Path, saved: Option<SessionSnapshot>) -> App {
        let snapshots = SnapshotManager::new(SnapshotConfig {
            path: dir.join("game.json"),
            autosave_interval_secs: 3600,
            enabled: true,
        });
        App::new(snapshots, PlayersConfig::default(), saved)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::from(code));
    }

    fn started(dir: &std::path::Path) -> App {
        let mut app = app_in(dir, None);
        press(&mut app, KeyCode::Enter);
        app
    }

    #[test]
    fn test_setup_starts_with_default_names() {
        let dir = tempfile::tempdir().unwrap();
        let app = started(dir.path());
        assert_eq!(app.screen(), &Screen::Game);
        assert_eq!(app.session().player(Player::One).name, "Player 1");
        assert_eq!(app.session().player(Player::Two).name, "Player 2");
    }

    #[test]
    fn test_setup_rejects_duplicate_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path(), None);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.screen(), Screen::Setup { .. }));
        assert_eq!(app.message(), Some("Players must have different names"));
    }

    #[test]
    fn test_number_key_selects_then_enter_drops() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = started(dir.path());
        press(&mut app, KeyCode::Char('5'));
        assert_eq!(app.session().pending_column(), Some(4));
        assert_eq!(app.cursor(), 4);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session().move_count(), 1);
        assert_eq!(app.landed(), Some((5, 4)));
        assert_eq!(app.session().current_player(), Player::Two);
    }

    #[test]
    fn test_escape_cancels_and_undo_reverts() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = started(dir.path());
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.session().pending_column(), None);

        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('u'));
        assert_eq!(app.session().move_count(), 0);
        assert!(app.session().board().is_empty());
    }

    #[test]
    fn test_win_message_and_rematch() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = started(dir.path());
        for key in ['4', '1', '4', '1', '4', '1', '4'] {
            press(&mut app, KeyCode::Char(key));
            press(&mut app, KeyCode::Enter);
        }
        assert_eq!(app.session().phase(), Phase::Ended);
        assert!(app.message().unwrap().starts_with("Player 1 wins! 7 moves"));

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.session().phase(), Phase::Active);
        assert_eq!(app.session().player(Player::One).score, 1);
    }

    #[test]
    fn test_quit_saves_and_resume_restores() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = started(dir.path());
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());

        let saved = app_in(dir.path(), None).snapshots.load().unwrap();
        let mut resumed = app_in(dir.path(), saved);
        assert!(matches!(resumed.screen(), Screen::Resume(_)));
        press(&mut resumed, KeyCode::Char('y'));
        assert_eq!(resumed.screen(), &Screen::Game);
        assert_eq!(resumed.session().move_count(), 1);
        assert_eq!(resumed.session().current_player(), Player::Two);
    }

    #[test]
    fn test_declining_resume_discards_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = started(dir.path());
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('q'));

        let saved = app_in(dir.path(), None).snapshots.load().unwrap();
        let mut fresh = app_in(dir.path(), saved);
        press(&mut fresh, KeyCode::Char('n'));
        assert!(matches!(fresh.screen(), Screen::Setup { .. }));
        assert!(fresh.snapshots.load().unwrap().is_none());
    }
}
