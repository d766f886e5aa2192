//! Board engine: grid, gravity, win/draw detection and the move advisor.
//! Pure and deterministic, no knowledge of sessions or networking.

mod advisor;
mod board;
mod player;

pub use advisor::{suggest_move, winning_column, CENTER_OUT};
pub use board::{Axis, Board, Cell, MoveError, WinningLine, COLS, ROWS, WIN_LENGTH};
pub use player::Player;
