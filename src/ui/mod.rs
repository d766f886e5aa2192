//! Terminal front end for same-device play: name setup, the game board and
//! a resume prompt for a saved game.

mod app;
mod game_view;

pub use app::{App, Screen};
