//! # Four in a Row
//!
//! A two-player four-in-a-row game, playable on one device or between two
//! peers sharing a last-writer-wins room record. Ships with a terminal UI
//! built with Ratatui for same-device play.
//!
//! ## Modules
//!
//! - [`game`]: Board engine: grid, gravity, win/draw detection, move advisor
//! - [`session`]: Session controller: lifecycle, turns, pending-move workflow
//! - [`online`]: Room record, store trait, sync protocol and online peer
//! - [`persistence`]: Resume snapshot saved across restarts
//! - [`ui`]: Terminal UI
//! - [`config`]: TOML configuration loading and validation
//! - [`logging`]: Tracing subscriber setup
//! - [`error`]: Structured error types

pub mod config;
pub mod error;
pub mod game;
pub mod logging;
pub mod online;
pub mod persistence;
pub mod session;
pub mod ui;
