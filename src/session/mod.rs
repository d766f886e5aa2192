//! Session controller: lifecycle, turn-taking and the pending-move
//! workflow, for both same-device and online play.

mod controller;
mod notify;
mod state;

pub use controller::{MoveReport, Session};
pub use notify::{Notification, NotificationEmitter};
pub use state::{
    validate_name, validate_pair, GameOutcome, Mode, Move, OnlineSeat, Phase, PlayerInfo,
};
