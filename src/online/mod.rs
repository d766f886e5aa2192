//! Online play over a shared, last-writer-wins room record.
//!
//! `room` defines the record and its wire format, `store` the backend it
//! lives in, `sync` turns record notifications into session input, and
//! `peer` drives a [`Session`](crate::session::Session) against a store.

mod peer;
mod room;
mod store;
mod sync;

pub use peer::{OnlineConfig, OnlinePeer};
pub use room::{LastMove, MoveUpdate, OnlineRoomState, RoomCode, CODE_LENGTH};
pub use store::{MemoryRoomStore, RoomStore};
pub use sync::{spawn_forwarder, translate, RemoteEvent};
