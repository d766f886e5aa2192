use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{RoomError, SessionError};
use crate::persistence::SessionSnapshot;
use crate::session::{validate_name, MoveReport, Notification, Phase, Session};

use super::room::{OnlineRoomState, RoomCode};
use super::store::RoomStore;
use super::sync::{spawn_forwarder, translate, RemoteEvent};

/// Configuration for online play.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OnlineConfig {
    /// How many generated codes to try before giving up on room creation.
    pub code_attempts: u32,
    /// Buffered room snapshots per subscriber.
    pub event_capacity: usize,
}

impl Default for OnlineConfig {
    fn default() -> Self {
        OnlineConfig {
            code_attempts: 5,
            event_capacity: 64,
        }
    }
}

/// A [`Session`] wired to a shared room record.
///
/// The async operations are the only suspension points. Remote changes are
/// queued by a forwarder task and applied to the session only when the
/// owner calls [`OnlinePeer::pump`] or [`OnlinePeer::next_event`].
pub struct OnlinePeer<S: RoomStore> {
    store: Arc<S>,
    session: Session,
    config: OnlineConfig,
    events: Option<mpsc::UnboundedReceiver<RemoteEvent>>,
    forwarder: Option<JoinHandle<()>>,
}

impl<S: RoomStore + 'static> OnlinePeer<S> {
    pub fn new(store: Arc<S>, config: OnlineConfig) -> Self {
        Self::with_session(store, Session::new(), config)
    }

    pub fn with_session(store: Arc<S>, session: Session, config: OnlineConfig) -> Self {
        OnlinePeer {
            store,
            session,
            config,
            events: None,
            forwarder: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Direct access for the synchronous operations (select, cancel, hint).
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn is_subscribed(&self) -> bool {
        self.forwarder.is_some()
    }

    /// Create a room with a fresh code and wait in it as host.
    pub async fn create_room(&mut self, name: &str) -> Result<RoomCode, RoomError> {
        match self.try_create_room(name).await {
            Ok(code) => Ok(code),
            Err(reason) => {
                warn!(%reason, "room creation failed");
                self.session.emitter().emit(Notification::RoomCreateFailed {
                    reason: reason.clone(),
                });
                Err(reason)
            }
        }
    }

    async fn try_create_room(&mut self, name: &str) -> Result<RoomCode, RoomError> {
        let name = validate_name(name)?;
        let created_at = Utc::now().timestamp_millis();

        let mut attempts = 0;
        let code = loop {
            attempts += 1;
            let code = RoomCode::generate(&mut rand::rng());
            match self
                .store
                .create(&code, OnlineRoomState::hosted(&name, created_at))
                .await
            {
                Ok(()) => break code,
                Err(RoomError::AlreadyExists(_)) if attempts < self.config.code_attempts => {
                    debug!(room = %code, attempts, "room code taken, retrying");
                }
                Err(e) => return Err(e),
            }
        };

        let rx = self.store.subscribe(&code).await?;
        self.session.host_online(code.clone(), &name)?;
        self.attach(code.clone(), rx).await;
        info!(room = %code, "room created");
        self.session.emitter().emit(Notification::RoomCreated { code: code.clone() });
        Ok(code)
    }

    /// Join an existing room as guest. `code` is normalized first.
    pub async fn join_room(&mut self, code: &str, name: &str) -> Result<(), RoomError> {
        match self.try_join_room(code, name).await {
            Ok(()) => Ok(()),
            Err(reason) => {
                warn!(%reason, "room join failed");
                self.session.emitter().emit(Notification::RoomJoinFailed {
                    reason: reason.clone(),
                });
                Err(reason)
            }
        }
    }

    async fn try_join_room(&mut self, code: &str, name: &str) -> Result<(), RoomError> {
        let code = RoomCode::parse(code)?;
        let name = validate_name(name)?;
        let room = self.store.claim_guest_seat(&code, &name).await?;
        let rx = self.store.subscribe(&code).await?;
        self.session.join_online(code.clone(), &name, &room)?;
        self.attach(code, rx).await;
        Ok(())
    }

    /// Commit the pending move locally, then mirror it into the room.
    ///
    /// A failed write does not roll the local move back; it is reported as
    /// [`Notification::SyncFailed`] and returned.
    pub async fn confirm_move(&mut self) -> Result<MoveReport, RoomError> {
        let report = self.session.confirm_move()?;
        let (Some(update), Some(code)) = (report.outbound, self.session.room_code().cloned())
        else {
            return Ok(report);
        };

        if let Err(reason) = self.store.commit_move(&code, &update).await {
            return Err(self.sync_failed(&code, reason));
        }
        Ok(report)
    }

    /// Start another round in the same room once the current one is over.
    /// Returns `false` while a game is still running.
    ///
    /// If the other peer already restarted the room, the record is left
    /// alone and the new round is adopted from it, including any moves
    /// made since.
    pub async fn rematch(&mut self) -> Result<bool, RoomError> {
        let Some(code) = self.session.room_code().cloned() else {
            return Err(SessionError::NotOnline.into());
        };
        if self.session.phase() != Phase::Ended {
            return Ok(false);
        }
        match self.store.restart(&code).await {
            Ok(true) => {
                self.session.rematch();
                return Ok(true);
            }
            Ok(false) => {}
            Err(reason) => return Err(self.sync_failed(&code, reason)),
        }

        debug!(room = %code, "room already restarted by peer, adopting record");
        let room = match self.store.fetch(&code).await {
            Ok(Some(room)) => room,
            Ok(None) => {
                let reason = RoomError::NotFound(code.to_string());
                return Err(self.sync_failed(&code, reason));
            }
            Err(reason) => return Err(self.sync_failed(&code, reason)),
        };
        self.session.adopt_round(&room)?;
        Ok(true)
    }

    fn sync_failed(&self, code: &RoomCode, reason: RoomError) -> RoomError {
        warn!(room = %code, %reason, "room write failed");
        self.session.emitter().emit(Notification::SyncFailed {
            reason: reason.clone(),
        });
        reason
    }

    /// Stop following the room and return to Idle.
    pub fn leave(&mut self) {
        if let Some(code) = self.session.room_code() {
            info!(room = %code, "leaving room");
        }
        self.detach();
        self.session.quit();
    }

    /// Restore a saved session and, if it was online, follow its room again.
    /// Moves made while away are picked up from the current record.
    pub async fn resume(&mut self, snapshot: SessionSnapshot) -> Result<(), RoomError> {
        self.detach();
        self.session.restore(snapshot);
        let Some(code) = self.session.room_code().cloned() else {
            return Ok(());
        };
        let rx = self.store.subscribe(&code).await?;
        self.attach(code, rx).await;
        Ok(())
    }

    /// Apply every queued remote event. Returns how many changed the session.
    pub fn pump(&mut self) -> usize {
        let mut pending = Vec::new();
        if let Some(events) = self.events.as_mut() {
            while let Ok(event) = events.try_recv() {
                pending.push(event);
            }
        }
        pending
            .into_iter()
            .map(|event| self.apply(event))
            .filter(|changed| *changed)
            .count()
    }

    /// Wait for the next remote event and apply it. `None` once the room
    /// subscription has ended or there is none.
    pub async fn next_event(&mut self) -> Option<bool> {
        let event = self.events.as_mut()?.recv().await?;
        Some(self.apply(event))
    }

    fn apply(&mut self, event: RemoteEvent) -> bool {
        debug!(?event, "applying remote event");
        match self.session.apply_remote(event) {
            Ok(changed) => changed,
            Err(reason) => {
                warn!(%reason, "remote event rejected");
                false
            }
        }
    }

    /// Replace any previous subscription. The current record is queued first
    /// so changes made before the subscription existed are not missed.
    async fn attach(&mut self, code: RoomCode, rx: broadcast::Receiver<OnlineRoomState>) {
        self.detach();
        let (tx, events) = mpsc::unbounded_channel();
        match self.store.fetch(&code).await {
            Ok(Some(room)) => {
                for event in translate(&room) {
                    let _ = tx.send(event);
                }
            }
            Ok(None) => warn!(room = %code, "room vanished after subscribing"),
            Err(reason) => warn!(room = %code, %reason, "failed to read room"),
        }
        self.forwarder = Some(spawn_forwarder(code, rx, tx));
        self.events = Some(events);
    }

    fn detach(&mut self) {
        if let Some(handle) = self.forwarder.take() {
            handle.abort();
        }
        self.events = None;
    }
}

impl<S: RoomStore> Drop for OnlinePeer<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.forwarder.take() {
            handle.abort();
        }
    }
}
