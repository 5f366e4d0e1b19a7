//! Live session handles and the per-caregiver room registry.

use std::collections::HashMap;
use std::time::Instant;

use carebridge_core::generate_id;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use super::wire::Notification;

/// Message pushed to a session's outbound channel.
#[derive(Debug, Clone)]
pub enum SessionMessage {
    /// Deliver a notification to the client.
    Notify(Notification),
    /// Ask the session task to close the connection.
    Close,
}

/// Error returned when a send to a session fails.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionSendError {
    /// The session's outbound buffer is full; the message was dropped.
    #[error("session outbound buffer full")]
    Lagging,
    /// The session task is gone.
    #[error("session closed")]
    Closed,
}

/// Handle for sending messages to one connected client.
///
/// The caregiver binding is fixed at creation; a handle can never move into
/// another caregiver's room.
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    caregiver_id: String,
    joined_at: Instant,
    sender: mpsc::Sender<SessionMessage>,
}

impl SessionHandle {
    /// Create a handle over `sender`, bound to `caregiver_id`.
    pub fn new(caregiver_id: impl Into<String>, sender: mpsc::Sender<SessionMessage>) -> Self {
        Self {
            id: generate_id(),
            caregiver_id: caregiver_id.into(),
            joined_at: Instant::now(),
            sender,
        }
    }

    /// Unique id of this session.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Caregiver this session belongs to.
    pub fn caregiver_id(&self) -> &str {
        &self.caregiver_id
    }

    /// When this session was created.
    pub fn joined_at(&self) -> Instant {
        self.joined_at
    }

    /// Queue a notification without waiting.
    ///
    /// Sends never block the caller: a full buffer drops the message and
    /// reports [`SessionSendError::Lagging`].
    pub fn notify(&self, notification: Notification) -> Result<(), SessionSendError> {
        self.sender
            .try_send(SessionMessage::Notify(notification))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => SessionSendError::Lagging,
                mpsc::error::TrySendError::Closed(_) => SessionSendError::Closed,
            })
    }

    /// Ask the session task to close the connection.
    pub fn close(&self) -> Result<(), SessionSendError> {
        self.sender
            .try_send(SessionMessage::Close)
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => SessionSendError::Lagging,
                mpsc::error::TrySendError::Closed(_) => SessionSendError::Closed,
            })
    }

    /// Whether the session task has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("caregiver_id", &self.caregiver_id)
            .finish_non_exhaustive()
    }
}

/// Room registry mapping caregiver ids to their live sessions.
///
/// One lock serializes joins, leaves and reads. Lookups return a snapshot,
/// so dispatch never holds the lock across sends; a session joining during
/// a dispatch may miss that in-flight event.
#[derive(Default)]
pub struct SessionRegistry {
    rooms: RwLock<HashMap<String, Vec<SessionHandle>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `handle` to its caregiver's room. Re-joining with the same
    /// session id keeps a single entry.
    pub fn join(&self, handle: SessionHandle) {
        let caregiver_id = handle.caregiver_id().to_string();
        let session_id = handle.id().to_string();

        let mut rooms = self.rooms.write();
        let room = rooms.entry(caregiver_id.clone()).or_default();
        if room.iter().all(|h| h.id() != handle.id()) {
            room.push(handle);
        }
        drop(rooms);

        debug!(caregiver_id, session_id, "Session joined room");
    }

    /// Remove session `session_id` from `caregiver_id`'s room.
    ///
    /// No-op when already absent; a room with no sessions left is removed
    /// entirely.
    pub fn leave(&self, caregiver_id: &str, session_id: &str) {
        let mut rooms = self.rooms.write();
        if let Some(room) = rooms.get_mut(caregiver_id) {
            room.retain(|h| h.id() != session_id);
            if room.is_empty() {
                rooms.remove(caregiver_id);
            }
        }
        drop(rooms);

        debug!(caregiver_id, session_id, "Session left room");
    }

    /// Snapshot of the sessions currently in `caregiver_id`'s room.
    pub fn sessions_for(&self, caregiver_id: &str) -> Vec<SessionHandle> {
        self.rooms
            .read()
            .get(caregiver_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of sessions in one caregiver's room.
    pub fn session_count(&self, caregiver_id: &str) -> usize {
        self.rooms
            .read()
            .get(caregiver_id)
            .map(|room| room.len())
            .unwrap_or(0)
    }

    /// Total number of live sessions across all rooms.
    pub fn total_sessions(&self) -> usize {
        self.rooms.read().values().map(|room| room.len()).sum()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("total_sessions", &self.total_sessions())
            .finish_non_exhaustive()
    }
}
