//! Event-bus subscriber that fans member events out to live sessions.

use std::sync::Arc;

use async_trait::async_trait;
use carebridge_core::events::{HookError, MemberEvent, MemberHook};
use tracing::{debug, warn};

use super::session::{SessionRegistry, SessionSendError};
use super::wire::Notification;

/// Delivers each member event to every live session in the owning
/// caregiver's room.
///
/// Delivery is best-effort: zero sessions drops the event silently, a full
/// session buffer drops that session's copy, and nothing here ever fails
/// the publisher.
pub struct NotificationDispatcher {
    registry: Arc<SessionRegistry>,
}

impl NotificationDispatcher {
    /// Create a dispatcher delivering through `registry`.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl MemberHook for NotificationDispatcher {
    fn name(&self) -> &str {
        "notification_dispatcher"
    }

    async fn handle(&self, event: &MemberEvent) -> Result<(), HookError> {
        let sessions = self.registry.sessions_for(&event.caregiver_id);
        if sessions.is_empty() {
            debug!(
                caregiver_id = %event.caregiver_id,
                kind = %event.kind,
                "No live sessions for event"
            );
            return Ok(());
        }

        let notification = Notification::from_event(event);

        let mut delivered = 0usize;
        for session in &sessions {
            match session.notify(notification.clone()) {
                Ok(()) => delivered += 1,
                Err(SessionSendError::Lagging) => {
                    warn!(
                        session_id = %session.id(),
                        caregiver_id = %event.caregiver_id,
                        "Session buffer full; notification dropped"
                    );
                }
                Err(SessionSendError::Closed) => {
                    debug!(
                        session_id = %session.id(),
                        "Session gone before delivery"
                    );
                }
            }
        }

        debug!(
            caregiver_id = %event.caregiver_id,
            kind = %event.kind,
            delivered,
            sessions = sessions.len(),
            "Dispatched notification"
        );
        Ok(())
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher").finish_non_exhaustive()
    }
}
