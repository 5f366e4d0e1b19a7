//! Wire-level notification messages.
//!
//! A notification is the client-facing projection of a member event. The
//! caregiver id selects the target room when dispatching and is deliberately
//! absent from the payload.

use carebridge_core::events::{MemberEvent, MemberEventKind};
use carebridge_core::format_rfc3339;
use serde::{Deserialize, Serialize};

/// Message sent to live sessions: `{"type": ..., "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Event kind, serialized as the wire discriminator
    /// (`member_added`, `member_updated`, `member_deleted`).
    #[serde(rename = "type")]
    pub kind: MemberEventKind,
    pub data: NotificationData,
}

/// Payload fields of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub member_id: String,
    /// RFC 3339 rendering of the event timestamp.
    pub timestamp: String,
}

impl Notification {
    /// Project `event` into its wire form.
    pub fn from_event(event: &MemberEvent) -> Self {
        Self {
            kind: event.kind,
            data: NotificationData {
                member_id: event.member_id.clone(),
                timestamp: format_rfc3339(event.timestamp),
            },
        }
    }

    /// Serialized JSON text for transport.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
