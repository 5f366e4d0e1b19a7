//! Event types for the member event system.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Kind of member change event.
///
/// The serialized strings double as the wire-level message discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberEventKind {
    /// A protected member was created
    #[serde(rename = "member_added")]
    Added,
    /// A protected member was updated
    #[serde(rename = "member_updated")]
    Updated,
    /// A protected member was deleted
    #[serde(rename = "member_deleted")]
    Deleted,
}

impl MemberEventKind {
    /// Returns the wire representation of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberEventKind::Added => "member_added",
            MemberEventKind::Updated => "member_updated",
            MemberEventKind::Deleted => "member_deleted",
        }
    }
}

impl std::fmt::Display for MemberEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event describing one committed change to a protected member record.
///
/// Created exactly once per successful persistence mutation, consumed by all
/// current bus subscribers, then discarded. The caregiver id is routing data
/// only; the wire projection sent to clients never includes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberEvent {
    /// Kind of change (added, updated, deleted)
    pub kind: MemberEventKind,
    /// Owner of the member record; selects the target room
    pub caregiver_id: String,
    /// The member record that changed
    pub member_id: String,
    /// When the mutation committed
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl MemberEvent {
    /// Create a new member event stamped with the current time.
    pub fn new(
        kind: MemberEventKind,
        caregiver_id: impl Into<String>,
        member_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            caregiver_id: caregiver_id.into(),
            member_id: member_id.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Create a "member_added" event.
    pub fn added(caregiver_id: impl Into<String>, member_id: impl Into<String>) -> Self {
        Self::new(MemberEventKind::Added, caregiver_id, member_id)
    }

    /// Create a "member_updated" event.
    pub fn updated(caregiver_id: impl Into<String>, member_id: impl Into<String>) -> Self {
        Self::new(MemberEventKind::Updated, caregiver_id, member_id)
    }

    /// Create a "member_deleted" event.
    pub fn deleted(caregiver_id: impl Into<String>, member_id: impl Into<String>) -> Self {
        Self::new(MemberEventKind::Deleted, caregiver_id, member_id)
    }

    /// Check if this event matches a filter by event kind.
    pub fn matches_kind(&self, filter: Option<MemberEventKind>) -> bool {
        match filter {
            Some(kind) => self.kind == kind,
            None => true, // No filter means match all
        }
    }
}
