//! Audit trail subscriber.

use async_trait::async_trait;
use carebridge_core::events::{HookError, MemberEvent, MemberHook};
use carebridge_core::format_rfc3339;
use tracing::info;

/// Writes one structured log line per member event under the `audit` target.
///
/// Registered independently of the dispatcher: an event is recorded whether
/// or not any session was around to receive it, so the log is a complete
/// record of member mutations.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuditLogSink;

impl AuditLogSink {
    /// Create the sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MemberHook for AuditLogSink {
    fn name(&self) -> &str {
        "audit_log"
    }

    async fn handle(&self, event: &MemberEvent) -> Result<(), HookError> {
        info!(
            target: "audit",
            kind = %event.kind,
            caregiver_id = %event.caregiver_id,
            member_id = %event.member_id,
            timestamp = %format_rfc3339(event.timestamp),
            "Member event"
        );
        Ok(())
    }
}
