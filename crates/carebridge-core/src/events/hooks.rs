//! Hook trait for the member event system.
//!
//! Hooks are asynchronous subscribers invoked by the bus for every published
//! event. They are designed to be:
//! - **Quick**: heavy work is handed off to a channel or task, not awaited
//! - **Isolated**: errors in one hook don't affect others
//! - **Composable**: multiple hooks observe the same event

use async_trait::async_trait;

use super::types::{MemberEvent, MemberEventKind};

/// Error type for hook operations.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Hook execution failed with a message.
    #[error("Hook execution failed: {0}")]
    Execution(String),

    /// Hook failed to send to an internal channel.
    #[error("Channel send failed: {0}")]
    Channel(String),

    /// Hook failed to serialize a payload.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with source.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HookError {
    /// Create an execution error from a string.
    pub fn execution(msg: impl Into<String>) -> Self {
        HookError::Execution(msg.into())
    }

    /// Create a channel error from a string.
    pub fn channel(msg: impl Into<String>) -> Self {
        HookError::Channel(msg.into())
    }

    /// Create a serialization error from a string.
    pub fn serialization(msg: impl Into<String>) -> Self {
        HookError::Serialization(msg.into())
    }
}

/// Trait for member event subscribers.
///
/// # Implementation Notes
///
/// - `handle` is awaited inline by the publisher, so it must be quick and
///   non-blocking; for heavy work, hand off to a channel and return
/// - Errors are logged at the bus boundary and never propagate to the
///   publisher; the mutation that produced the event has already committed
/// - Panics inside `handle` are caught by the bus
#[async_trait]
pub trait MemberHook: Send + Sync {
    /// Unique name for this hook (for logging).
    fn name(&self) -> &str;

    /// Event kinds this hook handles.
    ///
    /// Return an empty slice to match all kinds (added, updated, deleted).
    fn event_kinds(&self) -> &[MemberEventKind] {
        &[] // default: all kinds
    }

    /// Handle a member event.
    async fn handle(&self, event: &MemberEvent) -> Result<(), HookError>;

    /// Called when the hook is registered and the system starts.
    async fn on_start(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Called when the system shuts down.
    async fn on_shutdown(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Check if this hook should handle the given event.
    fn matches(&self, event: &MemberEvent) -> bool {
        let kinds = self.event_kinds();
        kinds.is_empty() || kinds.contains(&event.kind)
    }
}
