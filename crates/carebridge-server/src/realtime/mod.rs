//! Real-time notification delivery.
//!
//! Connects the event bus to live WebSocket sessions. The dispatcher
//! projects each member event into its wire notification and pushes it to
//! every session in the owning caregiver's room; the audit sink records the
//! same events as structured logs. Sessions authenticate before the upgrade
//! completes and sit in exactly one caregiver's room for their lifetime.

pub mod audit;
pub mod dispatcher;
pub mod session;
pub mod socket;
pub mod wire;

pub use audit::AuditLogSink;
pub use dispatcher::NotificationDispatcher;
pub use session::{SessionHandle, SessionMessage, SessionRegistry, SessionSendError};
pub use socket::realtime_handler;
pub use wire::{Notification, NotificationData};
