//! Member event system connecting persistence mutations to live notification.
//!
//! Every successful create/update/delete of a protected member produces one
//! [`MemberEvent`]. The [`EventBus`] hands each published event to all
//! registered [`MemberHook`]s, in registration order, before `publish`
//! returns. Hooks are isolated from each other: one hook's error or panic is
//! caught and logged at the bus boundary and never reaches the publisher.
//!
//! ```text
//! storage mutation ──publish──▶ EventBus ──▶ hook 1 (dispatcher)
//!                                        └─▶ hook 2 (audit sink)
//! ```
//!
//! # Module Structure
//!
//! - [`types`]: event definitions (`MemberEvent`, `MemberEventKind`)
//! - [`hooks`]: the `MemberHook` trait and hook error types
//! - [`bus`]: the bus itself plus the guarded process-wide instance

pub mod bus;
pub mod hooks;
pub mod types;

// Re-export main types for convenience
pub use bus::{EventBus, SubscriptionId};
pub use hooks::{HookError, MemberHook};
pub use types::{MemberEvent, MemberEventKind};
