//! Storage abstraction layer for the CareBridge server.
//!
//! Defines the traits storage backends implement, the storage error type,
//! and [`EventedMemberStorage`], the wrapper that publishes a member event
//! after every successful mutation.

pub mod error;
pub mod evented;
pub mod traits;

pub use error::{ErrorCategory, StorageError};
pub use evented::EventedMemberStorage;
pub use traits::{CaregiverStorage, DynCaregiverStorage, DynMemberStorage, MemberStorage};
