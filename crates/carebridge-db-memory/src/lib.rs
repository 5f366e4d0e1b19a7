//! In-memory storage backend for the CareBridge server.
//!
//! This crate implements the `MemberStorage` and `CaregiverStorage` traits
//! from `carebridge-storage` on top of concurrent hash maps. It backs the
//! server binary and keeps integration tests free of external services.

pub mod storage;

pub use storage::{InMemoryCaregiverStorage, InMemoryMemberStorage};

use carebridge_storage::{DynCaregiverStorage, DynMemberStorage};

/// Creates a new in-memory member storage instance.
pub fn create_member_storage() -> DynMemberStorage {
    std::sync::Arc::new(InMemoryMemberStorage::new())
}

/// Creates a new in-memory caregiver storage instance.
pub fn create_caregiver_storage() -> DynCaregiverStorage {
    std::sync::Arc::new(InMemoryCaregiverStorage::new())
}
