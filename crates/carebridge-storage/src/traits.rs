//! Storage traits for the storage abstraction layer.
//!
//! These traits define the contract between the HTTP layer and storage
//! backends. Implementations must be thread-safe (`Send + Sync`); ownership
//! checks (a caregiver can only touch their own members) live here so every
//! backend enforces them identically.

use std::sync::Arc;

use async_trait::async_trait;
use carebridge_core::caregiver::Caregiver;
use carebridge_core::member::{CreateMemberInput, ProtectedMember, UpdateMemberInput};

use crate::error::StorageError;

/// Storage backend for protected member records.
///
/// Inputs are expected to be validated before they reach the storage layer.
#[async_trait]
pub trait MemberStorage: Send + Sync {
    /// Creates a member record owned by `caregiver_id`.
    async fn create(
        &self,
        caregiver_id: &str,
        input: CreateMemberInput,
    ) -> Result<ProtectedMember, StorageError>;

    /// Returns all member records owned by `caregiver_id`, newest first.
    async fn list_for_caregiver(
        &self,
        caregiver_id: &str,
    ) -> Result<Vec<ProtectedMember>, StorageError>;

    /// Applies `input` to the member with id `id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no member has that id.
    /// Returns `StorageError::PermissionDenied` if the member is owned by a
    /// different caregiver.
    async fn update(
        &self,
        id: &str,
        caregiver_id: &str,
        input: UpdateMemberInput,
    ) -> Result<ProtectedMember, StorageError>;

    /// Removes the member with id `id`.
    ///
    /// # Errors
    ///
    /// Same `NotFound`/`PermissionDenied` rules as [`MemberStorage::update`].
    async fn delete(&self, id: &str, caregiver_id: &str) -> Result<(), StorageError>;
}

/// Storage backend for caregiver records.
#[async_trait]
pub trait CaregiverStorage: Send + Sync {
    /// Inserts a caregiver record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if a caregiver with the same id
    /// or external subject id is already present.
    async fn insert(&self, caregiver: Caregiver) -> Result<Caregiver, StorageError>;

    /// Looks up a caregiver by internal id. Returns `None` if absent.
    async fn find_by_id(&self, id: &str) -> Result<Option<Caregiver>, StorageError>;

    /// Looks up a caregiver by the external authority's subject id.
    /// Returns `None` if absent.
    async fn find_by_subject(&self, subject_id: &str) -> Result<Option<Caregiver>, StorageError>;
}

/// Type alias for a shareable member storage instance.
pub type DynMemberStorage = Arc<dyn MemberStorage>;

/// Type alias for a shareable caregiver storage instance.
pub type DynCaregiverStorage = Arc<dyn CaregiverStorage>;
