//! Caregiver directory lookup.

use async_trait::async_trait;
use carebridge_core::caregiver::Caregiver;
use carebridge_storage::DynCaregiverStorage;

use crate::error::VerifyError;

/// Resolves an authority subject id to the caregiver record that owns it.
#[async_trait]
pub trait CaregiverDirectory: Send + Sync {
    /// Finds the caregiver registered for `subject_id`, if any.
    async fn find_by_subject(&self, subject_id: &str) -> Result<Option<Caregiver>, VerifyError>;
}

/// Directory backed by caregiver storage.
#[derive(Clone)]
pub struct StorageCaregiverDirectory {
    storage: DynCaregiverStorage,
}

impl StorageCaregiverDirectory {
    /// Creates a directory over the given caregiver storage.
    pub fn new(storage: DynCaregiverStorage) -> Self {
        Self { storage }
    }
}

impl std::fmt::Debug for StorageCaregiverDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCaregiverDirectory")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CaregiverDirectory for StorageCaregiverDirectory {
    async fn find_by_subject(&self, subject_id: &str) -> Result<Option<Caregiver>, VerifyError> {
        self.storage
            .find_by_subject(subject_id)
            .await
            .map_err(|e| VerifyError::directory(e.to_string()))
    }
}
