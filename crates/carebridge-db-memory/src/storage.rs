use async_trait::async_trait;
use carebridge_core::caregiver::Caregiver;
use carebridge_core::member::{CreateMemberInput, ProtectedMember, UpdateMemberInput};
use carebridge_storage::{CaregiverStorage, MemberStorage, StorageError};
use dashmap::DashMap;

/// In-memory member storage backed by a concurrent hash map.
///
/// Entries are keyed by member id; ownership checks compare the stored
/// record's caregiver id against the caller's.
#[derive(Debug, Default)]
pub struct InMemoryMemberStorage {
    members: DashMap<String, ProtectedMember>,
}

impl InMemoryMemberStorage {
    /// Creates a new empty member storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored member records, across all caregivers.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the storage holds no records.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[async_trait]
impl MemberStorage for InMemoryMemberStorage {
    async fn create(
        &self,
        caregiver_id: &str,
        input: CreateMemberInput,
    ) -> Result<ProtectedMember, StorageError> {
        let member = ProtectedMember::new(caregiver_id, input);
        self.members.insert(member.id.clone(), member.clone());
        Ok(member)
    }

    async fn list_for_caregiver(
        &self,
        caregiver_id: &str,
    ) -> Result<Vec<ProtectedMember>, StorageError> {
        let mut members: Vec<ProtectedMember> = self
            .members
            .iter()
            .filter(|entry| entry.value().caregiver_id == caregiver_id)
            .map(|entry| entry.value().clone())
            .collect();
        // Newest first; fall back to id so equal timestamps order stably.
        members.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(members)
    }

    async fn update(
        &self,
        id: &str,
        caregiver_id: &str,
        input: UpdateMemberInput,
    ) -> Result<ProtectedMember, StorageError> {
        let mut entry = self
            .members
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found("Protected member", id))?;
        if entry.caregiver_id != caregiver_id {
            return Err(StorageError::permission_denied(
                "You do not have permission to update this member",
            ));
        }
        entry.apply_update(input);
        Ok(entry.clone())
    }

    async fn delete(&self, id: &str, caregiver_id: &str) -> Result<(), StorageError> {
        // remove_if is atomic: the ownership check and removal can't race
        // with another writer on the same key.
        let removed = self
            .members
            .remove_if(id, |_, member| member.caregiver_id == caregiver_id);
        if removed.is_some() {
            return Ok(());
        }
        if self.members.contains_key(id) {
            return Err(StorageError::permission_denied(
                "You do not have permission to delete this member",
            ));
        }
        Err(StorageError::not_found("Protected member", id))
    }
}

/// In-memory caregiver storage backed by concurrent hash maps.
///
/// Keeps a secondary index from the external authority's subject id to the
/// internal caregiver id so token resolution is a map lookup.
#[derive(Debug, Default)]
pub struct InMemoryCaregiverStorage {
    caregivers: DashMap<String, Caregiver>,
    subject_index: DashMap<String, String>,
}

impl InMemoryCaregiverStorage {
    /// Creates a new empty caregiver storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored caregiver records.
    pub fn len(&self) -> usize {
        self.caregivers.len()
    }

    /// Whether the storage holds no records.
    pub fn is_empty(&self) -> bool {
        self.caregivers.is_empty()
    }
}

#[async_trait]
impl CaregiverStorage for InMemoryCaregiverStorage {
    async fn insert(&self, caregiver: Caregiver) -> Result<Caregiver, StorageError> {
        if self.caregivers.contains_key(&caregiver.id) {
            return Err(StorageError::already_exists("Caregiver", &caregiver.id));
        }
        if self.subject_index.contains_key(&caregiver.subject_id) {
            return Err(StorageError::already_exists(
                "Caregiver",
                &caregiver.subject_id,
            ));
        }
        self.subject_index
            .insert(caregiver.subject_id.clone(), caregiver.id.clone());
        self.caregivers
            .insert(caregiver.id.clone(), caregiver.clone());
        Ok(caregiver)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Caregiver>, StorageError> {
        Ok(self.caregivers.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_by_subject(&self, subject_id: &str) -> Result<Option<Caregiver>, StorageError> {
        let Some(id) = self.subject_index.get(subject_id).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        Ok(self.caregivers.get(&id).map(|entry| entry.value().clone()))
    }
}
