//! A storage wrapper that publishes member events after successful mutations.
//!
//! This is the single place where persistence hands events to the bus: one
//! `publish` per committed create/update/delete, after the inner storage has
//! accepted the change, so events never describe writes that failed.

use std::sync::Arc;

use async_trait::async_trait;
use carebridge_core::events::{EventBus, MemberEvent};
use carebridge_core::member::{CreateMemberInput, ProtectedMember, UpdateMemberInput};
use tracing::debug;

use crate::error::StorageError;
use crate::traits::MemberStorage;

/// Wraps a [`MemberStorage`] backend and publishes one [`MemberEvent`] per
/// successful mutation.
///
/// Reads are delegated untouched. Event publication is best-effort by design:
/// a publish with no registered hooks simply logs and returns, and hook
/// failures never surface here, so storage results are unaffected by the
/// notification path.
pub struct EventedMemberStorage<S: MemberStorage> {
    /// The inner storage implementation.
    inner: S,
    /// The bus mutations publish to.
    bus: Arc<EventBus>,
}

impl<S: MemberStorage> EventedMemberStorage<S> {
    /// Create a new evented storage wrapper.
    pub fn new(inner: S, bus: Arc<EventBus>) -> Self {
        Self { inner, bus }
    }

    /// Get a reference to the inner storage.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Get a reference to the bus.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    async fn emit(&self, event: MemberEvent) {
        debug!(
            kind = %event.kind,
            caregiver_id = %event.caregiver_id,
            member_id = %event.member_id,
            "Publishing member event"
        );
        self.bus.publish(&event).await;
    }
}

#[async_trait]
impl<S: MemberStorage> MemberStorage for EventedMemberStorage<S> {
    async fn create(
        &self,
        caregiver_id: &str,
        input: CreateMemberInput,
    ) -> Result<ProtectedMember, StorageError> {
        let member = self.inner.create(caregiver_id, input).await?;

        // Publish after the create succeeded
        self.emit(MemberEvent::added(caregiver_id, &member.id)).await;

        Ok(member)
    }

    async fn list_for_caregiver(
        &self,
        caregiver_id: &str,
    ) -> Result<Vec<ProtectedMember>, StorageError> {
        // Read operations don't publish events
        self.inner.list_for_caregiver(caregiver_id).await
    }

    async fn update(
        &self,
        id: &str,
        caregiver_id: &str,
        input: UpdateMemberInput,
    ) -> Result<ProtectedMember, StorageError> {
        let member = self.inner.update(id, caregiver_id, input).await?;

        // Publish after the update succeeded
        self.emit(MemberEvent::updated(caregiver_id, &member.id)).await;

        Ok(member)
    }

    async fn delete(&self, id: &str, caregiver_id: &str) -> Result<(), StorageError> {
        self.inner.delete(id, caregiver_id).await?;

        // Publish after the delete succeeded
        self.emit(MemberEvent::deleted(caregiver_id, id)).await;

        Ok(())
    }
}

impl<S: MemberStorage> std::fmt::Debug for EventedMemberStorage<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventedMemberStorage").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carebridge_core::events::{HookError, MemberEventKind, MemberHook};
    use carebridge_core::member::Relationship;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Minimal in-process backend for exercising the wrapper.
    #[derive(Default)]
    struct StubStorage {
        members: Mutex<HashMap<String, ProtectedMember>>,
    }

    #[async_trait]
    impl MemberStorage for StubStorage {
        async fn create(
            &self,
            caregiver_id: &str,
            input: CreateMemberInput,
        ) -> Result<ProtectedMember, StorageError> {
            let member = ProtectedMember::new(caregiver_id, input);
            self.members
                .lock()
                .expect("lock poisoned")
                .insert(member.id.clone(), member.clone());
            Ok(member)
        }

        async fn list_for_caregiver(
            &self,
            caregiver_id: &str,
        ) -> Result<Vec<ProtectedMember>, StorageError> {
            Ok(self
                .members
                .lock()
                .expect("lock poisoned")
                .values()
                .filter(|m| m.caregiver_id == caregiver_id)
                .cloned()
                .collect())
        }

        async fn update(
            &self,
            id: &str,
            caregiver_id: &str,
            input: UpdateMemberInput,
        ) -> Result<ProtectedMember, StorageError> {
            let mut members = self.members.lock().expect("lock poisoned");
            let member = members
                .get_mut(id)
                .ok_or_else(|| StorageError::not_found("Protected member", id))?;
            if member.caregiver_id != caregiver_id {
                return Err(StorageError::permission_denied(
                    "You do not have permission to update this member",
                ));
            }
            member.apply_update(input);
            Ok(member.clone())
        }

        async fn delete(&self, id: &str, caregiver_id: &str) -> Result<(), StorageError> {
            let mut members = self.members.lock().expect("lock poisoned");
            let member = members
                .get(id)
                .ok_or_else(|| StorageError::not_found("Protected member", id))?;
            if member.caregiver_id != caregiver_id {
                return Err(StorageError::permission_denied(
                    "You do not have permission to delete this member",
                ));
            }
            members.remove(id);
            Ok(())
        }
    }

    /// Hook that records every event it observes.
    #[derive(Default)]
    struct CapturingHook {
        events: Mutex<Vec<MemberEvent>>,
    }

    impl CapturingHook {
        fn events(&self) -> Vec<MemberEvent> {
            self.events.lock().expect("lock poisoned").clone()
        }
    }

    #[async_trait]
    impl MemberHook for CapturingHook {
        fn name(&self) -> &str {
            "capturing"
        }

        async fn handle(&self, event: &MemberEvent) -> Result<(), HookError> {
            self.events.lock().expect("lock poisoned").push(event.clone());
            Ok(())
        }
    }

    fn sample_input() -> CreateMemberInput {
        CreateMemberInput {
            first_name: "June".to_string(),
            last_name: "Osborne".to_string(),
            relationship: Relationship::Daughter,
            birth_year: 1985,
            status: None,
        }
    }

    async fn evented_with_capture() -> (EventedMemberStorage<StubStorage>, Arc<CapturingHook>) {
        let bus = Arc::new(EventBus::new());
        let hook = Arc::new(CapturingHook::default());
        bus.subscribe(hook.clone()).await;
        (EventedMemberStorage::new(StubStorage::default(), bus), hook)
    }

    #[tokio::test]
    async fn test_each_mutation_publishes_exactly_one_event() {
        let (storage, hook) = evented_with_capture().await;

        let member = storage.create("cg-1", sample_input()).await.unwrap();
        let update = UpdateMemberInput {
            first_name: Some("Offred".to_string()),
            ..Default::default()
        };
        storage.update(&member.id, "cg-1", update).await.unwrap();
        storage.delete(&member.id, "cg-1").await.unwrap();

        let events = hook.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, MemberEventKind::Added);
        assert_eq!(events[1].kind, MemberEventKind::Updated);
        assert_eq!(events[2].kind, MemberEventKind::Deleted);
        assert!(events.iter().all(|e| e.member_id == member.id));
        assert!(events.iter().all(|e| e.caregiver_id == "cg-1"));
    }

    #[tokio::test]
    async fn test_failed_mutation_publishes_nothing() {
        let (storage, hook) = evented_with_capture().await;

        let member = storage.create("cg-1", sample_input()).await.unwrap();
        assert_eq!(hook.events().len(), 1);

        // Unknown id
        let err = storage
            .delete("no-such-member", "cg-1")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        // Someone else's member
        let err = storage
            .update(&member.id, "cg-2", UpdateMemberInput {
                first_name: Some("Eve".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_permission_denied());

        assert_eq!(hook.events().len(), 1);
    }

    #[tokio::test]
    async fn test_reads_do_not_publish() {
        let (storage, hook) = evented_with_capture().await;

        storage.create("cg-1", sample_input()).await.unwrap();
        storage.list_for_caregiver("cg-1").await.unwrap();
        storage.list_for_caregiver("cg-2").await.unwrap();

        assert_eq!(hook.events().len(), 1);
    }

    #[tokio::test]
    async fn test_mutations_succeed_with_empty_bus() {
        let bus = Arc::new(EventBus::new());
        let storage = EventedMemberStorage::new(StubStorage::default(), bus);

        let member = storage.create("cg-1", sample_input()).await.unwrap();
        storage.delete(&member.id, "cg-1").await.unwrap();
    }
}
