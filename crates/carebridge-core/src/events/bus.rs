//! The in-process event bus.
//!
//! The bus owns the subscriber list and routes every published event to all
//! matching hooks with error and panic isolation. Publication is synchronous
//! with respect to the publisher: `publish` returns once every hook has been
//! invoked, in registration order, so a subscriber such as the audit sink
//! observes every event that `publish` accepted.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use futures_util::FutureExt;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::hooks::{HookError, MemberHook};
use super::types::MemberEvent;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    hook: Arc<dyn MemberHook>,
}

/// In-process publish/subscribe channel for member events.
///
/// Exactly one bus instance should exist per process. The binary installs its
/// instance with [`EventBus::install_global`]; everything that needs the bus
/// receives it as an explicit `Arc<EventBus>` so tests can run isolated
/// instances.
pub struct EventBus {
    /// Registered hooks, in subscription order.
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
}

static GLOBAL_BUS: OnceLock<Arc<EventBus>> = OnceLock::new();

impl EventBus {
    /// Create a new bus with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Install `bus` as the process-wide instance.
    ///
    /// The first install wins and returns `true`. A second install is a
    /// programmer error: it is logged, the original instance is kept, and
    /// `false` is returned.
    pub fn install_global(bus: Arc<EventBus>) -> bool {
        let installed = GLOBAL_BUS.set(bus).is_ok();
        if !installed {
            error!("Global event bus already installed; keeping the first instance");
        }
        installed
    }

    /// The process-wide instance, if one has been installed.
    pub fn global() -> Option<Arc<EventBus>> {
        GLOBAL_BUS.get().cloned()
    }

    /// Register a hook. Returns a handle for [`EventBus::unsubscribe`].
    pub async fn subscribe(&self, hook: Arc<dyn MemberHook>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let name = hook.name().to_string();
        self.subscribers.write().await.push(Subscriber { id, hook });
        debug!(hook = %name, "Registered member hook");
        id
    }

    /// Remove a previously registered hook. No-op if already removed.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write().await;
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() < before;
        if removed {
            debug!(subscription = ?id, "Removed member hook");
        }
        removed
    }

    /// Number of registered hooks.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Publish an event to all matching hooks.
    ///
    /// Hooks run in registration order and are each awaited before the next
    /// one starts; the call returns after the last hook finishes. A hook
    /// error or panic is caught and logged here and never reaches the
    /// publisher, and the remaining hooks still run. Hooks registered while
    /// a publish is in flight may miss that event.
    pub async fn publish(&self, event: &MemberEvent) {
        let matching: Vec<Subscriber> = {
            let subscribers = self.subscribers.read().await;
            subscribers
                .iter()
                .filter(|s| s.hook.matches(event))
                .cloned()
                .collect()
        };

        if matching.is_empty() {
            debug!(kind = %event.kind, "No hooks matched event");
            return;
        }

        for subscriber in matching {
            let hook_name = subscriber.hook.name().to_string();

            // Wrap in catch_unwind for panic protection
            let result = AssertUnwindSafe(subscriber.hook.handle(event))
                .catch_unwind()
                .await;

            match result {
                Ok(Ok(())) => {
                    debug!(hook = %hook_name, kind = %event.kind, "Hook executed successfully");
                }
                Ok(Err(e)) => {
                    // Hook returned an error
                    warn!(
                        hook = %hook_name,
                        kind = %event.kind,
                        error = %e,
                        "Hook execution failed"
                    );
                }
                Err(panic) => {
                    // Hook panicked
                    let panic_msg = if let Some(s) = panic.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    error!(
                        hook = %hook_name,
                        kind = %event.kind,
                        panic = %panic_msg,
                        "Hook panicked!"
                    );
                }
            }
        }
    }

    /// Call `on_start` for all hooks.
    pub async fn on_start(&self) {
        let subscribers = self.subscribers.read().await;
        for subscriber in subscribers.iter() {
            if let Err(e) = subscriber.hook.on_start().await {
                warn!(hook = %subscriber.hook.name(), error = %e, "Hook on_start failed");
            }
        }
    }

    /// Call `on_shutdown` for all hooks.
    pub async fn on_shutdown(&self) {
        let subscribers = self.subscribers.read().await;
        for subscriber in subscribers.iter() {
            if let Err(e) = subscriber.hook.on_shutdown().await {
                warn!(hook = %subscriber.hook.name(), error = %e, "Hook on_shutdown failed");
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::MemberEventKind;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicU32;
    use tokio_test::block_on;

    struct CountingHook {
        name: &'static str,
        count: AtomicU32,
    }

    impl CountingHook {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                count: AtomicU32::new(0),
            }
        }

        fn count(&self) -> u32 {
            self.count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MemberHook for CountingHook {
        fn name(&self) -> &str {
            self.name
        }

        async fn handle(&self, _event: &MemberEvent) -> Result<(), HookError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct RecordingHook {
        name: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl MemberHook for RecordingHook {
        fn name(&self) -> &str {
            self.name
        }

        async fn handle(&self, _event: &MemberEvent) -> Result<(), HookError> {
            self.seen
                .lock()
                .expect("lock poisoned")
                .push(self.name.to_string());
            Ok(())
        }
    }

    struct FailingHook;

    #[async_trait]
    impl MemberHook for FailingHook {
        fn name(&self) -> &str {
            "failing_hook"
        }

        async fn handle(&self, _event: &MemberEvent) -> Result<(), HookError> {
            Err(HookError::execution("always fails"))
        }
    }

    struct PanicHook;

    #[async_trait]
    impl MemberHook for PanicHook {
        fn name(&self) -> &str {
            "panic_hook"
        }

        async fn handle(&self, _event: &MemberEvent) -> Result<(), HookError> {
            panic!("This hook panics!");
        }
    }

    struct AddedOnlyHook {
        inner: CountingHook,
    }

    #[async_trait]
    impl MemberHook for AddedOnlyHook {
        fn name(&self) -> &str {
            "added_only"
        }

        fn event_kinds(&self) -> &[MemberEventKind] {
            &[MemberEventKind::Added]
        }

        async fn handle(&self, event: &MemberEvent) -> Result<(), HookError> {
            self.inner.handle(event).await
        }
    }

    #[tokio::test]
    async fn test_subscribe_and_count() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count().await, 0);

        bus.subscribe(Arc::new(CountingHook::new("a"))).await;
        bus.subscribe(Arc::new(CountingHook::new("b"))).await;
        assert_eq!(bus.subscriber_count().await, 2);
    }

    #[tokio::test]
    async fn test_publish_reaches_all_hooks() {
        let bus = EventBus::new();
        let hook = Arc::new(CountingHook::new("counter"));
        bus.subscribe(hook.clone()).await;

        bus.publish(&MemberEvent::added("cg-1", "m-1")).await;

        // Publish is synchronous: the hook has run by the time it returns.
        assert_eq!(hook.count(), 1);
    }

    #[tokio::test]
    async fn test_publish_invokes_hooks_in_registration_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe(Arc::new(RecordingHook {
            name: "first",
            seen: seen.clone(),
        }))
        .await;
        bus.subscribe(Arc::new(RecordingHook {
            name: "second",
            seen: seen.clone(),
        }))
        .await;
        bus.subscribe(Arc::new(RecordingHook {
            name: "third",
            seen: seen.clone(),
        }))
        .await;

        bus.publish(&MemberEvent::updated("cg-1", "m-1")).await;

        let order = seen.lock().expect("lock poisoned").clone();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let hook = Arc::new(CountingHook::new("counter"));
        let id = bus.subscribe(hook.clone()).await;

        bus.publish(&MemberEvent::added("cg-1", "m-1")).await;
        assert_eq!(hook.count(), 1);

        assert!(bus.unsubscribe(id).await);
        assert!(!bus.unsubscribe(id).await);

        bus.publish(&MemberEvent::added("cg-1", "m-2")).await;
        assert_eq!(hook.count(), 1);
    }

    #[test]
    fn test_publish_with_no_subscribers_is_ok() {
        let bus = EventBus::new();
        block_on(bus.publish(&MemberEvent::deleted("cg-1", "m-1")));
    }

    #[tokio::test]
    async fn test_error_isolation() {
        let bus = EventBus::new();
        let counting = Arc::new(CountingHook::new("counter"));

        bus.subscribe(Arc::new(FailingHook)).await;
        bus.subscribe(counting.clone()).await;

        bus.publish(&MemberEvent::added("cg-1", "m-1")).await;
        assert_eq!(counting.count(), 1);

        // The next event is processed normally as well.
        bus.publish(&MemberEvent::added("cg-1", "m-2")).await;
        assert_eq!(counting.count(), 2);
    }

    #[tokio::test]
    async fn test_panic_isolation() {
        let bus = EventBus::new();
        let counting = Arc::new(CountingHook::new("counter"));

        bus.subscribe(Arc::new(PanicHook)).await;
        bus.subscribe(counting.clone()).await;

        // This should not panic the test, even though one hook panics
        bus.publish(&MemberEvent::added("cg-1", "m-1")).await;

        assert_eq!(counting.count(), 1);
    }

    #[tokio::test]
    async fn test_kind_filtering() {
        let bus = EventBus::new();
        let hook = Arc::new(AddedOnlyHook {
            inner: CountingHook::new("added_only"),
        });
        bus.subscribe(hook.clone()).await;

        bus.publish(&MemberEvent::updated("cg-1", "m-1")).await;
        assert_eq!(hook.inner.count(), 0);

        bus.publish(&MemberEvent::added("cg-1", "m-1")).await;
        assert_eq!(hook.inner.count(), 1);
    }

    #[tokio::test]
    async fn test_global_install_guard() {
        let first = Arc::new(EventBus::new());
        let second = Arc::new(EventBus::new());

        assert!(EventBus::install_global(first.clone()));
        // The second install is rejected and the first instance stays.
        assert!(!EventBus::install_global(second));
        assert!(Arc::ptr_eq(
            &EventBus::global().expect("bus installed"),
            &first
        ));
    }
}
