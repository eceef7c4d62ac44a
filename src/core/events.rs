//! Named-event publish/subscribe bus for load lifecycle transitions.
//!
//! Listeners are invoked synchronously, in registration order, on the task
//! that fires the event. The bus snapshots the listener list before
//! dispatching, so listeners may subscribe or unsubscribe from inside a
//! callback. A panicking listener is isolated and logged; the remaining
//! listeners still run.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{LoadedResource, LoaderError, ResourceDescriptor};

/// Lifecycle events a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// A descriptor was dispatched to its fetcher.
    Start,
    /// A batch member reached a terminal state.
    Progress,
    /// A resource resolved, either fetched or served from cache.
    Complete,
    /// A resource failed terminally.
    Error,
    /// A failed resource is being re-enqueued.
    Retry,
    /// Queue, in-flight set and pending retries all emptied.
    QueueDrained,
}

impl EventKind {
    /// Event name as used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Progress => "progress",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Retry => "retry",
            Self::QueueDrained => "queue-drained",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Batch progress carried by [`EventKind::Progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    /// Batch identifier, also present in log lines.
    pub batch_id: Uuid,
    /// Members that reached a terminal state so far.
    pub completed: usize,
    /// Members in the batch.
    pub total: usize,
}

/// Record passed to every listener.
#[derive(Debug, Clone)]
pub struct LoadEvent {
    /// Which lifecycle transition fired.
    pub kind: EventKind,
    /// Descriptor involved, if any.
    pub resource: Option<ResourceDescriptor>,
    /// Resolved reference for `Complete` events.
    pub reference: Option<Arc<LoadedResource>>,
    /// Failure for `Error` and `Retry` events.
    pub error: Option<LoaderError>,
    /// Batch progress for `Progress` events.
    pub progress: Option<BatchProgress>,
}

impl LoadEvent {
    /// Event with no payload.
    pub const fn new(kind: EventKind) -> Self {
        Self {
            kind,
            resource: None,
            reference: None,
            error: None,
            progress: None,
        }
    }

    /// Attach the descriptor.
    #[must_use]
    pub fn with_resource(mut self, resource: ResourceDescriptor) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Attach the resolved reference.
    #[must_use]
    pub fn with_reference(mut self, reference: Arc<LoadedResource>) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Attach the failure.
    #[must_use]
    pub fn with_error(mut self, error: LoaderError) -> Self {
        self.error = Some(error);
        self
    }

    /// Attach batch progress.
    #[must_use]
    pub const fn with_progress(mut self, progress: BatchProgress) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// Token identifying one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&LoadEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<EventKind, Vec<(ListenerId, Listener)>>>,
}

impl Registry {
    fn remove(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(list) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.remove(&kind);
        }
        removed
    }
}

/// Event bus mapping event kinds to listener sets.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Registry>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.registry.listeners.lock();
        let counts: HashMap<_, _> = listeners.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

impl EventBus {
    /// Create a bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `kind`.
    ///
    /// The returned [`Subscription`] removes the listener when
    /// [`Subscription::unsubscribe`] is called. Dropping it leaves the
    /// listener registered.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&LoadEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        self.registry
            .listeners
            .lock()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        Subscription {
            registry: Arc::downgrade(&self.registry),
            kind,
            id,
        }
    }

    /// Remove a specific listener. Returns whether it was registered.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.registry.remove(kind, id)
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry
            .listeners
            .lock()
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Deliver `event` to every listener currently registered for its kind.
    pub fn emit(&self, event: &LoadEvent) {
        let snapshot: Vec<Listener> = {
            let listeners = self.registry.listeners.lock();
            match listeners.get(&event.kind) {
                Some(list) => list.iter().map(|(_, l)| Arc::clone(l)).collect(),
                None => return,
            }
        };

        for listener in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(event)));
            if outcome.is_err() {
                tracing::error!("listener for `{}` event panicked", event.kind);
            }
        }
    }
}

/// Handle returned by [`EventBus::on`].
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Registry>,
    kind: EventKind,
    id: ListenerId,
}

impl Subscription {
    /// Listener token, usable with [`EventBus::off`].
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    /// Event kind this subscription listens to.
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Remove the listener. Returns whether it was still registered.
    pub fn unsubscribe(self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.kind, self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&LoadEvent) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move |_: &LoadEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_emit_reaches_only_matching_kind() {
        let bus = EventBus::new();
        let (starts, on_start) = counter();
        let (errors, on_error) = counter();
        bus.on(EventKind::Start, on_start);
        bus.on(EventKind::Error, on_error);

        bus.emit(&LoadEvent::new(EventKind::Start));
        bus.emit(&LoadEvent::new(EventKind::Start));

        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert_eq!(errors.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_and_off() {
        let bus = EventBus::new();
        let (a, on_a) = counter();
        let (b, on_b) = counter();
        let sub_a = bus.on(EventKind::Complete, on_a);
        let sub_b = bus.on(EventKind::Complete, on_b);

        assert!(sub_a.unsubscribe());
        assert!(bus.off(EventKind::Complete, sub_b.id()));
        assert!(!bus.off(EventKind::Complete, sub_b.id()));

        bus.emit(&LoadEvent::new(EventKind::Complete));
        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 0);
        assert_eq!(bus.listener_count(EventKind::Complete), 0);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let bus = EventBus::new();
        let (count, on_ok) = counter();
        bus.on(EventKind::Retry, |_| panic!("listener failure"));
        bus.on(EventKind::Retry, on_ok);

        bus.emit(&LoadEvent::new(EventKind::Retry));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_subscribe_during_emit() {
        let bus = EventBus::new();
        let inner_bus = bus.clone();
        bus.on(EventKind::QueueDrained, move |_| {
            inner_bus.on(EventKind::QueueDrained, |_| {});
        });

        bus.emit(&LoadEvent::new(EventKind::QueueDrained));
        assert_eq!(bus.listener_count(EventKind::QueueDrained), 2);
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::QueueDrained.to_string(), "queue-drained");
        let json = serde_json::to_string(&EventKind::QueueDrained).unwrap();
        assert_eq!(json, "\"queue-drained\"");
    }
}
