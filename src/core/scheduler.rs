//! Resource scheduler: priority queue, concurrency gate, timeout guard and retry controller.
//!
//! Every descriptor identity moves through these states:
//!
//! ```text
//! CREATED → QUEUED ⇄ RETRY_QUEUED → DISPATCHED → SUCCEEDED
//!                                              → FAILED_RETRYING → QUEUED
//!                                              → FAILED_TERMINAL
//! ```
//!
//! All shared state sits behind one `parking_lot::Mutex` that is never held
//! across an `.await` or while listeners run. Fetches execute on tasks spawned
//! through [`Spawn`]; their completions re-enter the scheduler, release the
//! concurrency slot, and drain the queue again.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{ConfigPatch, LoaderConfig};
use crate::core::batch::{self, BatchHandle};
use crate::core::events::{EventBus, EventKind, ListenerId, LoadEvent, Subscription};
use crate::core::{
    FetchContext, FetcherRegistry, LoadHandle, LoadResult, LoadedResource, LoaderError,
    ResourceCache, ResourceDescriptor,
};
use crate::infra::queue::InMemoryQueue;

/// Abstraction for spawning work on a runtime.
pub trait Spawn: Send + Sync + 'static {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoaderStats {
    /// Entries in the cache.
    pub cached: usize,
    /// Loads currently in flight.
    pub pending: usize,
    /// Descriptors waiting in the queue.
    pub queued: usize,
    /// Descriptors waiting on a backoff timer.
    pub retrying: usize,
}

struct State {
    config: LoaderConfig,
    queue: InMemoryQueue,
    in_flight: usize,
    retrying: usize,
    /// Callers awaiting each identity that is queued, in flight, or backing off.
    waiters: HashMap<String, Vec<oneshot::Sender<LoadResult>>>,
    /// Priorities requested by joiners while the identity was in flight or backing off.
    raised: HashMap<String, i32>,
    /// Set when work arrives; cleared when `queue-drained` fires.
    active: bool,
    closed: bool,
}

enum Settled {
    Retry { delay: Duration, budget: u32 },
    Terminal(Vec<oneshot::Sender<LoadResult>>),
    Closed,
}

struct Inner<S> {
    state: Mutex<State>,
    cache: ResourceCache,
    events: EventBus,
    fetchers: FetcherRegistry,
    spawner: S,
    shutdown: CancellationToken,
}

/// Priority-driven loader with bounded concurrency, retries, timeouts and a cache.
///
/// Dropping the scheduler shuts it down: queued and in-flight loads resolve
/// with [`LoaderError::Shutdown`] and pending retry timers are cancelled.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use resource_scheduler::builders::SchedulerBuilder;
/// use resource_scheduler::core::ResourceDescriptor;
/// use resource_scheduler::infra::{FileSource, InMemorySurface};
///
/// let scheduler = SchedulerBuilder::new()
///     .with_default_fetchers(Arc::new(FileSource::new("./public")), Arc::new(InMemorySurface::new()))
///     .build()?;
///
/// let icon = scheduler.enqueue_one(ResourceDescriptor::picture("icons/home.png")).await?;
/// let results = scheduler
///     .load_batch(vec![
///         ResourceDescriptor::stylesheet("css/app.css").with_priority(5),
///         ResourceDescriptor::module("js/app.js"),
///     ])
///     .await;
/// ```
pub struct ResourceScheduler<S: Spawn = crate::runtime::TokioSpawner> {
    inner: Arc<Inner<S>>,
}

impl<S: Spawn> ResourceScheduler<S> {
    /// Create a scheduler from validated configuration.
    pub fn new(config: LoaderConfig, fetchers: FetcherRegistry, spawner: S) -> Result<Self, LoaderError> {
        config.validate().map_err(LoaderError::Config)?;
        tracing::info!(
            "resource scheduler ready (max_concurrent={}, timeout_ms={}, max_attempts={})",
            config.max_concurrent,
            config.timeout_ms,
            config.max_attempts
        );
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    config,
                    queue: InMemoryQueue::new(),
                    in_flight: 0,
                    retrying: 0,
                    waiters: HashMap::new(),
                    raised: HashMap::new(),
                    active: false,
                    closed: false,
                }),
                cache: ResourceCache::new(),
                events: EventBus::new(),
                fetchers,
                spawner,
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// Merge `patch` into the live configuration.
    ///
    /// Raising `max_concurrent` dispatches queued work immediately.
    pub fn configure(&self, patch: &ConfigPatch) -> Result<(), LoaderError> {
        {
            let mut state = self.inner.state.lock();
            state.config.apply(patch).map_err(LoaderError::Config)?;
            tracing::info!("configuration updated: {:?}", state.config);
        }
        self.inner.try_dispatch();
        Ok(())
    }

    /// Snapshot of the live configuration.
    pub fn config(&self) -> LoaderConfig {
        self.inner.state.lock().config.clone()
    }

    /// Request one resource.
    ///
    /// Cached identities resolve immediately with a `complete` event and no
    /// fetch. An identity that is already queued or loading is joined rather
    /// than fetched twice; a higher priority on the joiner raises the queued
    /// entry.
    pub fn enqueue_one(&self, descriptor: ResourceDescriptor) -> LoadHandle {
        let handle = self.inner.submit(descriptor);
        self.inner.try_dispatch();
        handle
    }

    /// Request many resources and aggregate the outcomes.
    ///
    /// All descriptors are queued before dispatching, so priorities apply
    /// across the whole batch. An empty batch resolves to an empty list.
    pub fn load_batch(&self, descriptors: Vec<ResourceDescriptor>) -> BatchHandle {
        self.load_batch_entries(descriptors.into_iter().map(Ok).collect())
    }

    /// Like [`Self::load_batch`], for input where some entries were already rejected.
    ///
    /// Each `Err` entry keeps its slot and resolves with its own error without
    /// being queued, so results stay aligned with the input.
    pub fn load_batch_entries(
        &self,
        entries: Vec<Result<ResourceDescriptor, LoaderError>>,
    ) -> BatchHandle {
        if entries.is_empty() {
            return BatchHandle::ready(Vec::new());
        }
        let batch_id = Uuid::new_v4();
        let expected = entries.len();
        tracing::info!("batch {} submitted with {} resources", batch_id, expected);

        let members: Vec<_> = entries
            .into_iter()
            .map(|entry| match entry {
                Ok(descriptor) => {
                    let handle = self.inner.submit(descriptor.clone());
                    (Some(descriptor), handle)
                }
                Err(error) => (None, LoadHandle::ready(Err(error))),
            })
            .collect();
        self.inner.try_dispatch();

        let (tx, rx) = oneshot::channel();
        self.inner.spawner.spawn(batch::coordinate(
            batch_id,
            members,
            self.inner.events.clone(),
            tx,
        ));
        BatchHandle::pending(rx, expected)
    }

    /// Subscribe to a lifecycle event.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&LoadEvent) + Send + Sync + 'static,
    {
        self.inner.events.on(kind, listener)
    }

    /// Remove a listener registered with [`Self::on`].
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.inner.events.off(kind, id)
    }

    /// Event bus shared with this scheduler.
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Cached reference for `identity`, if any.
    pub fn get_cached(&self, identity: &str) -> Option<Arc<LoadedResource>> {
        self.inner.cache.get(identity)
    }

    /// Evict one identity, or the whole cache with `None`. Returns entries removed.
    pub fn clear_cache(&self, identity: Option<&str>) -> usize {
        let removed = self.inner.cache.evict(identity);
        tracing::debug!("evicted {} cache entries", removed);
        removed
    }

    /// Current counters.
    pub fn stats(&self) -> LoaderStats {
        let state = self.inner.state.lock();
        LoaderStats {
            cached: self.inner.cache.len(),
            pending: state.in_flight,
            queued: state.queue.len(),
            retrying: state.retrying,
        }
    }

    /// Stop the scheduler.
    ///
    /// Cancels running fetches and retry timers, empties the queue, and
    /// resolves every outstanding handle with [`LoaderError::Shutdown`].
    /// Later requests resolve with the same error. Idempotent.
    pub fn shutdown(&self) {
        let waiters = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.queue.drain();
            state.retrying = 0;
            state.raised.clear();
            state.active = false;
            std::mem::take(&mut state.waiters)
        };
        self.inner.shutdown.cancel();
        tracing::info!("resource scheduler shut down, {} loads abandoned", waiters.len());
        for tx in waiters.into_values().flatten() {
            let _ = tx.send(Err(LoaderError::Shutdown));
        }
    }

    /// Whether [`Self::shutdown`] has run.
    pub fn is_shut_down(&self) -> bool {
        self.inner.state.lock().closed
    }
}

impl<S: Spawn> Drop for ResourceScheduler<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<S: Spawn> Inner<S> {
    /// Queue a descriptor or attach to an existing load, without dispatching.
    fn submit(&self, descriptor: ResourceDescriptor) -> LoadHandle {
        let (tx, handle) = LoadHandle::channel();
        let mut state = self.state.lock();
        if state.closed {
            return LoadHandle::ready(Err(LoaderError::Shutdown));
        }

        if state.config.cache_enabled {
            if let Some(hit) = self.cache.get(&descriptor.identity) {
                drop(state);
                tracing::debug!("cache hit for {}", descriptor.identity);
                self.events.emit(
                    &LoadEvent::new(EventKind::Complete)
                        .with_resource(descriptor)
                        .with_reference(Arc::clone(&hit)),
                );
                return LoadHandle::ready(Ok(hit));
            }
        }

        let state = &mut *state;
        if let Some(waiters) = state.waiters.get_mut(&descriptor.identity) {
            waiters.push(tx);
            if state.queue.reprioritize(&descriptor.identity, descriptor.priority) {
                tracing::debug!(
                    "raised {} to priority {}",
                    descriptor.identity,
                    descriptor.priority
                );
            } else if !state.queue.contains(&descriptor.identity) {
                // In flight or backing off: applied when it re-enters the queue.
                let raised = state
                    .raised
                    .entry(descriptor.identity.clone())
                    .or_insert(descriptor.priority);
                *raised = (*raised).max(descriptor.priority);
            }
            tracing::debug!("joined in-progress load of {}", descriptor.identity);
            return handle;
        }

        tracing::debug!(
            "queued {} (kind={}, priority={})",
            descriptor.identity,
            descriptor.kind,
            descriptor.priority
        );
        state.waiters.insert(descriptor.identity.clone(), vec![tx]);
        state.queue.enqueue(descriptor);
        state.active = true;
        handle
    }

    /// Dispatch queued descriptors while concurrency slots are free.
    fn try_dispatch(self: &Arc<Self>) {
        loop {
            let descriptor = {
                let mut state = self.state.lock();
                if state.closed || state.in_flight >= state.config.max_concurrent {
                    break;
                }
                let Some(descriptor) = state.queue.dequeue() else {
                    break;
                };
                state.in_flight += 1;
                descriptor
            };

            tracing::debug!(
                "dispatching {} (attempt {})",
                descriptor.identity,
                descriptor.attempt
            );
            self.events
                .emit(&LoadEvent::new(EventKind::Start).with_resource(descriptor.clone()));
            let inner = Arc::clone(self);
            self.spawner.spawn(async move {
                inner.run_load(descriptor).await;
            });
        }
        self.check_drained();
    }

    async fn run_load(self: Arc<Self>, descriptor: ResourceDescriptor) {
        match self.attempt(&descriptor).await {
            Ok(resource) => self.settle_success(descriptor, Arc::new(resource)),
            Err(error) => self.settle_failure(descriptor, error),
        }
        self.try_dispatch();
    }

    /// One fetch, raced against its deadline and scheduler shutdown.
    async fn attempt(&self, descriptor: &ResourceDescriptor) -> Result<LoadedResource, LoaderError> {
        let fetcher = self.fetchers.get(&descriptor.kind)?;
        let deadline = {
            let state = self.state.lock();
            descriptor.timeout.unwrap_or_else(|| state.config.timeout())
        };
        let cancel = self.shutdown.child_token();
        let ctx = FetchContext {
            attempt: descriptor.attempt,
            cancel: cancel.clone(),
        };

        let fetch = AssertUnwindSafe(fetcher.fetch(descriptor, ctx)).catch_unwind();
        let result = tokio::select! {
            () = self.shutdown.cancelled() => Err(LoaderError::Shutdown),
            outcome = tokio::time::timeout(deadline, fetch) => match outcome {
                Ok(Ok(fetched)) => fetched,
                Ok(Err(_)) => {
                    tracing::error!("fetcher for {} panicked", descriptor.identity);
                    Err(LoaderError::fetch(&descriptor.identity, "fetcher panicked"))
                }
                Err(_) => {
                    tracing::warn!("{} timed out after {:?}", descriptor.identity, deadline);
                    Err(LoaderError::Timeout {
                        identity: descriptor.identity.clone(),
                        timeout_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                    })
                }
            }
        };
        if result.is_err() {
            // The fetch future is gone; tell any work it handed off to stop.
            cancel.cancel();
        }
        result
    }

    fn settle_success(&self, descriptor: ResourceDescriptor, reference: Arc<LoadedResource>) {
        let waiters = {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            if state.closed {
                return;
            }
            if state.config.cache_enabled {
                self.cache
                    .set(descriptor.identity.clone(), Arc::clone(&reference));
            }
            state.raised.remove(&descriptor.identity);
            state.waiters.remove(&descriptor.identity).unwrap_or_default()
        };

        tracing::info!(
            "loaded {} after {} retries",
            descriptor.identity,
            descriptor.attempt
        );
        self.events.emit(
            &LoadEvent::new(EventKind::Complete)
                .with_resource(descriptor)
                .with_reference(Arc::clone(&reference)),
        );
        for tx in waiters {
            let _ = tx.send(Ok(Arc::clone(&reference)));
        }
    }

    fn settle_failure(self: &Arc<Self>, mut descriptor: ResourceDescriptor, error: LoaderError) {
        let settled = {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            let budget = descriptor.max_attempts.unwrap_or(state.config.max_attempts);
            if state.closed {
                Settled::Closed
            } else if error.is_retryable() && descriptor.attempt < budget {
                descriptor.attempt += 1;
                // Counted until requeued so the queue never looks drained in between.
                state.retrying += 1;
                Settled::Retry {
                    delay: state.config.retry_delay(descriptor.attempt),
                    budget,
                }
            } else {
                state.raised.remove(&descriptor.identity);
                Settled::Terminal(state.waiters.remove(&descriptor.identity).unwrap_or_default())
            }
        };

        match settled {
            Settled::Closed => {}
            Settled::Retry { delay, budget } => {
                tracing::warn!(
                    "retrying {} ({}/{}) in {:?}: {}",
                    descriptor.identity,
                    descriptor.attempt,
                    budget,
                    delay,
                    error
                );
                self.events.emit(
                    &LoadEvent::new(EventKind::Retry)
                        .with_resource(descriptor.clone())
                        .with_error(error),
                );
                if delay.is_zero() {
                    self.requeue(descriptor);
                } else {
                    self.schedule_retry(descriptor, delay);
                }
            }
            Settled::Terminal(waiters) => {
                tracing::error!("giving up on {}: {}", descriptor.identity, error);
                self.events.emit(
                    &LoadEvent::new(EventKind::Error)
                        .with_resource(descriptor)
                        .with_error(error.clone()),
                );
                for tx in waiters {
                    let _ = tx.send(Err(error.clone()));
                }
            }
        }
    }

    /// Re-enqueue after `delay` unless the scheduler shuts down first.
    fn schedule_retry(self: &Arc<Self>, descriptor: ResourceDescriptor, delay: Duration) {
        let inner = Arc::clone(self);
        self.spawner.spawn(async move {
            tokio::select! {
                () = inner.shutdown.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    if inner.requeue(descriptor) {
                        inner.try_dispatch();
                    }
                }
            }
        });
    }

    /// Move a retrying descriptor back into the queue, applying any raised priority.
    ///
    /// Returns `false` once the scheduler is closed.
    fn requeue(&self, mut descriptor: ResourceDescriptor) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.retrying = state.retrying.saturating_sub(1);
        if let Some(raised) = state.raised.remove(&descriptor.identity) {
            descriptor.priority = descriptor.priority.max(raised);
        }
        state.queue.enqueue(descriptor);
        true
    }

    /// Fire `queue-drained` once when all work has settled.
    fn check_drained(&self) {
        let drained = {
            let mut state = self.state.lock();
            let idle = state.queue.is_empty() && state.in_flight == 0 && state.retrying == 0;
            if idle && state.active && !state.closed {
                state.active = false;
                true
            } else {
                false
            }
        };
        if drained {
            tracing::debug!("queue drained");
            self.events.emit(&LoadEvent::new(EventKind::QueueDrained));
        }
    }
}
