//! Batch coordination: aggregate many loads into one ordered result.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::core::events::{BatchProgress, EventBus, EventKind, LoadEvent};
use crate::core::{LoadHandle, LoadResult, LoaderError, ResourceDescriptor};

/// Per-batch bookkeeping, owned by the coordinating task.
struct BatchState {
    expected: usize,
    completed: usize,
    results: Vec<Option<LoadResult>>,
}

/// Resolves with one result per submitted descriptor, in input order.
///
/// Failures occupy their slot as `Err`; the batch itself never fails.
#[derive(Debug)]
#[must_use = "a batch handle does nothing unless awaited"]
pub struct BatchHandle {
    rx: oneshot::Receiver<Vec<LoadResult>>,
    expected: usize,
}

impl BatchHandle {
    pub(crate) fn ready(results: Vec<LoadResult>) -> Self {
        let expected = results.len();
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(results);
        Self { rx, expected }
    }

    pub(crate) const fn pending(rx: oneshot::Receiver<Vec<LoadResult>>, expected: usize) -> Self {
        Self { rx, expected }
    }

    /// Number of results the batch resolves to.
    pub const fn len(&self) -> usize {
        self.expected
    }

    /// Whether the batch was empty.
    pub const fn is_empty(&self) -> bool {
        self.expected == 0
    }
}

impl Future for BatchHandle {
    type Output = Vec<LoadResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let expected = self.expected;
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| vec![Err(LoaderError::Shutdown); expected])
        })
    }
}

/// Await every member, emit progress as each settles, then publish the ordered results.
///
/// Members without a descriptor were rejected before queueing; their handle is
/// already resolved with the rejection.
pub(crate) async fn coordinate(
    batch_id: Uuid,
    members: Vec<(Option<ResourceDescriptor>, LoadHandle)>,
    events: EventBus,
    tx: oneshot::Sender<Vec<LoadResult>>,
) {
    let mut state = BatchState {
        expected: members.len(),
        completed: 0,
        results: vec![None; members.len()],
    };

    let mut pending: FuturesUnordered<_> = members
        .into_iter()
        .enumerate()
        .map(|(index, (descriptor, handle))| async move { (index, descriptor, handle.await) })
        .collect();

    while let Some((index, descriptor, result)) = pending.next().await {
        state.completed += 1;
        state.results[index] = Some(result);
        tracing::debug!(
            "batch {} progress {}/{} ({})",
            batch_id,
            state.completed,
            state.expected,
            descriptor.as_ref().map_or("<invalid entry>", |d| d.identity.as_str())
        );
        let mut event = LoadEvent::new(EventKind::Progress).with_progress(BatchProgress {
            batch_id,
            completed: state.completed,
            total: state.expected,
        });
        if let Some(descriptor) = descriptor {
            event = event.with_resource(descriptor);
        }
        events.emit(&event);
    }

    let results: Vec<LoadResult> = state
        .results
        .into_iter()
        .map(|slot| slot.unwrap_or(Err(LoaderError::Shutdown)))
        .collect();
    let failed = results.iter().filter(|r| r.is_err()).count();
    tracing::info!(
        "batch {} finished: {} loaded, {} failed",
        batch_id,
        results.len() - failed,
        failed
    );
    let _ = tx.send(results);
}
