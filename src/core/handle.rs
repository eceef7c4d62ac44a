//! Completion handles returned to callers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::core::{LoadedResource, LoaderError};

/// Outcome of loading one resource.
pub type LoadResult = Result<Arc<LoadedResource>, LoaderError>;

/// Resolves once the requested resource succeeds or fails terminally.
///
/// If the scheduler goes away before resolving, the handle yields
/// [`LoaderError::Shutdown`].
#[derive(Debug)]
#[must_use = "a load handle does nothing unless awaited"]
pub struct LoadHandle {
    rx: oneshot::Receiver<LoadResult>,
}

impl LoadHandle {
    pub(crate) fn channel() -> (oneshot::Sender<LoadResult>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    pub(crate) fn ready(result: LoadResult) -> Self {
        let (tx, handle) = Self::channel();
        let _ = tx.send(result);
        handle
    }
}

impl Future for LoadHandle {
    type Output = LoadResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(LoaderError::Shutdown)))
    }
}
