//! Handle to one in-flight invocation.

use datasource_core::{DataSourceKey, DataSourceResult, Progress, TransportFault};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Receives milestones and the final result of an invocation.
///
/// Both methods run on the task that called [`Invocation::deliver`], never on
/// the worker, and always in milestone order with `on_complete` last.
pub trait DataSourceCallback<O, R> {
    fn on_progress(&mut self, _milestone: Progress) {}

    fn on_complete(&mut self, result: DataSourceResult<O, R>);
}

/// An invocation running on its own worker task.
///
/// Dropping the handle does not stop the exchange; use [`Invocation::cancel`].
#[derive(Debug)]
pub struct Invocation<O, R> {
    key: DataSourceKey,
    progress: Option<mpsc::UnboundedReceiver<Progress>>,
    handle: JoinHandle<DataSourceResult<O, R>>,
}

impl<O, R> Invocation<O, R> {
    pub(crate) fn new(
        key: DataSourceKey,
        progress: mpsc::UnboundedReceiver<Progress>,
        handle: JoinHandle<DataSourceResult<O, R>>,
    ) -> Self {
        Self {
            key,
            progress: Some(progress),
            handle,
        }
    }

    #[must_use]
    pub fn key(&self) -> DataSourceKey {
        self.key
    }

    /// Take the milestone stream. The stream ends when the worker finishes.
    /// Returns `None` if it was already taken.
    pub fn take_progress(&mut self) -> Option<mpsc::UnboundedReceiver<Progress>> {
        self.progress.take()
    }

    /// Abort the worker. The result becomes `TransportFault::Cancelled`
    /// unless the worker had already finished.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the result. A worker that panicked or was aborted yields a
    /// transport failure rather than propagating.
    pub async fn result(self) -> DataSourceResult<O, R> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => TransportFault::Cancelled.into(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "invocation worker failed");
                TransportFault::Worker(e.to_string()).into()
            }
        }
    }

    /// Drive `callback` with every milestone, then the result, on the current
    /// task. Returns the callback so the caller can inspect it.
    pub async fn deliver<C: DataSourceCallback<O, R>>(mut self, mut callback: C) -> C {
        if let Some(mut progress) = self.progress.take() {
            while let Some(milestone) = progress.recv().await {
                callback.on_progress(milestone);
            }
        }
        callback.on_complete(self.result().await);
        callback
    }
}
