//! Shutdown coordination for the announcement pipeline.
//!
//! A [`Lifecycle`] owns the cancellation scope every pipeline task observes
//! and the [`TaskTracker`] those tasks are spawned on. The scope is a child of
//! the caller's token, so cancelling the parent closes the pipeline while
//! closing the pipeline leaves the parent untouched. The binding is made once,
//! at construction.

use core::future::Future;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tokio_util::task::TaskTracker;

/// Observable phase of a [`Lifecycle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Accepting keys; tasks are running.
    Open,
    /// Shutdown requested; tasks are winding down.
    Closing,
    /// Every tracked task has exited. Terminal.
    Closed,
}

/// Cancellation scope plus the set of tasks bound to it.
///
/// Cheap to clone; clones share the same scope and tracker.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    scope: CancellationToken,
    tracker: TaskTracker,
}

impl Lifecycle {
    /// Derives a new scope from `parent`.
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            scope: parent.child_token(),
            tracker: TaskTracker::new(),
        }
    }

    /// Spawns a task bound to this lifecycle. [`Self::close`] waits for it.
    pub(crate) fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task);
    }

    /// Marks the task set as complete. Called once construction has spawned
    /// every task, so that [`Self::close`] can observe an empty tracker.
    pub(crate) fn seal(&self) {
        self.tracker.close();
    }

    /// Returns a token that is cancelled whenever this scope is.
    ///
    /// Used to hand a bounded context to work derived from the pipeline.
    pub fn derive(&self) -> CancellationToken {
        self.scope.child_token()
    }

    /// A one-shot signal that resolves once shutdown has begun.
    pub fn closing(&self) -> WaitForCancellationFuture<'_> {
        self.scope.cancelled()
    }

    /// Returns `true` once shutdown has begun.
    pub fn is_closing(&self) -> bool {
        self.scope.is_cancelled()
    }

    pub fn state(&self) -> LifecycleState {
        if !self.scope.is_cancelled() {
            LifecycleState::Open
        } else if self.tracker.is_closed() && self.tracker.is_empty() {
            LifecycleState::Closed
        } else {
            LifecycleState::Closing
        }
    }

    /// Begins shutdown and waits until every tracked task has exited.
    ///
    /// Safe to call any number of times, from any number of tasks. Every call
    /// returns once the tasks are gone.
    pub async fn close(&self) {
        if !self.scope.is_cancelled() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Closing announcer scope");
            self.scope.cancel();
        }
        self.tracker.close();
        self.tracker.wait().await;
    }
}
