//! Fixed-size pool of announce workers.
//!
//! This module spawns every worker onto the pipeline's [`Lifecycle`] and owns
//! the [`DispatchQueue`] they compete for. There is no scheduling between
//! workers: whichever worker is waiting on the queue when a key arrives claims
//! it. Since each worker runs a single announce at a time, the worker count
//! caps concurrent router calls.

use super::worker::{WorkerContext, worker_loop};
use crate::{ContentRouter, Key, Lifecycle, stat::StatAccumulator, telemetry::record_abandoned};
use core::time::Duration;
use portable_atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// The worker-facing end of the dispatch queue, shared by every worker.
pub(crate) struct DispatchQueue<K> {
    rx: Mutex<mpsc::Receiver<K>>,
    live_workers: AtomicUsize,
}

impl<K: Key> DispatchQueue<K> {
    fn new(rx: mpsc::Receiver<K>, num_workers: usize) -> Self {
        Self {
            rx: Mutex::new(rx),
            live_workers: AtomicUsize::new(num_workers),
        }
    }

    /// Waits for the next key. Returns `None` once the relay is gone and the
    /// queue is drained.
    ///
    /// Dropping the returned future gives up the claim without losing a key.
    pub(crate) async fn claim(&self) -> Option<K> {
        self.rx.lock().await.recv().await
    }

    /// Called by each worker on its way out. The last worker to leave reports
    /// the keys still sitting in the queue, which are abandoned.
    pub(crate) async fn worker_exited(&self, _worker_id: usize) {
        if self.live_workers.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }

        let mut rx = self.rx.lock().await;
        rx.close();
        let abandoned = rx.len();
        record_abandoned(abandoned as u64);
        if abandoned > 0 {
            #[cfg(feature = "tracing")]
            tracing::debug!("Abandoned {abandoned} queued keys on shutdown");
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("Worker {_worker_id} was the last worker to stop");
    }
}

/// Spawns `num_workers` workers onto `lifecycle`, all claiming from the queue
/// fed by `rx`.
///
/// Each worker holds its own handle to the queue, the router and the
/// statistics accumulator; workers never reference one another.
pub(crate) fn spawn_workers<K, R>(
    num_workers: usize,
    rx: mpsc::Receiver<K>,
    router: R,
    stats: Arc<StatAccumulator>,
    lifecycle: &Lifecycle,
    announce_timeout: Duration,
) where
    K: Key,
    R: ContentRouter<K>,
{
    let queue = Arc::new(DispatchQueue::new(rx, num_workers));
    let router = Arc::new(router);

    for worker_id in 0..num_workers {
        let ctx = WorkerContext {
            worker_id,
            queue: Arc::clone(&queue),
            router: Arc::clone(&router),
            stats: Arc::clone(&stats),
            scope: lifecycle.derive(),
            announce_timeout,
        };
        lifecycle.spawn(worker_loop(ctx));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("Spawned {num_workers} announce workers");
}
