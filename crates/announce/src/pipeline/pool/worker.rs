use super::manager::DispatchQueue;
use crate::{
    ContentRouter, Key,
    stat::{AnnounceOutcome, StatAccumulator},
    telemetry::{increment_in_flight, record_announce},
};
use core::{any::Any, panic::AssertUnwindSafe, time::Duration};
use futures::FutureExt;
use std::sync::Arc;
use tokio::time::{Instant, timeout};
use tokio_util::sync::CancellationToken;

/// Everything a single worker needs. Built by the pool, one per worker.
pub(crate) struct WorkerContext<K, R> {
    pub(crate) worker_id: usize,
    pub(crate) queue: Arc<DispatchQueue<K>>,
    pub(crate) router: Arc<R>,
    pub(crate) stats: Arc<StatAccumulator>,
    pub(crate) scope: CancellationToken,
    pub(crate) announce_timeout: Duration,
}

/// Worker task that announces keys claimed from the dispatch queue.
///
/// Loops claiming one key at a time until the scope is cancelled or the queue
/// is closed and drained. Cancellation wins over a ready key, so a closed
/// pipeline never starts another announce even with keys still queued.
///
/// A failed, panicked or timed out announce is logged and counted, then the
/// worker moves on to the next key. There are no retries here.
pub(crate) async fn worker_loop<K, R>(ctx: WorkerContext<K, R>)
where
    K: Key,
    R: ContentRouter<K>,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {} started", ctx.worker_id);

    loop {
        let key = tokio::select! {
            biased;
            () = ctx.scope.cancelled() => break,
            key = ctx.queue.claim() => match key {
                Some(key) => key,
                None => break,
            },
        };

        announce_one(&ctx, &key).await;
    }

    ctx.queue.worker_exited(ctx.worker_id).await;

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {} stopped", ctx.worker_id);
}

/// Runs a single announce under the configured timeout and records how it
/// ended.
///
/// The router receives a token derived from the pipeline scope, so an announce
/// that is in flight during shutdown is asked to stop, and the wait for it is
/// still bounded by the timeout.
async fn announce_one<K, R>(ctx: &WorkerContext<K, R>, key: &K)
where
    K: Key,
    R: ContentRouter<K>,
{
    ctx.stats.begin();
    increment_in_flight();
    let start = Instant::now();

    // A panicking router fails this key only; the worker keeps going.
    let call = AssertUnwindSafe(async {
        ctx.router.announce(key, ctx.scope.child_token()).await
    })
    .catch_unwind();

    let outcome = match timeout(ctx.announce_timeout, call).await {
        Ok(Ok(Ok(()))) => AnnounceOutcome::Succeeded,
        Ok(Ok(Err(e))) => AnnounceOutcome::Failed(e.to_string()),
        Ok(Err(payload)) => AnnounceOutcome::Failed(panic_message(payload.as_ref())),
        Err(_) => AnnounceOutcome::TimedOut,
    };
    let elapsed = start.elapsed();

    match &outcome {
        AnnounceOutcome::Succeeded => {
            #[cfg(feature = "tracing")]
            tracing::trace!("Worker {} announced {:?} in {:?}", ctx.worker_id, key, elapsed);
        }
        AnnounceOutcome::Failed(_reason) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Worker {} failed to announce {:?}: {}",
                ctx.worker_id,
                key,
                _reason
            );
        }
        AnnounceOutcome::TimedOut => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Worker {} timed out announcing {:?} after {:?}",
                ctx.worker_id,
                key,
                ctx.announce_timeout
            );
        }
    }

    record_announce(&outcome, elapsed.as_secs_f64() * 1000.0);
    ctx.stats.record(&outcome, elapsed);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload");
    format!("router panicked: {detail}")
}
