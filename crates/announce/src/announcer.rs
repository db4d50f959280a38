//! The node-facing announcement pipeline.
//!
//! This module defines [`Announcer`], which accepts newly stored keys from
//! producers and makes sure the router hears about each of them.
//!
//! ```text
//! provide() ──► intake buffer ──► relay ──► dispatch queue ──► workers ──► router
//! ```
//!
//! ## Responsibilities
//!
//! - Own both bounded queues and spawn the relay and the worker pool.
//! - Apply backpressure to producers when the intake buffer is full.
//! - Refuse new keys once shutdown begins, without ever blocking past it.
//! - Report aggregate announce statistics.

use crate::{
    AnnounceConfig, ContentRouter, Error, Key, Lifecycle, LifecycleState, Result, Stat,
    pipeline::{relay::relay_loop, spawn_workers},
    stat::StatAccumulator,
    telemetry::{increment_provided, increment_rejected},
};
use std::sync::Arc;
use tokio::sync::mpsc::{self, WeakSender, error::TrySendError};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Number of keys waiting in each queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Backlog {
    /// Keys accepted by `provide` but not yet relayed.
    pub intake: usize,
    /// Keys relayed but not yet claimed by a worker.
    pub dispatch: usize,
}

/// Buffered, throttled announcement of content keys to a [`ContentRouter`].
///
/// Cheap to clone: clones submit into the same pipeline and observe the same
/// lifecycle. All tasks run on the Tokio runtime the announcer was created
/// in.
#[derive(Clone)]
pub struct Announcer<K> {
    intake: mpsc::Sender<K>,
    dispatch: WeakSender<K>,
    lifecycle: Lifecycle,
    stats: Arc<StatAccumulator>,
    config: Arc<AnnounceConfig>,
}

impl<K: Key> Announcer<K> {
    /// Builds the pipeline and starts the relay and every worker.
    ///
    /// The pipeline closes when `parent` is cancelled or when
    /// [`Self::close`] is called, whichever comes first. Closing the pipeline
    /// never cancels `parent`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if `config` fails validation.
    /// - [`Error::RuntimeUnavailable`] if called outside a Tokio runtime.
    pub fn new<R>(parent: &CancellationToken, router: R, config: AnnounceConfig) -> Result<Self>
    where
        R: ContentRouter<K>,
    {
        config.validate()?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(Error::RuntimeUnavailable);
        }

        let lifecycle = Lifecycle::new(parent);
        let stats = Arc::new(StatAccumulator::new());

        let (intake_tx, intake_rx) = mpsc::channel(config.intake_capacity);
        let (dispatch_tx, dispatch_rx) = mpsc::channel(config.dispatch_capacity);
        let dispatch = dispatch_tx.downgrade();

        spawn_workers(
            config.num_workers,
            dispatch_rx,
            router,
            Arc::clone(&stats),
            &lifecycle,
            config.announce_timeout,
        );
        lifecycle.spawn(relay_loop(intake_rx, dispatch_tx, lifecycle.derive()));

        // Every task exists now; close can wait for them from here on.
        lifecycle.seal();

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Announcer started with {} workers (intake {}, dispatch {}, timeout {:?})",
            config.num_workers,
            config.intake_capacity,
            config.dispatch_capacity,
            config.announce_timeout
        );

        Ok(Self {
            intake: intake_tx,
            dispatch,
            lifecycle,
            stats,
            config: Arc::new(config),
        })
    }

    /// Submits a key for announcement.
    ///
    /// Returns as soon as the key is in the intake buffer. When the buffer is
    /// full this waits for space, unless shutdown begins first. Once accepted,
    /// the outcome of the announce is the pipeline's concern and is only
    /// visible through [`Self::stat`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceShutdown`] if the pipeline is closing or closed,
    /// including when shutdown begins while this call is waiting.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub async fn provide(&self, key: K) -> Result<()> {
        if self.lifecycle.is_closing() {
            increment_rejected();
            return Err(Error::ServiceShutdown);
        }

        let res = tokio::select! {
            biased;
            () = self.lifecycle.closing() => Err(Error::ServiceShutdown),
            res = self.intake.send(key) => res.map_err(|_| Error::ServiceShutdown),
        };

        match res {
            Ok(()) => increment_provided(),
            Err(_) => increment_rejected(),
        }
        res
    }

    /// Submits a key without waiting.
    ///
    /// # Errors
    ///
    /// - [`Error::IntakeFull`] if the intake buffer has no free slot.
    /// - [`Error::ServiceShutdown`] if the pipeline is closing or closed.
    pub fn try_provide(&self, key: K) -> Result<()> {
        if self.lifecycle.is_closing() {
            increment_rejected();
            return Err(Error::ServiceShutdown);
        }

        match self.intake.try_send(key) {
            Ok(()) => {
                increment_provided();
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                increment_rejected();
                Err(Error::IntakeFull)
            }
            Err(TrySendError::Closed(_)) => {
                increment_rejected();
                Err(Error::ServiceShutdown)
            }
        }
    }

    /// Returns the current announce statistics.
    ///
    /// Safe to call while workers are running. Counters are exact; the
    /// in-flight gauge may trail them slightly.
    pub fn stat(&self) -> Stat {
        self.stats.snapshot()
    }

    /// Returns how many keys are waiting in each queue.
    pub fn backlog(&self) -> Backlog {
        let intake = self.intake.max_capacity() - self.intake.capacity();
        let dispatch = self
            .dispatch
            .upgrade()
            .map_or(0, |tx| tx.max_capacity() - tx.capacity());
        Backlog { intake, dispatch }
    }

    pub fn config(&self) -> &AnnounceConfig {
        &self.config
    }

    /// Resolves once shutdown has begun, whether requested through
    /// [`Self::close`] or by cancelling the parent token.
    pub fn closing(&self) -> WaitForCancellationFuture<'_> {
        self.lifecycle.closing()
    }

    pub fn is_closing(&self) -> bool {
        self.lifecycle.is_closing()
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Shuts the pipeline down and waits for the relay and every worker to
    /// exit.
    ///
    /// Queued keys are abandoned. Announce calls in flight are asked to stop
    /// through their cancellation token and are waited for, bounded by the
    /// announce timeout. Calling this again, or concurrently, has no further
    /// effect and returns once the pipeline is closed.
    pub async fn close(&self) {
        self.lifecycle.close().await;

        #[cfg(feature = "tracing")]
        tracing::debug!("Announcer closed");
    }
}

impl<K> core::fmt::Debug for Announcer<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Announcer")
            .field("config", &self.config)
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}
