//! Announce statistics.
//!
//! Workers are the only writers. Readers take a [`Stat`] snapshot, which is
//! consistent for the completed/average counters but may trail the in-flight
//! gauge by a few operations.

use core::time::Duration;
use portable_atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// How a single announce call ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnounceOutcome {
    Succeeded,
    /// The router returned an error.
    Failed(String),
    /// The call did not finish within the announce timeout.
    TimedOut,
}

/// Point-in-time view of the pipeline's announce activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stat {
    /// Announce calls that returned, whatever the outcome.
    pub completed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    /// Announce calls currently running.
    pub in_flight: usize,
    /// Cumulative mean duration of completed announce calls.
    pub average_duration: Duration,
}

#[derive(Default)]
struct Totals {
    completed: u64,
    succeeded: u64,
    failed: u64,
    timed_out: u64,
    average: Duration,
}

/// Shared accumulator behind [`Stat`].
#[derive(Default)]
pub(crate) struct StatAccumulator {
    totals: Mutex<Totals>,
    in_flight: AtomicUsize,
}

impl StatAccumulator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a finished announce call and folds its duration into the
    /// running mean.
    pub(crate) fn record(&self, outcome: &AnnounceOutcome, elapsed: Duration) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);

        let mut totals = self.totals();
        totals.completed += 1;
        match outcome {
            AnnounceOutcome::Succeeded => totals.succeeded += 1,
            AnnounceOutcome::Failed(_) => totals.failed += 1,
            AnnounceOutcome::TimedOut => totals.timed_out += 1,
        }

        // avg_n = avg_{n-1} + (x_n - avg_{n-1}) / n, in nanoseconds.
        let n = u128::from(totals.completed);
        let prev = totals.average.as_nanos();
        let sample = elapsed.as_nanos();
        let next = if sample >= prev {
            prev + (sample - prev) / n
        } else {
            prev - (prev - sample) / n
        };
        totals.average = nanos_to_duration(next);
    }

    pub(crate) fn snapshot(&self) -> Stat {
        let totals = self.totals();
        Stat {
            completed: totals.completed,
            succeeded: totals.succeeded,
            failed: totals.failed,
            timed_out: totals.timed_out,
            in_flight: self.in_flight.load(Ordering::Relaxed),
            average_duration: totals.average,
        }
    }

    // Updates never panic half-way, so a poisoned lock still guards valid
    // totals.
    fn totals(&self) -> MutexGuard<'_, Totals> {
        self.totals.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn nanos_to_duration(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    Duration::new(secs, (nanos % NANOS_PER_SEC) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn averages_and_counts_every_outcome() {
        let stats = StatAccumulator::new();
        for (outcome, ms) in [
            (AnnounceOutcome::Succeeded, 10),
            (AnnounceOutcome::Failed("boom".into()), 20),
            (AnnounceOutcome::TimedOut, 30),
        ] {
            stats.begin();
            stats.record(&outcome, Duration::from_millis(ms));
        }

        let stat = stats.snapshot();
        assert_eq!(stat.completed, 3);
        assert_eq!(stat.succeeded, 1);
        assert_eq!(stat.failed, 1);
        assert_eq!(stat.timed_out, 1);
        assert_eq!(stat.in_flight, 0);
        assert_eq!(stat.average_duration, Duration::from_millis(20));
    }

    #[test]
    fn empty_snapshot_is_zeroed() {
        assert_eq!(StatAccumulator::new().snapshot(), Stat::default());
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let stats = Arc::new(StatAccumulator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.begin();
                        stats.record(&AnnounceOutcome::Succeeded, Duration::from_micros(5));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stat = stats.snapshot();
        assert_eq!(stat.completed, 8000);
        assert_eq!(stat.average_duration, Duration::from_micros(5));
    }

    #[test]
    fn poisoned_lock_still_reports_counters() {
        let stats = Arc::new(StatAccumulator::new());
        stats.begin();
        stats.record(&AnnounceOutcome::Succeeded, Duration::from_millis(4));

        let poisoner = Arc::clone(&stats);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.totals.lock().unwrap();
            panic!("poison the accumulator");
        })
        .join();
        assert!(stats.totals.is_poisoned());

        stats.begin();
        stats.record(&AnnounceOutcome::TimedOut, Duration::from_millis(8));
        let stat = stats.snapshot();
        assert_eq!(stat.completed, 2);
        assert_eq!(stat.timed_out, 1);
        assert_eq!(stat.average_duration, Duration::from_millis(6));
    }
}
