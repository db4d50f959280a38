//! Optional OpenTelemetry instruments for the announcement pipeline.
//!
//! With the `metrics` feature enabled, instruments are created lazily from the
//! global meter provider, so the host process decides where they are exported.
//! Without it, every function here compiles to a no-op.

#[cfg(feature = "metrics")]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram, UpDownCounter},
};
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

use crate::stat::AnnounceOutcome;

#[cfg(feature = "metrics")]
struct Instruments {
    provided: Counter<u64>,
    rejected: Counter<u64>,
    announces: Counter<u64>,
    in_flight: UpDownCounter<i64>,
    duration_ms: Histogram<f64>,
    abandoned: Counter<u64>,
}

#[cfg(feature = "metrics")]
static INSTRUMENTS: OnceLock<Instruments> = OnceLock::new();

#[cfg(feature = "metrics")]
fn instruments() -> &'static Instruments {
    INSTRUMENTS.get_or_init(|| {
        let meter = opentelemetry::global::meter("announce");
        Instruments {
            provided: meter
                .u64_counter("keys_provided")
                .with_description("Keys accepted into the intake buffer")
                .build(),
            rejected: meter
                .u64_counter("keys_rejected")
                .with_description("Keys refused at submission")
                .build(),
            announces: meter
                .u64_counter("announces")
                .with_description("Completed announce calls by outcome")
                .build(),
            in_flight: meter
                .i64_up_down_counter("announces_inflight")
                .with_description("Concurrent announce calls")
                .build(),
            duration_ms: meter
                .f64_histogram("announce_duration")
                .with_unit("ms")
                .with_description("Duration of a single announce call")
                .build(),
            abandoned: meter
                .u64_counter("keys_abandoned")
                .with_description("Keys dropped from the queues during shutdown")
                .build(),
        }
    })
}

#[cfg(feature = "metrics")]
pub fn increment_provided() {
    instruments().provided.add(1, &[]);
}

#[cfg(not(feature = "metrics"))]
pub fn increment_provided() {}

#[cfg(feature = "metrics")]
pub fn increment_rejected() {
    instruments().rejected.add(1, &[]);
}

#[cfg(not(feature = "metrics"))]
pub fn increment_rejected() {}

#[cfg(feature = "metrics")]
pub fn increment_in_flight() {
    instruments().in_flight.add(1, &[]);
}

#[cfg(not(feature = "metrics"))]
pub fn increment_in_flight() {}

#[cfg(feature = "metrics")]
pub fn record_announce(outcome: &AnnounceOutcome, duration_ms: f64) {
    let outcome = match outcome {
        AnnounceOutcome::Succeeded => "succeeded",
        AnnounceOutcome::Failed(_) => "failed",
        AnnounceOutcome::TimedOut => "timed_out",
    };
    let attrs = [KeyValue::new("outcome", outcome)];
    let instruments = instruments();
    instruments.in_flight.add(-1, &[]);
    instruments.announces.add(1, &attrs);
    instruments.duration_ms.record(duration_ms, &attrs);
}

#[cfg(not(feature = "metrics"))]
pub fn record_announce(_outcome: &AnnounceOutcome, _duration_ms: f64) {}

#[cfg(feature = "metrics")]
pub fn record_abandoned(count: u64) {
    if count > 0 {
        instruments().abandoned.add(count, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn record_abandoned(_count: u64) {}
