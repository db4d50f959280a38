#![doc = include_str!("../README.md")]

mod announcer;
mod config;
mod error;
mod interface;
mod key;
mod lifecycle;
mod pipeline;
mod router;
mod stat;
mod telemetry;


pub use crate::announcer::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::interface::*;
pub use crate::key::*;
pub use crate::lifecycle::*;
pub use crate::router::*;
pub use crate::stat::{AnnounceOutcome, Stat};
// Re-exported so callers can build parent scopes without naming
// `tokio-util` themselves.
pub use tokio_util::sync::CancellationToken;
