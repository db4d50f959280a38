//! Tasks that move keys from producers to the router.
//!
//! ## Structure
//!
//! - [`relay`] - Drains the intake buffer into the dispatch queue.
//! - [`pool`] - Workers that claim keys and announce them.

pub(crate) mod pool;
pub(crate) mod relay;

pub(crate) use pool::spawn_workers;
