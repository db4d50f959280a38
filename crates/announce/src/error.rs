//! Error types for the announcement pipeline.
//!
//! Only failures a caller can act on surface here. Announce failures reported
//! by the router are handled inside the worker pool (logged and counted) and
//! never reach the producer that submitted the key.
//!
//! ## Error Cases
//! - `ServiceShutdown`: A key was submitted while the pipeline was closing.
//! - `IntakeFull`: A non-blocking submission found the intake buffer full.
//! - `InvalidConfig`: The pipeline could not be constructed.
//! - `RuntimeUnavailable`: Construction happened outside a Tokio runtime.
//! - `InvalidKey`: A textual content key could not be decoded.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the announcement pipeline.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The pipeline is closing or closed and no longer accepts keys.
    #[error("Announcer is shutting down")]
    ServiceShutdown,

    /// The intake buffer has no free slot and the caller asked not to wait.
    #[error("Intake buffer is full")]
    IntakeFull,

    /// The configuration cannot produce a working pipeline.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The announcer was constructed outside a Tokio runtime.
    #[error("No Tokio runtime available to run the announcer")]
    RuntimeUnavailable,

    /// A content key could not be parsed from its textual form.
    #[error("Invalid content key: {reason}")]
    InvalidKey { reason: String },
}
