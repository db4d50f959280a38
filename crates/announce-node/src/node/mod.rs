//! Host process wiring around the announce pipeline.
//!
//! ## Structure
//!
//! - [`config`] - CLI/env configuration.
//! - [`intake`] - Stdin key intake and periodic stats reporting.
//! - [`router`] - Simulated routing overlay.
//! - [`telemetry`] - Logging and optional OpenTelemetry export.

pub mod config;
pub mod intake;
pub mod router;
pub mod telemetry;
