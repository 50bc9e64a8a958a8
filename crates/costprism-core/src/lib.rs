//! costprism core: billing query primitives, the exported gauge set, and the
//! shared error type.
//!
//! This crate carries no runtime or transport dependencies. It describes what
//! the exporter asks the billing API for and how results are named, so the
//! mapping can be tested without a network.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `ExporterError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod billing;
pub mod error;
pub mod metric;

/// Shared result type.
pub use error::{ErrorCode, ExporterError, Result};
