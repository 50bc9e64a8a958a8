//! costprism exporter library entry.
//!
//! Wires config, the billing client, the refresh job and its scheduler, the
//! gauge registry, and the HTTP surface into one exporter. Consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod billing;
pub mod config;
pub mod obs;
pub mod ops;
pub mod refresh;
pub mod router;
