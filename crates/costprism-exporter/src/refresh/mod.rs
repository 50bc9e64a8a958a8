//! Scheduled refresh: the job that queries every enabled gauge, and the loop
//! that runs it.

pub mod job;
pub mod scheduler;

pub use job::{RefreshJob, RefreshReport};
pub use scheduler::{InFlight, Scheduler, SchedulerHandle, Tick};
