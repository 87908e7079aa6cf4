//! Removal of extended info whose target entity no longer exists.

pub mod job;
pub mod scheduler;

pub use job::{ReconcileError, ReconcileJob, ReconcileReport, RemovedRecord};
pub use scheduler::{ReconcileScheduler, SchedulerConfig};
