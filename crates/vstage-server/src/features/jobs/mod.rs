//! Staging job status callbacks
//!
//! The staging worker reports each transition of a job here. The write is
//! guarded and idempotent, and the new status is then announced on the
//! image's notification channel.

pub mod routes;

pub use routes::{job_routes, JobsState};
