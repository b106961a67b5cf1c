// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs each job as its own OS process with `tokio::process::Command` and
//! reports back to the supervisor via `SupervisorEvent`s.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RealExecutorBackend` used in production; tests replace it with a fake.
//! - [`job_runner`] owns one process from spawn to classified exit,
//!   including SIGTERM/SIGKILL escalation when asked to stop.

pub mod backend;
pub mod job_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use job_runner::run_job;
