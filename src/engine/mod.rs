// src/engine/mod.rs

//! Supervision engine for failfast.
//!
//! The pure state machine lives in [`core`]: it owns the label/state table,
//! decides when to announce a finished job, when to cancel everything and
//! when the run is over. The async shell in [`runtime`] feeds it events from
//! the executor and Ctrl-C, performs its commands and prints the report.

use crate::types::{JobId, JobState, JobVerdict};

/// Events flowing into the control loop from job runners and signal handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// The job's process was spawned.
    JobStarted { job: JobId, pid: Option<u32> },
    /// The job's process could not be spawned at all.
    JobLaunchFailed {
        job: JobId,
        code: i32,
        error: String,
    },
    /// The job's process exited and was classified.
    JobFinished { job: JobId, verdict: JobVerdict },
    /// The operator asked the run to stop (Ctrl-C).
    InterruptRequested,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    Success,
    /// The first observed failure; later failures never replace it.
    Failed { job: JobId, code: i32 },
    Interrupted,
}

impl RunExit {
    /// Process exit code for the whole run.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunExit::Success => 0,
            RunExit::Failed { code, .. } => *code,
            RunExit::Interrupted => 130,
        }
    }
}

/// Final state of one job, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub label: String,
    pub state: JobState,
}

/// What [`Supervisor::run`] hands back.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub exit: RunExit,
    pub jobs: Vec<JobSummary>,
}

impl RunReport {
    pub fn state_of(&self, label: &str) -> Option<JobState> {
        self.jobs.iter().find(|j| j.label == label).map(|j| j.state)
    }
}

pub mod core;
pub mod runtime;

pub use self::core::{CoreCommand, CoreStep, SupervisorCore};
pub use self::runtime::{Supervisor, SupervisorOptions};
