// src/types.rs

//! Small value types shared by the engine, the executor and the workspace.

use std::fmt;
use std::process::ExitStatus;

/// Position of a job in registration order.
pub type JobId = usize;

const SIGKILL: i32 = 9;
const SIGTERM: i32 = 15;

/// Terminal result of a single job.
///
/// `Killed` means the supervisor stopped the job because a sibling failed
/// first (or the operator interrupted the run). It is never a failure of the
/// job itself and is never reported as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobVerdict {
    Succeeded,
    Failed(i32),
    Killed,
}

impl JobVerdict {
    pub fn is_failure(&self) -> bool {
        matches!(self, JobVerdict::Failed(_))
    }
}

impl fmt::Display for JobVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobVerdict::Succeeded => write!(f, "succeeded"),
            JobVerdict::Failed(code) => write!(f, "failed (exit code {code})"),
            JobVerdict::Killed => write!(f, "killed"),
        }
    }
}

/// Lifecycle of a job as seen by the control loop.
///
/// Transitions only move forward: `Pending -> Running -> Finished`, or
/// straight from `Pending` to `Finished` when the launch itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running { pid: Option<u32> },
    Finished(JobVerdict),
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobState::Finished(_))
    }

    pub fn verdict(&self) -> Option<JobVerdict> {
        match self {
            JobState::Finished(v) => Some(*v),
            _ => None,
        }
    }
}

/// How a process left, before it is classified into a [`JobVerdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The process exited with this status code.
    Code(i32),
    /// The process was terminated by this signal number.
    Signal(i32),
}

impl ExitOutcome {
    #[cfg(unix)]
    pub fn from_status(status: ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        if let Some(code) = status.code() {
            ExitOutcome::Code(code)
        } else if let Some(signal) = status.signal() {
            ExitOutcome::Signal(signal)
        } else {
            ExitOutcome::Code(-1)
        }
    }

    #[cfg(not(unix))]
    pub fn from_status(status: ExitStatus) -> Self {
        ExitOutcome::Code(status.code().unwrap_or(-1))
    }
}

/// Classify a process exit.
///
/// A signal death (or the shell's `128 + signal` rendering of one) only
/// counts as `Killed` when the supervisor actually asked the job to stop.
/// An unrequested signal death is a genuine failure.
pub fn classify_exit(outcome: ExitOutcome, termination_requested: bool) -> JobVerdict {
    match outcome {
        ExitOutcome::Code(0) => JobVerdict::Succeeded,
        ExitOutcome::Signal(_) if termination_requested => JobVerdict::Killed,
        ExitOutcome::Code(code)
            if termination_requested && (code == 128 + SIGTERM || code == 128 + SIGKILL) =>
        {
            JobVerdict::Killed
        }
        ExitOutcome::Code(code) => JobVerdict::Failed(code),
        ExitOutcome::Signal(signal) => JobVerdict::Failed(128 + signal),
    }
}
