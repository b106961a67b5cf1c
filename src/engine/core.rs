// src/engine/core.rs

//! Pure supervisor state machine.
//!
//! Consumes [`SupervisorEvent`]s one at a time and returns the
//! [`CoreCommand`]s the IO shell should perform. No Tokio, no channels, no
//! processes: only the job table and the run phase.
//!
//! Phases:
//! - `Running`: jobs finishing with success are announced.
//! - `Draining`: a failure (or interrupt) was observed; every job has been
//!   told to stop and we only wait for the remaining exits. Nothing is
//!   announced and the recorded exit never changes.
//! - `Concluded`: every job is finished.

use tracing::{debug, info, warn};

use crate::engine::{RunExit, SupervisorEvent};
use crate::types::{JobId, JobState, JobVerdict};

/// Command produced by the core, to be executed by the async shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Print the one-line confirmation for a successful job.
    AnnounceFinished {
        job: JobId,
        label: String,
        pid: Option<u32>,
    },
    /// Ask every job to stop. Harmless for jobs that already exited.
    TerminateAll,
    /// Every job is finished; the run ends with this exit.
    Conclude(RunExit),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    pub keep_running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Draining(RunExit),
    Concluded(RunExit),
}

#[derive(Debug, Clone)]
struct JobSlot {
    label: String,
    state: JobState,
}

#[derive(Debug)]
pub struct SupervisorCore {
    jobs: Vec<JobSlot>,
    phase: Phase,
}

impl SupervisorCore {
    /// Register jobs; their position is their [`JobId`].
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let jobs = labels
            .into_iter()
            .map(|label| JobSlot {
                label: label.into(),
                state: JobState::Pending,
            })
            .collect();
        Self {
            jobs,
            phase: Phase::Running,
        }
    }

    /// Step to perform before any event arrives. Concludes immediately
    /// when there is nothing to run.
    pub fn start(&mut self) -> CoreStep {
        let mut commands = Vec::new();
        let keep_running = !self.maybe_conclude(&mut commands);
        CoreStep {
            commands,
            keep_running,
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn label(&self, job: JobId) -> Option<&str> {
        self.jobs.get(job).map(|s| s.label.as_str())
    }

    pub fn state_of(&self, job: JobId) -> Option<JobState> {
        self.jobs.get(job).map(|s| s.state)
    }

    /// Labels and states in registration order.
    pub fn states(&self) -> impl Iterator<Item = (&str, JobState)> {
        self.jobs.iter().map(|s| (s.label.as_str(), s.state))
    }

    /// The run's exit once concluded.
    pub fn outcome(&self) -> Option<RunExit> {
        match self.phase {
            Phase::Concluded(exit) => Some(exit),
            _ => None,
        }
    }

    /// Whether fail-fast (or an interrupt) has begun.
    pub fn is_draining(&self) -> bool {
        matches!(self.phase, Phase::Draining(_))
    }

    /// Handle a single event, updating the job table and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: SupervisorEvent) -> CoreStep {
        if let Phase::Concluded(_) = self.phase {
            debug!(?event, "event after run concluded; ignoring");
            return CoreStep {
                commands: Vec::new(),
                keep_running: false,
            };
        }

        let mut commands = Vec::new();
        match event {
            SupervisorEvent::JobStarted { job, pid } => self.on_started(job, pid),
            SupervisorEvent::JobLaunchFailed { job, code, error } => {
                warn!(job = self.label(job).unwrap_or("?"), %error, code, "job failed to launch");
                self.on_finished(job, JobVerdict::Failed(code), &mut commands);
            }
            SupervisorEvent::JobFinished { job, verdict } => {
                self.on_finished(job, verdict, &mut commands);
            }
            SupervisorEvent::InterruptRequested => self.on_interrupt(&mut commands),
        }

        let keep_running = !self.maybe_conclude(&mut commands);
        CoreStep {
            commands,
            keep_running,
        }
    }

    fn on_started(&mut self, job: JobId, pid: Option<u32>) {
        let Some(slot) = self.jobs.get_mut(job) else {
            warn!(job, "start reported for unknown job");
            return;
        };
        match slot.state {
            JobState::Pending => {
                debug!(job = %slot.label, ?pid, "job running");
                slot.state = JobState::Running { pid };
            }
            other => {
                warn!(job = %slot.label, state = ?other, "duplicate start ignored");
            }
        }
    }

    fn on_finished(&mut self, job: JobId, verdict: JobVerdict, commands: &mut Vec<CoreCommand>) {
        let Some(slot) = self.jobs.get_mut(job) else {
            warn!(job, "completion reported for unknown job");
            return;
        };

        let pid = match slot.state {
            JobState::Finished(previous) => {
                warn!(job = %slot.label, ?previous, ?verdict, "job already finished; ignoring");
                return;
            }
            JobState::Running { pid } => pid,
            JobState::Pending => None,
        };
        slot.state = JobState::Finished(verdict);

        match self.phase {
            Phase::Running => match verdict {
                JobVerdict::Succeeded => {
                    commands.push(CoreCommand::AnnounceFinished {
                        job,
                        label: slot.label.clone(),
                        pid,
                    });
                }
                JobVerdict::Failed(code) => {
                    info!(job = %slot.label, exit_code = code, "first failure observed; cancelling remaining jobs");
                    self.phase = Phase::Draining(RunExit::Failed { job, code });
                    commands.push(CoreCommand::TerminateAll);
                }
                JobVerdict::Killed => {
                    // Nothing was asked to stop yet, so this was not our doing.
                    warn!(job = %slot.label, "job killed without a termination request; treating as failure");
                    self.phase = Phase::Draining(RunExit::Failed { job, code: 1 });
                    commands.push(CoreCommand::TerminateAll);
                }
            },
            Phase::Draining(_) => {
                debug!(job = %slot.label, %verdict, "job finished while draining");
            }
            Phase::Concluded(_) => {}
        }
    }

    fn on_interrupt(&mut self, commands: &mut Vec<CoreCommand>) {
        match self.phase {
            Phase::Running => {
                info!("interrupt requested; cancelling all jobs");
                self.phase = Phase::Draining(RunExit::Interrupted);
                commands.push(CoreCommand::TerminateAll);
            }
            _ => debug!("interrupt while already draining; ignoring"),
        }
    }

    /// Conclude if every job is finished. Returns true when concluded.
    fn maybe_conclude(&mut self, commands: &mut Vec<CoreCommand>) -> bool {
        let exit = match self.phase {
            Phase::Concluded(_) => return true,
            Phase::Running => RunExit::Success,
            Phase::Draining(exit) => exit,
        };

        if !self.jobs.iter().all(|s| s.state.is_finished()) {
            return false;
        }

        self.phase = Phase::Concluded(exit);
        commands.push(CoreCommand::Conclude(exit));
        true
    }
}
