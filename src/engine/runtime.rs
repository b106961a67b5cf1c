// src/engine/runtime.rs

use std::fmt;
use std::io;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{FailfastError, Result};
use crate::exec::ExecutorBackend;
use crate::job::JobSpec;
use crate::report::{FailureReport, Reporter};
use crate::types::{JobId, JobVerdict};
use crate::workspace::Workspace;

use super::core::SupervisorCore;
use super::{CoreCommand, CoreStep, JobSummary, RunExit, RunReport, SupervisorEvent};

/// Knobs for the async shell that the core does not care about.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorOptions {
    /// Grace delay before the workspace is removed after a failed or
    /// interrupted run, so that in-flight writes land first.
    pub cleanup_delay: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            cleanup_delay: Duration::from_secs(1),
        }
    }
}

/// Drives [`SupervisorCore`] from executor events and performs its commands.
///
/// This is the single control loop of a run: events are handled strictly
/// one after another, so the job table needs no locking.
pub struct Supervisor<E: ExecutorBackend> {
    core: SupervisorCore,
    jobs: Vec<JobSpec>,
    event_rx: mpsc::Receiver<SupervisorEvent>,
    executor: E,
    workspace: Workspace,
    reporter: Reporter,
    options: SupervisorOptions,
}

impl<E: ExecutorBackend> fmt::Debug for Supervisor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("core", &self.core)
            .field("workspace", &self.workspace)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Supervisor<E> {
    pub fn new(
        jobs: Vec<JobSpec>,
        event_rx: mpsc::Receiver<SupervisorEvent>,
        executor: E,
        workspace: Workspace,
        reporter: Reporter,
        options: SupervisorOptions,
    ) -> Self {
        let core = SupervisorCore::new(jobs.iter().map(|j| j.label.clone()));
        Self {
            core,
            jobs,
            event_rx,
            executor,
            workspace,
            reporter,
            options,
        }
    }

    /// Launch every job, wait for the run to conclude, print the report and
    /// clean up the workspace.
    pub async fn run(mut self) -> Result<RunReport> {
        info!(
            jobs = self.jobs.len(),
            workspace = %self.workspace.path().display(),
            "supervisor started"
        );

        let start = self.core.start();
        let mut exit = self.execute_step(start).await?;

        if exit.is_none() {
            if let Err(err) = self.executor.launch(self.jobs.clone()).await {
                let _ = self.executor.terminate_all().await;
                return Err(err);
            }
        }

        let exit = loop {
            if let Some(exit) = exit {
                break exit;
            }

            let Some(event) = self.event_rx.recv().await else {
                warn!("event channel closed before every job finished");
                let _ = self.executor.terminate_all().await;
                return Err(FailfastError::Other(anyhow::anyhow!(
                    "job events stopped arriving before the run concluded"
                )));
            };

            debug!(?event, "supervisor received event");
            let step = self.core.step(event);
            exit = self.execute_step(step).await?;
        };
        self.conclude(exit).await;

        let jobs = self
            .core
            .states()
            .map(|(label, state)| JobSummary {
                label: label.to_string(),
                state,
            })
            .collect();

        Ok(RunReport { exit, jobs })
    }

    /// Execute the commands of one core step. Returns the run exit once the
    /// core concluded.
    async fn execute_step(&mut self, step: CoreStep) -> Result<Option<RunExit>> {
        let mut exit = None;
        for command in step.commands {
            match command {
                CoreCommand::AnnounceFinished { job, label, pid } => {
                    info!(job = %label, id = job, ?pid, "job succeeded");
                    report_written("finished line", self.reporter.job_finished(&label, pid));
                }
                CoreCommand::TerminateAll => {
                    self.executor.terminate_all().await?;
                }
                CoreCommand::Conclude(run_exit) => {
                    exit = Some(run_exit);
                }
            }
        }

        if !step.keep_running && exit.is_none() {
            debug!("core stopped without concluding");
        }
        Ok(exit)
    }

    async fn conclude(&mut self, exit: RunExit) {
        match exit {
            RunExit::Success => {
                info!(jobs = self.jobs.len(), "all jobs succeeded");
                report_written("success summary", self.reporter.all_succeeded(self.jobs.len()));
                self.workspace.remove();
            }
            RunExit::Failed { job, code } => {
                self.ensure_failure_recorded(job, code);
                let failures = self.collect_failures();
                info!(
                    first = self.core.label(job).unwrap_or("?"),
                    exit_code = code,
                    reported = failures.len(),
                    "run failed"
                );
                report_written("failure report", self.reporter.failures(&failures));
                self.deferred_cleanup().await;
            }
            RunExit::Interrupted => {
                report_written("interrupt notice", self.reporter.interrupted());
                self.deferred_cleanup().await;
            }
        }
    }

    /// The job that failed the run is always dumped, even when its artifact
    /// disagrees (say, a `killed` verdict nobody asked for).
    fn ensure_failure_recorded(&self, job: JobId, code: i32) {
        let layout = self.workspace.layout();
        let recorded = layout.read_verdict(job);
        if recorded == Some(JobVerdict::Failed(code)) {
            return;
        }
        debug!(id = job, ?recorded, code, "rewriting exit artifact of the failing job");
        if let Err(e) = layout.record_verdict(job, JobVerdict::Failed(code)) {
            warn!(id = job, error = %e, "could not rewrite exit artifact");
        }
    }

    /// Jobs whose exit artifact records a genuine failure, in registration
    /// order. A missing artifact or a `killed` one is never reported.
    fn collect_failures(&self) -> Vec<FailureReport> {
        let layout = self.workspace.layout();
        self.jobs
            .iter()
            .filter_map(|job| match layout.read_verdict(job.id) {
                Some(JobVerdict::Failed(exit_code)) => Some(FailureReport {
                    label: job.label.clone(),
                    exit_code,
                    output: layout.read_output(job.id),
                }),
                other => {
                    debug!(job = %job.label, verdict = ?other, "not reported as failure");
                    None
                }
            })
            .collect()
    }

    async fn deferred_cleanup(&mut self) {
        if !self.options.cleanup_delay.is_zero() {
            tokio::time::sleep(self.options.cleanup_delay).await;
        }
        self.workspace.remove();
    }
}

/// Report writes are best-effort. A closed stdout neither stops the drain nor
/// changes the run's exit code.
fn report_written(what: &str, result: io::Result<()>) {
    if let Err(e) = result {
        warn!(error = %e, "could not write {what} to the report output");
    }
}
