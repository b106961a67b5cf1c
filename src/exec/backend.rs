// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The supervisor talks to an `ExecutorBackend` instead of spawning
//! processes itself. This makes it easy to swap in a scripted executor in
//! tests while keeping the production process plumbing in [`job_runner`].
//!
//! [`job_runner`]: super::job_runner

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::engine::SupervisorEvent;
use crate::errors::Result;
use crate::job::JobSpec;
use crate::types::JobId;
use crate::workspace::RunLayout;

use super::job_runner::run_job;

/// Trait abstracting how jobs are started and stopped.
///
/// Implementations report progress exclusively through `SupervisorEvent`s:
/// one `JobStarted` (or `JobLaunchFailed`) and then one `JobFinished` per
/// job. They must write each job's exit artifact before sending its
/// completion event.
pub trait ExecutorBackend: Send {
    /// Start all given jobs concurrently.
    fn launch(
        &mut self,
        jobs: Vec<JobSpec>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Request termination of every launched job.
    ///
    /// Jobs that already exited are skipped silently; this never fails
    /// because a job is gone.
    fn terminate_all(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Handle for a launched job's runner task.
struct ActiveJob {
    label: String,
    cancel: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

/// Real executor backend: one OS process per job.
pub struct RealExecutorBackend {
    event_tx: mpsc::Sender<SupervisorEvent>,
    layout: RunLayout,
    kill_timeout: Duration,
    active: HashMap<JobId, ActiveJob>,
}

impl RealExecutorBackend {
    pub fn new(
        event_tx: mpsc::Sender<SupervisorEvent>,
        layout: RunLayout,
        kill_timeout: Duration,
    ) -> Self {
        Self {
            event_tx,
            layout,
            kill_timeout,
            active: HashMap::new(),
        }
    }

    fn spawn_job(&mut self, job: JobSpec) {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let id = job.id;
        let label = job.label.clone();
        let layout = self.layout.clone();
        let events = self.event_tx.clone();
        let kill_timeout = self.kill_timeout;

        let handle = tokio::spawn(async move {
            run_job(job, layout, kill_timeout, events, cancel_rx).await;
        });

        self.active.insert(
            id,
            ActiveJob {
                label,
                cancel: Some(cancel_tx),
                handle,
            },
        );
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn launch(
        &mut self,
        jobs: Vec<JobSpec>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for job in jobs {
                self.spawn_job(job);
            }
            Ok(())
        })
    }

    fn terminate_all(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for (id, active) in self.active.iter_mut() {
                if active.handle.is_finished() {
                    debug!(job = %active.label, id, "job already finished; nothing to terminate");
                    continue;
                }
                match active.cancel.take() {
                    Some(cancel) => {
                        if cancel.send(()).is_err() {
                            debug!(job = %active.label, id, "job exited while being cancelled");
                        }
                    }
                    None => {
                        debug!(job = %active.label, id, "termination already requested");
                    }
                }
            }
            Ok(())
        })
    }
}
