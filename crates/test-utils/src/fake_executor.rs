use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use failfast::engine::SupervisorEvent;
use failfast::errors::Result;
use failfast::exec::ExecutorBackend;
use failfast::job::JobSpec;
use failfast::types::JobVerdict;
use failfast::workspace::RunLayout;

/// What a scripted job does once launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Exit on its own after `after` with `verdict`.
    Exit { after: Duration, verdict: JobVerdict },
    /// Run until terminated.
    Hang,
    /// Never start; report a launch failure with this code.
    LaunchFailure { code: i32 },
}

impl Script {
    pub fn succeed_after(ms: u64) -> Self {
        Script::Exit {
            after: Duration::from_millis(ms),
            verdict: JobVerdict::Succeeded,
        }
    }

    pub fn fail_after(ms: u64, code: i32) -> Self {
        Script::Exit {
            after: Duration::from_millis(ms),
            verdict: JobVerdict::Failed(code),
        }
    }
}

/// A fake executor that:
/// - plays a per-label script instead of spawning processes
/// - writes output and exit artifacts the way the real runner does
/// - reports `Killed` for every job still running when terminated.
///
/// Unscripted jobs succeed immediately.
pub struct ScriptedExecutor {
    events: mpsc::Sender<SupervisorEvent>,
    layout: RunLayout,
    scripts: HashMap<String, Script>,
    killed_artifacts: bool,
    cancels: Vec<oneshot::Sender<()>>,
    launched: Arc<Mutex<Vec<String>>>,
    terminations: Arc<AtomicUsize>,
}

impl ScriptedExecutor {
    pub fn new(events: mpsc::Sender<SupervisorEvent>, layout: RunLayout) -> Self {
        Self {
            events,
            layout,
            scripts: HashMap::new(),
            killed_artifacts: true,
            cancels: Vec::new(),
            launched: Arc::new(Mutex::new(Vec::new())),
            terminations: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn script(mut self, label: &str, script: Script) -> Self {
        self.scripts.insert(label.to_string(), script);
        self
    }

    /// Killed jobs leave no exit artifact at all (signalled before writing one).
    pub fn without_killed_artifacts(mut self) -> Self {
        self.killed_artifacts = false;
        self
    }

    pub fn launched(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.launched)
    }

    pub fn terminations(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.terminations)
    }
}

impl ExecutorBackend for ScriptedExecutor {
    fn launch(
        &mut self,
        jobs: Vec<JobSpec>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for job in jobs {
                self.launched.lock().unwrap().push(job.label.clone());
                let script = self
                    .scripts
                    .get(&job.label)
                    .copied()
                    .unwrap_or(Script::succeed_after(0));

                let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
                self.cancels.push(cancel_tx);

                let events = self.events.clone();
                let layout = self.layout.clone();
                let killed_artifacts = self.killed_artifacts;
                tokio::spawn(play(job, script, layout, events, cancel_rx, killed_artifacts));
            }
            Ok(())
        })
    }

    fn terminate_all(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.terminations.fetch_add(1, Ordering::SeqCst);
            for cancel in self.cancels.drain(..) {
                let _ = cancel.send(());
            }
            Ok(())
        })
    }
}

async fn play(
    job: JobSpec,
    script: Script,
    layout: RunLayout,
    events: mpsc::Sender<SupervisorEvent>,
    cancel_rx: oneshot::Receiver<()>,
    killed_artifacts: bool,
) {
    let (after, verdict) = match script {
        Script::LaunchFailure { code } => {
            let _ = std::fs::write(
                layout.output_path(job.id),
                format!("failed to launch job '{}': not found\n", job.label),
            );
            let _ = layout.record_verdict(job.id, JobVerdict::Failed(code));
            let _ = events
                .send(SupervisorEvent::JobLaunchFailed {
                    job: job.id,
                    code,
                    error: "not found".to_string(),
                })
                .await;
            return;
        }
        Script::Exit { after, verdict } => (Some(after), verdict),
        Script::Hang => (None, JobVerdict::Succeeded),
    };

    let _ = events
        .send(SupervisorEvent::JobStarted {
            job: job.id,
            pid: Some(10_000 + job.id as u32),
        })
        .await;

    let finish = async move {
        match after {
            Some(after) => tokio::time::sleep(after).await,
            None => std::future::pending::<()>().await,
        }
    };

    let verdict = tokio::select! {
        _ = finish => {
            let _ = std::fs::write(layout.output_path(job.id), format!("output of {}\n", job.label));
            let _ = layout.record_verdict(job.id, verdict);
            verdict
        }
        Ok(()) = cancel_rx => {
            let _ = std::fs::write(
                layout.output_path(job.id),
                format!("partial output of {}\n", job.label),
            );
            if killed_artifacts {
                let _ = layout.record_verdict(job.id, JobVerdict::Killed);
            }
            JobVerdict::Killed
        }
    };

    let _ = events
        .send(SupervisorEvent::JobFinished {
            job: job.id,
            verdict,
        })
        .await;
}
