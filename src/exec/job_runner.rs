// src/exec/job_runner.rs

//! Individual job process runner.

use std::fs::File;
use std::io::{self, Write};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::engine::SupervisorEvent;
use crate::job::{CommandSpec, JobSpec};
use crate::types::{classify_exit, ExitOutcome, JobVerdict};
use crate::workspace::RunLayout;

/// Run a single job process to completion and report it.
///
/// - stdout and stderr share one file descriptor on the job's output file,
///   so the capture keeps the interleaving the process produced.
/// - If the cancel channel fires, the process group gets SIGTERM and, after
///   `kill_timeout`, SIGKILL.
/// - Once the leader exits, anything still running in its process group gets
///   SIGTERM.
/// - The exit artifact is written before the completion event is sent.
pub async fn run_job(
    job: JobSpec,
    layout: RunLayout,
    kill_timeout: Duration,
    events: mpsc::Sender<SupervisorEvent>,
    cancel_rx: oneshot::Receiver<()>,
) {
    let event = match launch(&job, &layout) {
        Ok(child) => supervise(&job, &layout, child, kill_timeout, &events, cancel_rx).await,
        Err(err) => launch_failed(&job, &layout, err),
    };

    if events.send(event).await.is_err() {
        debug!(job = %job.label, "supervisor gone; completion dropped");
    }
}

fn launch(job: &JobSpec, layout: &RunLayout) -> Result<Child> {
    let output_path = layout.output_path(job.id);
    let stdout = File::create(&output_path)
        .with_context(|| format!("creating output file {}", output_path.display()))?;
    let stderr = stdout
        .try_clone()
        .context("duplicating output file handle for stderr")?;

    let mut cmd = build_command(&job.command);
    if let Some(dir) = &job.dir {
        cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true);

    // Own process group, so termination reaches everything the job spawned.
    #[cfg(unix)]
    cmd.process_group(0);

    info!(job = %job.label, cmd = %job.command, "starting job process");

    cmd.spawn()
        .with_context(|| format!("failed to launch job '{}' ({})", job.label, job.command))
}

/// Build a command appropriate for the platform.
fn build_command(spec: &CommandSpec) -> Command {
    match spec {
        CommandSpec::Shell(line) => {
            if cfg!(windows) {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(line);
                c
            } else {
                let mut c = Command::new("sh");
                c.arg("-c").arg(line);
                c
            }
        }
        CommandSpec::Direct { program, args } => {
            let mut c = Command::new(program);
            c.args(args);
            c
        }
    }
}

/// Exit code reported for a job that never started, following shell
/// conventions.
pub fn launch_failure_code(err: &anyhow::Error) -> i32 {
    let kind = err
        .chain()
        .find_map(|e| e.downcast_ref::<io::Error>())
        .map(|e| e.kind());
    match kind {
        Some(io::ErrorKind::NotFound) => 127,
        Some(io::ErrorKind::PermissionDenied) => 126,
        _ => 1,
    }
}

fn launch_failed(job: &JobSpec, layout: &RunLayout, err: anyhow::Error) -> SupervisorEvent {
    let code = launch_failure_code(&err);
    let message = format!("{err:#}");
    error!(job = %job.label, error = %message, code, "job could not be launched");

    // The launch error is the job's output.
    let output_path = layout.output_path(job.id);
    let written = File::create(&output_path).and_then(|mut f| writeln!(f, "{message}"));
    if let Err(e) = written {
        warn!(job = %job.label, error = %e, "could not record launch error output");
    }
    record(job, layout, JobVerdict::Failed(code));

    SupervisorEvent::JobLaunchFailed {
        job: job.id,
        code,
        error: message,
    }
}

async fn supervise(
    job: &JobSpec,
    layout: &RunLayout,
    mut child: Child,
    kill_timeout: Duration,
    events: &mpsc::Sender<SupervisorEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) -> SupervisorEvent {
    let pid = child.id();
    if events
        .send(SupervisorEvent::JobStarted { job: job.id, pid })
        .await
        .is_err()
    {
        debug!(job = %job.label, "supervisor gone before job start was reported");
    }

    // Either the process exits on its own, or the supervisor asks it to stop.
    // A dropped cancel sender disables the second branch.
    let waited = tokio::select! {
        status = child.wait() => status.map(|s| (s, false)),
        Ok(()) = &mut cancel_rx => {
            info!(job = %job.label, ?pid, "termination requested");
            terminate(&mut child, kill_timeout, &job.label).await.map(|s| (s, true))
        }
    };

    let verdict = match waited {
        Ok((status, termination_requested)) => {
            let outcome = ExitOutcome::from_status(status);
            let verdict = classify_exit(outcome, termination_requested);
            info!(
                job = %job.label,
                ?pid,
                ?outcome,
                termination_requested,
                %verdict,
                "job process exited"
            );
            verdict
        }
        Err(e) => {
            error!(job = %job.label, error = %e, "waiting for job process failed");
            JobVerdict::Failed(1)
        }
    };

    sweep_process_group(pid, &job.label);
    record(job, layout, verdict);
    SupervisorEvent::JobFinished {
        job: job.id,
        verdict,
    }
}

fn record(job: &JobSpec, layout: &RunLayout, verdict: JobVerdict) {
    if let Err(e) = layout.record_verdict(job.id, verdict) {
        warn!(job = %job.label, error = %e, "could not write exit artifact");
    }
}

/// SIGTERM whatever the job left behind in its process group (`cmd &`), so
/// no job process outlives its leader.
#[cfg(unix)]
fn sweep_process_group(pid: Option<u32>, label: &str) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else { return };
    match killpg(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) => info!(job = %label, pid, "terminated leftover processes of finished job"),
        Err(Errno::ESRCH) => {}
        Err(e) => debug!(job = %label, pid, error = %e, "could not sweep process group"),
    }
}

#[cfg(not(unix))]
fn sweep_process_group(_pid: Option<u32>, _label: &str) {}

/// SIGTERM the job's process group, then SIGKILL it if it is still alive
/// after `grace`.
#[cfg(unix)]
async fn terminate(child: &mut Child, grace: Duration, label: &str) -> io::Result<ExitStatus> {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return child.wait().await;
    };
    let pgid = Pid::from_raw(pid as i32);

    if let Err(e) = killpg(pgid, Signal::SIGTERM) {
        debug!(job = %label, pid, error = %e, "SIGTERM not delivered; process group already gone");
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!(
                job = %label,
                pid,
                ?grace,
                "job ignored SIGTERM; sending SIGKILL"
            );
            if let Err(e) = killpg(pgid, Signal::SIGKILL) {
                debug!(job = %label, pid, error = %e, "SIGKILL to process group failed; killing leader");
                child.start_kill()?;
            }
            child.wait().await
        }
    }
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child, _grace: Duration, _label: &str) -> io::Result<ExitStatus> {
    child.start_kill()?;
    child.wait().await
}
