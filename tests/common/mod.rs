#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use failfast::engine::{RunReport, Supervisor, SupervisorEvent, SupervisorOptions};
use failfast::exec::ExecutorBackend;
use failfast::job::JobSpec;
use failfast::report::Reporter;
use failfast::workspace::{RunLayout, Workspace};

pub use failfast_test_utils::{init_tracing, with_timeout, BrokenOutput, CapturedOutput};

/// Everything a test wants to look at after a supervised run.
pub struct FinishedRun {
    pub report: RunReport,
    pub output: CapturedOutput,
    pub workspace_dir: PathBuf,
    pub workspace_parent: PathBuf,
    _root: TempDir,
}

#[derive(Debug, Default, Clone)]
pub struct RunSetup {
    pub fallback_hint: Option<String>,
    pub interrupt_after: Option<Duration>,
    /// Every report write fails, as with a closed stdout.
    pub broken_output: bool,
}

/// Run `jobs` under a real `Supervisor` with the executor produced by
/// `make_executor`, capturing the report.
pub async fn supervise<E, F>(jobs: Vec<JobSpec>, setup: RunSetup, make_executor: F) -> FinishedRun
where
    E: ExecutorBackend,
    F: FnOnce(mpsc::Sender<SupervisorEvent>, RunLayout) -> E,
{
    init_tracing();

    let root = tempfile::tempdir().expect("tempdir");
    let workspace_parent = root.path().join("failfast");
    let workspace = Workspace::create(&workspace_parent).expect("workspace");
    let workspace_dir = workspace.path().to_path_buf();

    let (tx, rx) = mpsc::channel::<SupervisorEvent>(64);
    let executor = make_executor(tx.clone(), workspace.layout().clone());

    if let Some(delay) = setup.interrupt_after {
        let tx = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SupervisorEvent::InterruptRequested).await;
        });
    }

    let output = CapturedOutput::new();
    let out: Box<dyn Write + Send> = if setup.broken_output {
        Box::new(BrokenOutput)
    } else {
        Box::new(output.clone())
    };
    let reporter = Reporter::new(out, setup.fallback_hint);
    let options = SupervisorOptions {
        cleanup_delay: Duration::ZERO,
    };

    let supervisor = Supervisor::new(jobs, rx, executor, workspace, reporter, options);
    let report = with_timeout(supervisor.run())
        .await
        .expect("supervisor run failed");

    FinishedRun {
        report,
        output,
        workspace_dir,
        workspace_parent,
        _root: root,
    }
}

/// Shell jobs labelled as given, ids in order.
pub fn shell_jobs(jobs: &[(&str, &str)]) -> Vec<JobSpec> {
    jobs.iter()
        .enumerate()
        .map(|(id, (label, cmd))| JobSpec::shell(id, *label, *cmd))
        .collect()
}

/// Placeholder jobs for scripted executors, where the command is ignored.
pub fn labelled_jobs(labels: &[&str]) -> Vec<JobSpec> {
    labels
        .iter()
        .enumerate()
        .map(|(id, label)| JobSpec::shell(id, *label, format!("run {label}")))
        .collect()
}
