// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod job;
pub mod logging;
pub mod report;
pub mod signals;
pub mod types;
pub mod workspace;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{Supervisor, SupervisorEvent, SupervisorOptions};
use crate::exec::RealExecutorBackend;
use crate::job::JobSpec;
use crate::report::Reporter;
use crate::workspace::Workspace;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the run workspace
/// - the process executor
/// - the supervisor control loop
/// - Ctrl-C handling
///
/// Returns the exit code for the whole run.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;
    cfg.retain_only(&args.only)?;
    if let Some(timeout) = args.kill_timeout {
        cfg.override_kill_timeout(timeout)?;
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(0);
    }

    let jobs = JobSpec::from_config(&cfg);
    let workspace = Workspace::create(&cfg.settings.workspace_root)?;

    let (event_tx, event_rx) = mpsc::channel::<SupervisorEvent>(64);
    let executor = RealExecutorBackend::new(
        event_tx.clone(),
        workspace.layout().clone(),
        cfg.settings.kill_timeout,
    );

    // Ctrl-C, SIGTERM and SIGHUP → cancel every job, clean up, then exit.
    signals::forward_interrupts(event_tx.clone()).context("installing signal handlers")?;

    info!(jobs = jobs.len(), config = %config_path.display(), "starting run");

    let reporter = Reporter::stdout(cfg.settings.fallback_hint.clone());
    let options = SupervisorOptions {
        cleanup_delay: cfg.settings.cleanup_delay,
    };
    let supervisor = Supervisor::new(jobs, event_rx, executor, workspace, reporter, options);
    let report = supervisor.run().await?;

    Ok(report.exit.exit_code())
}

/// Simple dry-run output: print settings and jobs in registration order.
fn print_dry_run(cfg: &ConfigFile) {
    println!("failfast dry-run");
    println!(
        "  config.workspace_root = {}",
        cfg.settings.workspace_root.display()
    );
    println!("  config.kill_timeout = {:?}", cfg.settings.kill_timeout);
    println!("  config.cleanup_delay = {:?}", cfg.settings.cleanup_delay);
    if let Some(ref hint) = cfg.settings.fallback_hint {
        println!("  config.fallback_hint = {hint}");
    }
    println!();

    println!("jobs ({}):", cfg.jobs.len());
    for job in JobSpec::from_config(cfg) {
        println!("  - {}", job.label);
        println!("      cmd: {}", job.command);
        if let Some(ref dir) = job.dir {
            println!("      dir: {}", dir.display());
        }
    }

    debug!("dry-run complete (no execution)");
}
