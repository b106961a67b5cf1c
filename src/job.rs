// src/job.rs

//! Launchable job descriptions derived from the validated config.

use std::fmt;
use std::path::PathBuf;

use crate::config::ConfigFile;
use crate::types::JobId;

/// How a job's process is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// Command line run through the platform shell (`sh -c` / `cmd /C`).
    Shell(String),
    /// Program launched directly with an argument vector.
    Direct { program: String, args: Vec<String> },
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandSpec::Shell(line) => write!(f, "{line}"),
            CommandSpec::Direct { program, args } => {
                write!(f, "{program}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
        }
    }
}

/// A job ready to hand to an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub id: JobId,
    pub label: String,
    pub command: CommandSpec,
    pub dir: Option<PathBuf>,
}

impl JobSpec {
    pub fn shell(id: JobId, label: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            command: CommandSpec::Shell(cmd.into()),
            dir: None,
        }
    }

    /// Build job specs in registration (file) order.
    pub fn from_config(cfg: &ConfigFile) -> Vec<JobSpec> {
        cfg.jobs
            .iter()
            .enumerate()
            .map(|(id, job)| {
                let command = match &job.args {
                    Some(args) => CommandSpec::Direct {
                        program: job.cmd.clone(),
                        args: args.clone(),
                    },
                    None => CommandSpec::Shell(job.cmd.clone()),
                };
                JobSpec {
                    id,
                    label: job.label.clone(),
                    command,
                    dir: job.dir.clone(),
                }
            })
            .collect()
    }
}
