// src/workspace.rs

//! Per-run temporary workspace.
//!
//! Every run gets a uniquely named directory under a shared parent. Each job
//! owns two files inside it, so no file is ever written by two processes:
//!
//! - `job-<n>.out`: merged stdout/stderr of the job
//! - `job-<n>.exit`: the job's recorded verdict (`0`, an exit code, or `killed`)
//!
//! The directory is removed when the run ends. The shared parent is removed
//! too, but only when no sibling run still has a directory in it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::errors::{FailfastError, Result};
use crate::types::{JobId, JobVerdict};

const KILLED_ARTIFACT: &str = "killed";

/// Paths and artifact helpers for one run directory.
///
/// Cheap to clone; handed to every job runner.
#[derive(Debug, Clone)]
pub struct RunLayout {
    dir: PathBuf,
}

impl RunLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn output_path(&self, job: JobId) -> PathBuf {
        self.dir.join(format!("job-{job}.out"))
    }

    pub fn exit_path(&self, job: JobId) -> PathBuf {
        self.dir.join(format!("job-{job}.exit"))
    }

    /// Write the job's exit artifact.
    ///
    /// Written to a temporary name and renamed, so a reader never sees a
    /// half-written artifact.
    pub fn record_verdict(&self, job: JobId, verdict: JobVerdict) -> io::Result<()> {
        let path = self.exit_path(job);
        let tmp = path.with_extension("exit.tmp");
        fs::write(&tmp, encode_verdict(verdict))?;
        fs::rename(&tmp, &path)
    }

    /// Read the job's exit artifact, if one was written and is readable.
    pub fn read_verdict(&self, job: JobId) -> Option<JobVerdict> {
        let contents = fs::read_to_string(self.exit_path(job)).ok()?;
        decode_verdict(&contents)
    }

    /// Captured output of the job; empty when nothing was captured.
    pub fn read_output(&self, job: JobId) -> String {
        match fs::read(self.output_path(job)) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        }
    }
}

fn encode_verdict(verdict: JobVerdict) -> String {
    match verdict {
        JobVerdict::Succeeded => "0".to_string(),
        JobVerdict::Failed(code) => code.to_string(),
        JobVerdict::Killed => KILLED_ARTIFACT.to_string(),
    }
}

fn decode_verdict(s: &str) -> Option<JobVerdict> {
    let s = s.trim();
    if s == KILLED_ARTIFACT {
        return Some(JobVerdict::Killed);
    }
    match s.parse::<i32>().ok()? {
        0 => Some(JobVerdict::Succeeded),
        code => Some(JobVerdict::Failed(code)),
    }
}

/// Scoped run directory.
///
/// Dropping the workspace removes it; [`Workspace::remove`] can be called
/// earlier and any number of times.
#[derive(Debug)]
pub struct Workspace {
    layout: RunLayout,
    parent: PathBuf,
    dir: Option<TempDir>,
}

impl Workspace {
    /// Create a fresh run directory under `parent` (created if missing).
    pub fn create(parent: impl AsRef<Path>) -> Result<Self> {
        let parent = parent.as_ref();
        fs::create_dir_all(parent).map_err(|e| {
            FailfastError::Workspace(format!("creating {}: {e}", parent.display()))
        })?;

        let dir = tempfile::Builder::new()
            .prefix("run-")
            .rand_bytes(12)
            .tempdir_in(parent)
            .map_err(|e| {
                FailfastError::Workspace(format!(
                    "creating run directory in {}: {e}",
                    parent.display()
                ))
            })?;

        debug!(dir = %dir.path().display(), "created run workspace");

        Ok(Self {
            layout: RunLayout::new(dir.path()),
            parent: parent.to_path_buf(),
            dir: Some(dir),
        })
    }

    pub fn path(&self) -> &Path {
        self.layout.dir()
    }

    pub fn layout(&self) -> &RunLayout {
        &self.layout
    }

    /// Best-effort removal of the run directory, then of the parent if empty.
    ///
    /// Errors are logged at debug level and otherwise ignored.
    pub fn remove(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!(dir = %path.display(), "removed run workspace"),
                Err(e) => debug!(dir = %path.display(), error = %e, "failed to remove run workspace"),
            }
        }

        // Fails (and is ignored) while sibling runs still have directories here.
        if let Err(e) = fs::remove_dir(&self.parent) {
            debug!(
                parent = %self.parent.display(),
                error = %e,
                "workspace parent left in place"
            );
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.remove();
    }
}
