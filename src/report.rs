// src/report.rs

//! Operator-facing report.
//!
//! Everything here goes to stdout (or any writer in tests). Diagnostics go
//! through `tracing` on stderr instead.

use std::io::{self, Write};

/// A genuinely failed job, ready to be printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub label: String,
    pub exit_code: i32,
    pub output: String,
}

pub struct Reporter {
    out: Box<dyn Write + Send>,
    fallback_hint: Option<String>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("fallback_hint", &self.fallback_hint)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    pub fn new(out: Box<dyn Write + Send>, fallback_hint: Option<String>) -> Self {
        Self { out, fallback_hint }
    }

    pub fn stdout(fallback_hint: Option<String>) -> Self {
        Self::new(Box::new(io::stdout()), fallback_hint)
    }

    pub fn job_finished(&mut self, label: &str, pid: Option<u32>) -> io::Result<()> {
        match pid {
            Some(pid) => writeln!(self.out, "Finished {label} (pid {pid})")?,
            None => writeln!(self.out, "Finished {label}")?,
        }
        self.out.flush()
    }

    /// One labeled block per failure, then a single hint line.
    pub fn failures(&mut self, failures: &[FailureReport]) -> io::Result<()> {
        for failure in failures {
            writeln!(
                self.out,
                "---- {} failed (exit code {}) ----",
                failure.label, failure.exit_code
            )?;
            self.out.write_all(failure.output.as_bytes())?;
            if !failure.output.is_empty() && !failure.output.ends_with('\n') {
                writeln!(self.out)?;
            }
            writeln!(self.out, "---- end of {} ----", failure.label)?;
        }

        if !failures.is_empty() {
            let hint = match &self.fallback_hint {
                Some(script) => format!(
                    "hint: output above is from concurrent runs; run `{script}` for clearer, sequential diagnostics"
                ),
                None => "hint: output above is from concurrent runs; rerun the failed jobs one at a time (`--only <LABEL>`) for clearer diagnostics".to_string(),
            };
            writeln!(self.out, "{hint}")?;
        }
        self.out.flush()
    }

    pub fn all_succeeded(&mut self, jobs: usize) -> io::Result<()> {
        writeln!(
            self.out,
            "All {jobs} jobs finished: no preliminary critical issues found (non-fatal issues may not have been logged)"
        )?;
        self.out.flush()
    }

    pub fn interrupted(&mut self) -> io::Result<()> {
        writeln!(self.out, "Interrupted: all running jobs were terminated")?;
        self.out.flush()
    }
}
