// src/cli.rs

//! CLI argument parsing using `clap`.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::parse_duration;

/// Command-line arguments for `failfast`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "failfast",
    version,
    about = "Run independent check commands concurrently and stop at the first failure.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job list (TOML).
    ///
    /// Default: `Failfast.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Failfast.toml")]
    pub config: String,

    /// Run only the job with this label (repeatable).
    #[arg(long, value_name = "LABEL")]
    pub only: Vec<String>,

    /// Grace period between SIGTERM and SIGKILL, e.g. `2s` or `500ms`.
    ///
    /// Overrides `[config].kill_timeout`.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub kill_timeout: Option<Duration>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FAILFAST_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the job list, but don't launch anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_only_and_kill_timeout() {
        let args = CliArgs::try_parse_from([
            "failfast",
            "--config",
            "ci/Failfast.toml",
            "--only",
            "lint",
            "--only",
            "test",
            "--kill-timeout",
            "750ms",
        ])
        .unwrap();

        assert_eq!(args.config, "ci/Failfast.toml");
        assert_eq!(args.only, vec!["lint", "test"]);
        assert_eq!(args.kill_timeout, Some(Duration::from_millis(750)));
        assert!(!args.dry_run);
    }

    #[test]
    fn rejects_bad_kill_timeout() {
        assert!(CliArgs::try_parse_from(["failfast", "--kill-timeout", "soon"]).is_err());
        assert!(
            CliArgs::try_parse_from(["failfast", "--kill-timeout", "6000000000000000h"]).is_err()
        );
    }
}
