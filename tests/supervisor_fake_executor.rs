// tests/supervisor_fake_executor.rs

mod common;
use crate::common::{labelled_jobs, supervise, RunSetup};

use std::sync::atomic::Ordering;
use std::time::Duration;

use failfast::engine::RunExit;
use failfast::types::{JobState, JobVerdict};
use failfast_test_utils::fake_executor::{Script, ScriptedExecutor};

const SIX: [&str; 6] = ["job1", "job2", "job3", "job4", "job5", "job6"];

#[tokio::test]
async fn all_success_reports_each_job_once_in_completion_order() {
    let delays = [60, 10, 50, 20, 40, 30];

    let run = supervise(labelled_jobs(&SIX), RunSetup::default(), |tx, layout| {
        let mut exec = ScriptedExecutor::new(tx, layout);
        for (label, ms) in SIX.iter().zip(delays) {
            exec = exec.script(label, Script::succeed_after(ms));
        }
        exec
    })
    .await;

    assert_eq!(run.report.exit, RunExit::Success);
    assert_eq!(run.report.exit.exit_code(), 0);

    let lines = run.output.lines();
    assert_eq!(
        lines[..6],
        [
            "Finished job2 (pid 10001)",
            "Finished job4 (pid 10003)",
            "Finished job6 (pid 10005)",
            "Finished job5 (pid 10004)",
            "Finished job3 (pid 10002)",
            "Finished job1 (pid 10000)",
        ]
    );
    assert_eq!(lines.len(), 7);
    assert!(lines[6].contains("no preliminary critical issues"));

    for job in &run.report.jobs {
        assert_eq!(job.state, JobState::Finished(JobVerdict::Succeeded));
    }
    assert!(!run.workspace_dir.exists());
    assert!(!run.workspace_parent.exists());
}

#[tokio::test]
async fn first_failure_kills_the_rest_and_dumps_only_the_failed_job() {
    let mut terminations = None;

    let run = supervise(labelled_jobs(&SIX), RunSetup::default(), |tx, layout| {
        let exec = ScriptedExecutor::new(tx, layout)
            .script("job1", Script::succeed_after(10))
            .script("job2", Script::succeed_after(20))
            .script("job3", Script::fail_after(100, 2))
            .script("job4", Script::Hang)
            .script("job5", Script::Hang)
            .script("job6", Script::Hang);
        terminations = Some(exec.terminations());
        exec
    })
    .await;

    assert_eq!(run.report.exit, RunExit::Failed { job: 2, code: 2 });
    assert_eq!(run.report.exit.exit_code(), 2);

    let lines = run.output.lines();
    assert_eq!(lines[0], "Finished job1 (pid 10000)");
    assert_eq!(lines[1], "Finished job2 (pid 10001)");
    assert_eq!(lines[2], "---- job3 failed (exit code 2) ----");
    assert_eq!(lines[3], "output of job3");
    assert_eq!(lines[4], "---- end of job3 ----");
    assert!(lines[5].starts_with("hint:"));
    assert_eq!(lines.len(), 6);

    let text = run.output.text();
    assert!(!text.contains("partial output"));
    assert!(!text.contains("Finished job3"));

    for label in ["job4", "job5", "job6"] {
        assert_eq!(
            run.report.state_of(label),
            Some(JobState::Finished(JobVerdict::Killed))
        );
    }
    assert_eq!(terminations.unwrap().load(Ordering::SeqCst), 1);
    assert!(!run.workspace_dir.exists());
}

#[tokio::test]
async fn killed_jobs_without_exit_artifact_are_suppressed_too() {
    let run = supervise(labelled_jobs(&["a", "b", "c"]), RunSetup::default(), |tx, layout| {
        ScriptedExecutor::new(tx, layout)
            .without_killed_artifacts()
            .script("a", Script::Hang)
            .script("b", Script::fail_after(20, 5))
            .script("c", Script::Hang)
    })
    .await;

    assert_eq!(run.report.exit.exit_code(), 5);
    let text = run.output.text();
    assert!(text.contains("---- b failed (exit code 5) ----"));
    assert!(!text.contains("---- a failed"));
    assert!(!text.contains("---- c failed"));
    assert_eq!(run.report.state_of("a"), Some(JobState::Finished(JobVerdict::Killed)));
}

#[tokio::test]
async fn launch_failure_fails_fast_with_launch_error_as_output() {
    let run = supervise(
        labelled_jobs(&["build", "missing", "test"]),
        RunSetup::default(),
        |tx, layout| {
            ScriptedExecutor::new(tx, layout)
                .script("build", Script::Hang)
                .script("missing", Script::LaunchFailure { code: 127 })
                .script("test", Script::Hang)
        },
    )
    .await;

    assert_eq!(run.report.exit, RunExit::Failed { job: 1, code: 127 });
    let text = run.output.text();
    assert!(text.contains("---- missing failed (exit code 127) ----"));
    assert!(text.contains("failed to launch job 'missing'"));
    assert_eq!(
        run.report.state_of("missing"),
        Some(JobState::Finished(JobVerdict::Failed(127)))
    );
}

#[tokio::test]
async fn hint_names_the_sequential_fallback() {
    let setup = RunSetup {
        fallback_hint: Some("./ci/check-sequential.sh".to_string()),
        ..RunSetup::default()
    };
    let run = supervise(labelled_jobs(&["lint"]), setup, |tx, layout| {
        ScriptedExecutor::new(tx, layout).script("lint", Script::fail_after(0, 1))
    })
    .await;

    let hint = run
        .output
        .lines()
        .into_iter()
        .find(|l| l.starts_with("hint:"))
        .expect("hint line");
    assert!(hint.contains("./ci/check-sequential.sh"));
}

#[tokio::test]
async fn interrupt_terminates_everything_without_failure_output() {
    let setup = RunSetup {
        interrupt_after: Some(Duration::from_millis(30)),
        ..RunSetup::default()
    };
    let run = supervise(labelled_jobs(&["a", "b"]), setup, |tx, layout| {
        ScriptedExecutor::new(tx, layout)
            .script("a", Script::Hang)
            .script("b", Script::Hang)
    })
    .await;

    assert_eq!(run.report.exit, RunExit::Interrupted);
    assert_eq!(run.report.exit.exit_code(), 130);
    assert_eq!(run.output.lines(), vec!["Interrupted: all running jobs were terminated"]);
    assert!(!run.workspace_dir.exists());
}

#[tokio::test]
async fn every_registered_job_is_launched() {
    let mut launched = None;
    let run = supervise(labelled_jobs(&SIX), RunSetup::default(), |tx, layout| {
        let exec = ScriptedExecutor::new(tx, layout);
        launched = Some(exec.launched());
        exec
    })
    .await;

    assert_eq!(run.report.exit, RunExit::Success);
    let launched = launched.unwrap().lock().unwrap().clone();
    assert_eq!(launched, SIX.to_vec());
}

#[tokio::test]
async fn closed_report_output_still_drains_and_keeps_the_exit_code() {
    let mut terminations = None;
    let setup = RunSetup {
        broken_output: true,
        ..RunSetup::default()
    };

    let run = supervise(labelled_jobs(&["quick", "broken", "slow"]), setup, |tx, layout| {
        let exec = ScriptedExecutor::new(tx, layout)
            .script("quick", Script::succeed_after(10))
            .script("broken", Script::fail_after(50, 7))
            .script("slow", Script::Hang);
        terminations = Some(exec.terminations());
        exec
    })
    .await;

    assert_eq!(run.report.exit, RunExit::Failed { job: 1, code: 7 });
    assert_eq!(run.report.exit.exit_code(), 7);
    assert_eq!(
        run.report.state_of("quick"),
        Some(JobState::Finished(JobVerdict::Succeeded))
    );
    assert_eq!(
        run.report.state_of("slow"),
        Some(JobState::Finished(JobVerdict::Killed))
    );
    assert_eq!(terminations.unwrap().load(Ordering::SeqCst), 1);
    assert!(run.output.text().is_empty());
    assert!(!run.workspace_dir.exists());
}

#[tokio::test]
async fn job_that_fails_the_run_is_dumped_even_if_recorded_as_killed() {
    let run = supervise(labelled_jobs(&["rogue", "other"]), RunSetup::default(), |tx, layout| {
        ScriptedExecutor::new(tx, layout)
            .script(
                "rogue",
                Script::Exit {
                    after: Duration::from_millis(20),
                    verdict: JobVerdict::Killed,
                },
            )
            .script("other", Script::Hang)
    })
    .await;

    assert_eq!(run.report.exit, RunExit::Failed { job: 0, code: 1 });
    let text = run.output.text();
    assert!(text.contains("---- rogue failed (exit code 1) ----\noutput of rogue\n---- end of rogue ----"));
    assert!(!text.contains("---- other failed"));
}
