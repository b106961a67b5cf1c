// tests/property_first_failure.rs

use proptest::prelude::*;

use failfast::engine::{CoreCommand, RunExit, SupervisorCore, SupervisorEvent};
use failfast::types::JobVerdict;

fn verdict_strategy() -> impl Strategy<Value = JobVerdict> {
    prop_oneof![
        3 => Just(JobVerdict::Succeeded),
        1 => (1..=255i32).prop_map(JobVerdict::Failed),
    ]
}

/// Job count, a completion order (a permutation) and a verdict per job.
fn run_strategy() -> impl Strategy<Value = (Vec<usize>, Vec<JobVerdict>)> {
    (1..=8usize).prop_flat_map(|n| {
        (
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
            proptest::collection::vec(verdict_strategy(), n),
        )
    })
}

proptest! {
    #[test]
    fn first_observed_failure_decides_the_exit((order, verdicts) in run_strategy()) {
        let n = order.len();
        let mut core = SupervisorCore::new((0..n).map(|i| format!("job{i}")));
        for job in 0..n {
            core.step(SupervisorEvent::JobStarted { job, pid: Some(job as u32) });
        }

        let mut first_failure: Option<(usize, i32)> = None;
        let mut expected_announcements = Vec::new();
        let mut announcements = Vec::new();
        let mut terminations = 0;
        let mut conclusions = Vec::new();

        for (step_idx, &job) in order.iter().enumerate() {
            let verdict = verdicts[job];
            match verdict {
                JobVerdict::Failed(code) if first_failure.is_none() => {
                    first_failure = Some((job, code));
                }
                JobVerdict::Succeeded if first_failure.is_none() => {
                    expected_announcements.push(job);
                }
                _ => {}
            }

            let step = core.step(SupervisorEvent::JobFinished { job, verdict });
            for cmd in step.commands {
                match cmd {
                    CoreCommand::AnnounceFinished { job, .. } => announcements.push(job),
                    CoreCommand::TerminateAll => terminations += 1,
                    CoreCommand::Conclude(exit) => conclusions.push(exit),
                }
            }

            let last = step_idx + 1 == n;
            prop_assert_eq!(step.keep_running, !last);
        }

        let expected_exit = match first_failure {
            Some((job, code)) => RunExit::Failed { job, code },
            None => RunExit::Success,
        };
        prop_assert_eq!(conclusions, vec![expected_exit]);
        prop_assert_eq!(announcements, expected_announcements);
        prop_assert_eq!(terminations, usize::from(first_failure.is_some()));
        prop_assert_eq!(core.outcome(), Some(expected_exit));
    }
}
