use std::collections::VecDeque;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use api_http::error::ApiError;
use api_http::supervisor::{PollVerdict, supervise};
use engine::jobs::{JobStatus, PollConfig};

fn quick_config() -> PollConfig {
    PollConfig {
        cadence: Duration::from_millis(500),
        ceiling: Duration::from_secs(30),
    }
}

fn classify(status: &&str, _tracker: &mut engine::jobs::JobTracker) -> PollVerdict<()> {
    match JobStatus::from_wire(status) {
        JobStatus::Done => PollVerdict::Done(()),
        JobStatus::Error => PollVerdict::Failed(String::from("job failed")),
        JobStatus::Running => PollVerdict::Continue,
    }
}

#[tokio::test(start_paused = true)]
async fn loop_stops_exactly_when_the_status_turns_terminal() {
    let cancel = CancellationToken::new();
    let mut scripted = VecDeque::from(["running", "running", "done"]);
    let mut polls = 0_usize;

    let result = supervise(
        "test job",
        quick_config(),
        &cancel,
        async || {
            polls += 1;
            Ok::<_, ApiError>(scripted.pop_front().expect("poll after terminal status"))
        },
        classify,
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(polls, 3);
}

#[tokio::test(start_paused = true)]
async fn job_that_never_terminates_hits_the_ceiling() {
    let cancel = CancellationToken::new();
    let config = quick_config();

    let result = supervise(
        "test job",
        config,
        &cancel,
        async || Ok::<_, ApiError>("running"),
        classify,
    )
    .await;

    match result {
        Err(ApiError::Timeout { workflow, elapsed }) => {
            assert_eq!(workflow, "test job");
            assert!(elapsed >= config.ceiling);
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn one_failed_fetch_does_not_abort_the_loop() {
    let cancel = CancellationToken::new();
    let mut scripted: VecDeque<Result<&str, ApiError>> = VecDeque::from([
        Err(ApiError::Status {
            status: 502,
            message: String::from("bad gateway"),
        }),
        Ok("running"),
        Ok("done"),
    ]);
    let mut polls = 0_usize;

    let result = supervise(
        "test job",
        quick_config(),
        &cancel,
        async || {
            polls += 1;
            scripted.pop_front().expect("poll after terminal status")
        },
        classify,
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(polls, 3);
}

#[tokio::test(start_paused = true)]
async fn backend_reported_failure_surfaces_as_job_failed() {
    let cancel = CancellationToken::new();
    let mut scripted = VecDeque::from(["running", "error"]);

    let result = supervise(
        "test job",
        quick_config(),
        &cancel,
        async || Ok::<_, ApiError>(scripted.pop_front().expect("poll after terminal status")),
        classify,
    )
    .await;

    assert!(matches!(result, Err(ApiError::JobFailed { .. })));
}

#[tokio::test(start_paused = true)]
async fn cancellation_ends_the_loop_between_polls() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        trigger.cancel();
    });

    let result = supervise(
        "test job",
        quick_config(),
        &cancel,
        async || Ok::<_, ApiError>("running"),
        classify,
    )
    .await;

    assert!(matches!(result, Err(ApiError::Cancelled { .. })));
}

#[tokio::test(start_paused = true)]
async fn already_cancelled_token_skips_polling_entirely() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut polls = 0_usize;

    let result = supervise(
        "test job",
        quick_config(),
        &cancel,
        async || {
            polls += 1;
            Ok::<_, ApiError>("running")
        },
        classify,
    )
    .await;

    assert!(matches!(result, Err(ApiError::Cancelled { .. })));
    assert_eq!(polls, 0);
}
