//! Generic poll-until-terminal loop for backend jobs.
//!
//! Start-then-poll workflows (duplicate scan, merge) share one supervisor:
//! fetch a status snapshot, let the caller classify it, sleep one cadence,
//! repeat. One failed status fetch kills only that iteration; the job
//! itself is still running on the backend, so the loop retries on the next
//! tick. Only a terminal status, the poll ceiling or cancellation end the
//! loop.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use engine::jobs::{JobTracker, PollConfig};

use crate::error::{ApiError, Result};

/// Caller's classification of one status snapshot.
pub enum PollVerdict<T> {
    /// Keep polling.
    Continue,
    /// Terminal success with the extracted payload.
    Done(T),
    /// Terminal failure reported by the backend.
    Failed(String),
}

/// Polls `fetch` every `config.cadence` until `inspect` returns a terminal
/// verdict, the ceiling elapses or `cancel` fires.
///
/// The tracker handed to `inspect` carries poll bookkeeping; callers feed
/// server-side progress into it to drive staleness reporting. Time is read
/// from the tokio clock, so paused-clock tests drive the loop without
/// real delays.
pub async fn supervise<S, T>(
    workflow: &'static str,
    config: PollConfig,
    cancel: &CancellationToken,
    mut fetch: impl AsyncFnMut() -> Result<S>,
    mut inspect: impl FnMut(&S, &mut JobTracker) -> PollVerdict<T>,
) -> Result<T> {
    let mut tracker = JobTracker::new(now_std());

    loop {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled { workflow });
        }
        let now = now_std();
        if tracker.ceiling_exceeded(now, config.ceiling) {
            return Err(ApiError::Timeout {
                workflow,
                elapsed: tracker.elapsed(now),
            });
        }

        tracker.record_poll(now);
        match fetch().await {
            Ok(snapshot) => match inspect(&snapshot, &mut tracker) {
                PollVerdict::Done(value) => {
                    debug!(workflow, "job finished");
                    return Ok(value);
                }
                PollVerdict::Failed(message) => {
                    return Err(ApiError::JobFailed { workflow, message });
                }
                PollVerdict::Continue => {}
            },
            Err(error) => {
                warn!(workflow, %error, "status poll failed; retrying next tick");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(ApiError::Cancelled { workflow }),
            _ = tokio::time::sleep(config.cadence) => {}
        }
    }
}

/// Current instant on the tokio clock, as `std::time::Instant`.
pub(crate) fn now_std() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}
