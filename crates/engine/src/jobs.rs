//! Lifecycle bookkeeping for long-running backend jobs.
//!
//! The backend reports job state as a string; anything that is not a known
//! terminal state counts as running, so new intermediate phases on the
//! backend never wedge a poll loop. Timing here is pure bookkeeping over
//! caller-supplied instants; the async loop driving it lives elsewhere.

use std::time::{Duration, Instant};

/// A running job whose last observed server-side update is older than this
/// is reported as stalled.
pub const STALE_AFTER: Duration = Duration::from_secs(5);

/// Coarse job state decoded from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Done,
    Error,
}

impl JobStatus {
    /// Classifies a wire status string. Unknown strings map to `Running`.
    pub fn from_wire(status: &str) -> Self {
        match status {
            "done" => Self::Done,
            "error" => Self::Error,
            _ => Self::Running,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// Cadence and ceiling for one kind of poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between consecutive status fetches.
    pub cadence: Duration,
    /// Total elapsed time after which the loop gives up.
    pub ceiling: Duration,
}

impl PollConfig {
    /// Duplicate scan: fast cadence, long-running job.
    pub const DEDUPE_SCAN: Self = Self {
        cadence: Duration::from_millis(500),
        ceiling: Duration::from_secs(30 * 60),
    };

    /// Merge/transcode job.
    pub const MERGE: Self = Self {
        cadence: Duration::from_millis(700),
        ceiling: Duration::from_secs(60 * 60),
    };

    /// Bounded wait for the tag index to finish rebuilding.
    pub const TAG_INDEX: Self = Self {
        cadence: Duration::from_millis(700),
        ceiling: Duration::from_secs(60),
    };
}

/// Per-job poll bookkeeping: when it started, when it was last polled and
/// when the server last reported progress.
///
/// `last_updated_at` is a *client* clock reading taken whenever the
/// server-reported update timestamp advances, so staleness never compares
/// clocks across machines.
#[derive(Debug, Clone)]
pub struct JobTracker {
    started_at: Instant,
    status: JobStatus,
    last_polled_at: Option<Instant>,
    last_updated_at: Option<Instant>,
}

impl JobTracker {
    pub fn new(now: Instant) -> Self {
        Self {
            started_at: now,
            status: JobStatus::Running,
            last_polled_at: None,
            last_updated_at: None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn record_poll(&mut self, now: Instant) {
        self.last_polled_at = Some(now);
    }

    pub fn record_status(&mut self, status: JobStatus) {
        self.status = status;
    }

    /// Marks server-side progress observed at `now`.
    pub fn note_server_update(&mut self, now: Instant) {
        self.last_updated_at = Some(now);
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    pub fn ceiling_exceeded(&self, now: Instant, ceiling: Duration) -> bool {
        self.elapsed(now) > ceiling
    }

    /// True when the job is still running but the server has not reported
    /// progress for [`STALE_AFTER`]. Never true before the first observed
    /// update: a job that has not reported yet is starting, not stalled.
    pub fn is_stale(&self, now: Instant) -> bool {
        self.status == JobStatus::Running
            && self
                .last_updated_at
                .is_some_and(|at| now.saturating_duration_since(at) > STALE_AFTER)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{JobStatus, JobTracker, PollConfig, STALE_AFTER};

    #[test]
    fn unknown_wire_status_counts_as_running() {
        assert_eq!(JobStatus::from_wire("hashing"), JobStatus::Running);
        assert_eq!(JobStatus::from_wire(""), JobStatus::Running);
        assert!(!JobStatus::from_wire("queued").is_terminal());
    }

    #[test]
    fn done_and_error_are_terminal() {
        assert!(JobStatus::from_wire("done").is_terminal());
        assert!(JobStatus::from_wire("error").is_terminal());
    }

    #[test]
    fn job_is_not_stale_before_the_first_server_update() {
        let start = Instant::now();
        let tracker = JobTracker::new(start);

        assert!(!tracker.is_stale(start + Duration::from_secs(60)));
    }

    #[test]
    fn job_goes_stale_when_server_updates_stop() {
        let start = Instant::now();
        let mut tracker = JobTracker::new(start);
        tracker.note_server_update(start + Duration::from_secs(1));

        assert!(!tracker.is_stale(start + Duration::from_secs(5)));
        assert!(tracker.is_stale(start + Duration::from_secs(1) + STALE_AFTER + Duration::from_millis(1)));
    }

    #[test]
    fn terminal_jobs_are_never_stale() {
        let start = Instant::now();
        let mut tracker = JobTracker::new(start);
        tracker.note_server_update(start);
        tracker.record_status(JobStatus::Done);

        assert!(!tracker.is_stale(start + Duration::from_secs(60)));
    }

    #[test]
    fn ceiling_is_checked_against_total_elapsed_time() {
        let start = Instant::now();
        let tracker = JobTracker::new(start);
        let config = PollConfig::TAG_INDEX;

        assert!(!tracker.ceiling_exceeded(start + config.ceiling, config.ceiling));
        assert!(tracker.ceiling_exceeded(
            start + config.ceiling + Duration::from_millis(1),
            config.ceiling
        ));
    }
}
