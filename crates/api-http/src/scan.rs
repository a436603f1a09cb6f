//! Duplicate scan workflow.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::info;

use engine::jobs::{JobStatus, PollConfig};

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::protocol::{DuplicateGroup, ScanCounters};
use crate::supervisor::{PollVerdict, now_std, supervise};

const WORKFLOW: &str = "dedupe scan";

/// One progress observation handed to the caller per poll.
#[derive(Debug, Clone, Copy)]
pub struct ScanProgress<'a> {
    pub status: JobStatus,
    pub phase: &'a str,
    pub message: &'a str,
    pub counters: &'a ScanCounters,
    pub log_tail: &'a [String],
    /// The job is running but has not reported progress for a while.
    pub stale: bool,
}

/// A finished scan: the id later move requests refer to, plus the found
/// duplicate groups.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub scan_id: String,
    pub root: String,
    pub groups: Vec<DuplicateGroup>,
}

/// Starts a duplicate scan under `dir_relpath` and polls it to completion,
/// reporting every observed status via `on_progress`.
pub async fn run_dedupe_scan(
    api: &ApiClient,
    dir_relpath: &str,
    cancel: &CancellationToken,
    mut on_progress: impl FnMut(ScanProgress<'_>),
) -> Result<ScanOutcome> {
    let started = api.start_dedupe_scan(dir_relpath).await?;
    if started.scan_id.is_empty() {
        return Err(ApiError::MissingJobId { workflow: WORKFLOW });
    }
    info!(scan_id = %started.scan_id, root = %started.root, "dedupe scan started");

    let scan_id = started.scan_id;
    let root = started.root;
    let mut last_server_update: Option<DateTime<Utc>> = None;

    let groups = supervise(
        WORKFLOW,
        PollConfig::DEDUPE_SCAN,
        cancel,
        async || api.dedupe_scan_status(&scan_id).await,
        |snapshot, tracker| {
            let now = now_std();
            // Staleness runs on the client clock, bumped only when the
            // server-reported timestamp actually advances.
            if let Some(updated_at) = snapshot.updated_at
                && last_server_update.is_none_or(|previous| updated_at > previous)
            {
                last_server_update = Some(updated_at);
                tracker.note_server_update(now);
            }

            let status = snapshot.job_status();
            tracker.record_status(status);
            on_progress(ScanProgress {
                status,
                phase: &snapshot.phase,
                message: &snapshot.message,
                counters: &snapshot.progress,
                log_tail: &snapshot.log_tail,
                stale: tracker.is_stale(now),
            });

            match status {
                JobStatus::Done => PollVerdict::Done(snapshot.groups.clone()),
                JobStatus::Error => PollVerdict::Failed(
                    snapshot
                        .error
                        .clone()
                        .unwrap_or_else(|| String::from("scan failed")),
                ),
                JobStatus::Running => PollVerdict::Continue,
            }
        },
    )
    .await?;

    Ok(ScanOutcome {
        scan_id,
        root,
        groups,
    })
}
