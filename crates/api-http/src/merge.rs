//! Merge-and-download workflow.

use tokio_util::sync::CancellationToken;
use tracing::info;

use engine::jobs::{JobStatus, PollConfig};

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::supervisor::{PollVerdict, supervise};

const WORKFLOW: &str = "merge";

#[derive(Debug, Clone, Copy)]
pub struct MergeProgress<'a> {
    pub status: JobStatus,
    pub phase: &'a str,
    pub message: &'a str,
    pub progress_pct: f64,
}

/// A finished merge job and where to fetch its output.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub job_id: String,
    pub download_url: String,
}

/// Starts a merge over the current queue and polls until the output file
/// is ready for download.
///
/// A `done` status without `download_ready` means the backend is still
/// finalizing the output; the loop keeps polling until the flag flips.
pub async fn run_merge(
    api: &ApiClient,
    profile: &str,
    cancel: &CancellationToken,
    mut on_progress: impl FnMut(MergeProgress<'_>),
) -> Result<MergeOutcome> {
    let started = api.start_merge(profile).await?;
    if started.job_id.is_empty() {
        return Err(ApiError::MissingJobId { workflow: WORKFLOW });
    }
    info!(job_id = %started.job_id, profile, "merge started");

    let job_id = started.job_id;
    supervise(
        WORKFLOW,
        PollConfig::MERGE,
        cancel,
        async || api.merge_status(&job_id).await,
        |snapshot, tracker| {
            let status = snapshot.job_status();
            tracker.record_status(status);
            on_progress(MergeProgress {
                status,
                phase: &snapshot.phase,
                message: &snapshot.message,
                progress_pct: snapshot.progress_pct,
            });

            match status {
                JobStatus::Done if snapshot.download_ready => PollVerdict::Done(()),
                JobStatus::Done => PollVerdict::Continue,
                JobStatus::Error => PollVerdict::Failed(
                    snapshot
                        .error
                        .clone()
                        .unwrap_or_else(|| String::from("merge failed")),
                ),
                JobStatus::Running => PollVerdict::Continue,
            }
        },
    )
    .await?;

    Ok(MergeOutcome {
        download_url: api.merge_download_url(&job_id),
        job_id,
    })
}
