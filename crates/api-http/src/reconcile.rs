//! Mutation flows that keep the session in step with the backend.
//!
//! Every file mutation follows the same shape: call the backend, fold the
//! confirmed outcome into the [`Session`], then refresh the directory
//! listing and the tag index. The trait seam exists so the flows are
//! testable against a scripted collaborator.

use tracing::{debug, info, warn};

use engine::jobs::PollConfig;
use engine::markers::ClipSegment;
use engine::session::{MediaKind, Session};
use engine::EngineError;

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::protocol::{
    ClipsCreateResponse, CreatedClip, ListResponse, OkResponse, QueueAddResponse, QueueResponse,
    RenameResponse, TagAction, TagEditResponse, TagIndexResponse,
};

/// The backend operations the reconciliation flows depend on.
#[allow(async_fn_in_trait)]
pub trait Collaborator {
    async fn list(&self, path: &str) -> Result<ListResponse>;
    async fn edit_tags(&self, relpath: &str, action: TagAction, tag: &str)
    -> Result<TagEditResponse>;
    async fn rename_file(&self, relpath: &str, new_name: &str) -> Result<RenameResponse>;
    async fn delete_file(&self, relpath: &str) -> Result<OkResponse>;
    async fn create_clips(
        &self,
        relpath: &str,
        segments: &[ClipSegment],
    ) -> Result<ClipsCreateResponse>;
    async fn tag_index(&self, refresh: bool) -> Result<TagIndexResponse>;
    async fn fetch_queue(&self) -> Result<QueueResponse>;
    async fn queue_add(&self, target_relpath: &str) -> Result<QueueAddResponse>;
    async fn queue_reorder(&self, ordered_ids: &[i64]) -> Result<OkResponse>;
    async fn queue_remove(&self, id: i64) -> Result<OkResponse>;
    async fn queue_clear(&self) -> Result<OkResponse>;
}

impl Collaborator for ApiClient {
    async fn list(&self, path: &str) -> Result<ListResponse> {
        ApiClient::list(self, path).await
    }

    async fn edit_tags(
        &self,
        relpath: &str,
        action: TagAction,
        tag: &str,
    ) -> Result<TagEditResponse> {
        ApiClient::edit_tags(self, relpath, action, tag).await
    }

    async fn rename_file(&self, relpath: &str, new_name: &str) -> Result<RenameResponse> {
        ApiClient::rename_file(self, relpath, new_name).await
    }

    async fn delete_file(&self, relpath: &str) -> Result<OkResponse> {
        ApiClient::delete_file(self, relpath).await
    }

    async fn create_clips(
        &self,
        relpath: &str,
        segments: &[ClipSegment],
    ) -> Result<ClipsCreateResponse> {
        ApiClient::create_clips(self, relpath, segments).await
    }

    async fn tag_index(&self, refresh: bool) -> Result<TagIndexResponse> {
        ApiClient::tag_index(self, refresh).await
    }

    async fn fetch_queue(&self) -> Result<QueueResponse> {
        ApiClient::fetch_queue(self).await
    }

    async fn queue_add(&self, target_relpath: &str) -> Result<QueueAddResponse> {
        ApiClient::queue_add(self, target_relpath).await
    }

    async fn queue_reorder(&self, ordered_ids: &[i64]) -> Result<OkResponse> {
        ApiClient::queue_reorder(self, ordered_ids).await
    }

    async fn queue_remove(&self, id: i64) -> Result<OkResponse> {
        ApiClient::queue_remove(self, id).await
    }

    async fn queue_clear(&self) -> Result<OkResponse> {
        ApiClient::queue_clear(self).await
    }
}

/// Outcome counts of a bulk tag edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl BulkReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Drives mutations against a collaborator and reconciles the session.
#[derive(Debug)]
pub struct Reconciler<C> {
    api: C,
}

impl<C: Collaborator> Reconciler<C> {
    pub fn new(api: C) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &C {
        &self.api
    }

    /// Reloads the directory listing at `path` into the session.
    pub async fn load_listing(&self, session: &mut Session, path: &str) -> Result<()> {
        let listing = self.api.list(path).await?;
        session.set_listing(listing.into());
        Ok(())
    }

    /// Adds or removes one tag on one file and folds the resulting rename
    /// into the session.
    pub async fn edit_tag(
        &self,
        session: &mut Session,
        relpath: &str,
        action: TagAction,
        tag: &str,
    ) -> Result<TagEditResponse> {
        let response = self.api.edit_tags(relpath, action, tag).await?;
        if response.changed {
            let effects = session.apply_rename(relpath, &response.rename_outcome());
            debug!(relpath, ?action, tag, ?effects, "tag edit reconciled");
        }
        self.refresh_after_mutation(session).await;
        Ok(response)
    }

    /// Applies one tag edit to every target in order.
    ///
    /// One failed target never aborts the rest: each file's edit stands on
    /// its own, and the report carries the counts. The shared refresh runs
    /// once at the end.
    pub async fn edit_tag_bulk(
        &self,
        session: &mut Session,
        action: TagAction,
        tag: &str,
        targets: &[String],
    ) -> BulkReport {
        let mut report = BulkReport::default();
        for relpath in targets.iter().filter(|relpath| !relpath.is_empty()) {
            match self.api.edit_tags(relpath, action, tag).await {
                Ok(response) => {
                    if response.changed {
                        session.apply_rename(relpath, &response.rename_outcome());
                    }
                    report.succeeded += 1;
                }
                Err(error) => {
                    warn!(relpath, %error, "tag edit failed for one target");
                    report.failed += 1;
                }
            }
        }
        info!(
            ?action,
            tag,
            succeeded = report.succeeded,
            failed = report.failed,
            "bulk tag edit finished"
        );
        self.refresh_after_mutation(session).await;
        report
    }

    /// Renames one source file and folds the confirmed path into the
    /// session.
    pub async fn rename_file(
        &self,
        session: &mut Session,
        relpath: &str,
        new_name: &str,
    ) -> Result<RenameResponse> {
        let response = self.api.rename_file(relpath, new_name).await?;
        if !response.ok {
            return Err(ApiError::MutationRejected {
                operation: "rename",
            });
        }
        if response.changed {
            session.apply_rename(relpath, &response.rename_outcome());
        }
        self.refresh_after_mutation(session).await;
        Ok(response)
    }

    /// Deletes one source file and scrubs it from the session.
    pub async fn delete_file(&self, session: &mut Session, relpath: &str) -> Result<()> {
        let response = self.api.delete_file(relpath).await?;
        if !response.ok {
            return Err(ApiError::MutationRejected {
                operation: "delete",
            });
        }
        session.apply_delete(relpath);
        self.refresh_after_mutation(session).await;
        Ok(())
    }

    /// Cuts the open source video along the session's derived segments and
    /// opens the first created clip for review.
    pub async fn create_clips(&self, session: &mut Session) -> Result<Vec<CreatedClip>> {
        let relpath = session
            .current_source_relpath()
            .ok_or(ApiError::Engine(EngineError::NoSourceVideo))?
            .to_string();
        let segments = session.segments();

        let response = self.api.create_clips(&relpath, &segments).await?;
        info!(relpath, created = response.created.len(), "clips created");
        session.clear_markers();
        self.refresh_after_mutation(session).await;

        if let Some(first) = response.created.first() {
            session.play(MediaKind::Source, &first.relpath)?;
        }
        Ok(response.created)
    }

    /// Fetches the tag index. With `refresh`, waits out a running rebuild:
    /// polls on a short cadence until `building` clears or the bounded
    /// wait elapses. The wait ceiling is not an error; stale tag counts
    /// beat a stuck client.
    pub async fn tag_index(&self, refresh: bool) -> Result<TagIndexResponse> {
        let first = self.api.tag_index(refresh).await?;
        if !first.building {
            return Ok(first);
        }

        let config = PollConfig::TAG_INDEX;
        let started = tokio::time::Instant::now();
        loop {
            tokio::time::sleep(config.cadence).await;
            let snapshot = self.api.tag_index(false).await?;
            if !snapshot.building {
                return Ok(snapshot);
            }
            if started.elapsed() > config.ceiling {
                warn!("tag index still building after bounded wait; proceeding");
                return Ok(snapshot);
            }
        }
    }

    /// Post-mutation refresh: reload the current listing and wait for the
    /// tag index to pick up the change. The mutation itself has already
    /// been confirmed, so failures here only cost freshness and are
    /// logged, not propagated.
    async fn refresh_after_mutation(&self, session: &mut Session) {
        let path = session.current_path().to_string();
        match self.api.list(&path).await {
            Ok(listing) => session.set_listing(listing.into()),
            Err(error) => warn!(%error, "listing reload after mutation failed"),
        }
        if let Err(error) = self.tag_index(true).await {
            warn!(%error, "tag index refresh after mutation failed");
        }
    }
}
