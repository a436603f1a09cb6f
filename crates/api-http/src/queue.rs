//! Merge queue controller.
//!
//! The backend's queue table is the single source of truth. Every write
//! goes through it and is followed by a reload, so the session's mirror
//! never drifts from what a merge would actually consume.

use tracing::{debug, info};

use engine::queue::reorder;
use engine::session::Session;

use crate::error::{ApiError, Result};
use crate::reconcile::Collaborator;

/// Replaces the session's queue mirror with the backend's current state.
pub async fn reload<C: Collaborator>(api: &C, session: &mut Session) -> Result<()> {
    let response = api.fetch_queue().await?;
    session.replace_queue(response.items);
    Ok(())
}

/// Adds a target file to the queue, optionally at a specific slot.
///
/// Duplicates are rejected before the request using the loaded mirror;
/// a racing duplicate still comes back as [`ApiError::AlreadyQueued`]
/// via the backend's conflict answer.
pub async fn add<C: Collaborator>(
    api: &C,
    session: &mut Session,
    target_relpath: &str,
    insert_at: Option<usize>,
) -> Result<()> {
    if session.has_queued_target(target_relpath) {
        return Err(ApiError::AlreadyQueued);
    }

    let response = api.queue_add(target_relpath).await?;
    info!(target_relpath, "queued for merge");

    match (response.item, insert_at) {
        (Some(item), Some(index)) => move_and_persist(api, session, item.id, index).await,
        _ => reload(api, session).await,
    }
}

/// Moves one queue item to `target_index` and persists the new order.
///
/// The fresh order is always fetched first so the move works against what
/// the backend actually has, and reloaded afterwards regardless of
/// whether a reorder write happened.
pub async fn move_and_persist<C: Collaborator>(
    api: &C,
    session: &mut Session,
    item_id: i64,
    target_index: usize,
) -> Result<()> {
    reload(api, session).await?;

    if let Some(order) = reorder(&session.queue_ids(), item_id, target_index) {
        debug!(item_id, target_index, "persisting queue order");
        api.queue_reorder(&order).await?;
        reload(api, session).await?;
    }
    Ok(())
}

/// Removes one item from the queue.
pub async fn remove<C: Collaborator>(api: &C, session: &mut Session, id: i64) -> Result<()> {
    api.queue_remove(id).await?;
    reload(api, session).await
}

/// Empties the queue.
pub async fn clear<C: Collaborator>(api: &C, session: &mut Session) -> Result<()> {
    api.queue_clear().await?;
    reload(api, session).await
}
