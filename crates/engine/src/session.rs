//! Client session state and the pure transitions the backend responses
//! drive through it.
//!
//! Everything the UI shows hangs off [`Session`]: the directory listing,
//! search results, the shared selection, the open video with its clip
//! markers, and the merge queue mirror. Mutations (tag edits, renames,
//! deletions) happen on the backend first; the session then reconciles via
//! `apply_*` transitions that return a summary of what changed, so a
//! driver knows whether media needs reloading without diffing state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::markers::{self, ClipSegment};
use crate::selection::{SelectionModel, ViewKind};
use crate::tags;

/// Which media tree a path points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Raw library files; markers, tags and mutations apply here.
    Source,
    /// Cut clips awaiting merge.
    Target,
}

/// The currently open video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub kind: MediaKind,
    pub relpath: String,
}

/// One listing or search result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub relpath: String,
    #[serde(default)]
    pub name: String,
}

/// What produced the current result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultsKind {
    #[default]
    Tag,
    Name,
}

/// One directory of the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listing {
    pub current_path: String,
    pub parent_path: Option<String>,
    pub folders: Vec<ResultRow>,
    pub videos: Vec<ResultRow>,
}

/// Mirror of one backend merge queue row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: i64,
    #[serde(default)]
    pub position: i64,
    pub target_relpath: String,
    #[serde(default)]
    pub filename: String,
}

/// Backend-confirmed outcome of a path-mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    pub changed: bool,
    pub relpath: String,
    pub name: String,
}

/// What a rename reconciliation touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameEffects {
    /// The open video's path changed; its media stream must be reloaded.
    pub media_reload_required: bool,
    pub rows_rewritten: usize,
    pub selection_rekeyed: bool,
}

/// What a delete reconciliation touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteEffects {
    pub playback_stopped: bool,
    pub rows_dropped: usize,
    pub selection_removed: bool,
}

/// The whole client-side state of one curation session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    listing: Listing,
    results: Vec<ResultRow>,
    results_kind: ResultsKind,
    pub selection: SelectionModel,
    current_video: Option<VideoRef>,
    clip_markers: Vec<f64>,
    queue: Vec<QueueItem>,
    queue_selection: BTreeSet<i64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn current_path(&self) -> &str {
        &self.listing.current_path
    }

    pub fn results(&self) -> &[ResultRow] {
        &self.results
    }

    pub fn results_kind(&self) -> ResultsKind {
        self.results_kind
    }

    pub fn current_video(&self) -> Option<&VideoRef> {
        self.current_video.as_ref()
    }

    /// Path of the open video when it is a source file.
    pub fn current_source_relpath(&self) -> Option<&str> {
        self.current_video
            .as_ref()
            .filter(|video| video.kind == MediaKind::Source)
            .map(|video| video.relpath.as_str())
    }

    /// Tags decoded from the open source video's filename.
    pub fn current_tags(&self) -> Vec<String> {
        match self.current_source_relpath() {
            Some(relpath) => tags::extract_tags(tags::filename_from_relpath(relpath)),
            None => Vec::new(),
        }
    }

    /// Opens a video for playback. Pending clip markers are discarded:
    /// markers only ever belong to the video they were set on.
    pub fn play(&mut self, kind: MediaKind, relpath: &str) -> Result<()> {
        if relpath.is_empty() {
            return Err(EngineError::EmptyRelpath);
        }
        info!(?kind, relpath, "opening video");
        self.current_video = Some(VideoRef {
            kind,
            relpath: relpath.to_string(),
        });
        self.clip_markers.clear();
        Ok(())
    }

    pub fn stop_playback(&mut self) {
        self.current_video = None;
        self.clip_markers.clear();
    }

    // --- clip markers -----------------------------------------------------

    pub fn clip_markers(&self) -> &[f64] {
        &self.clip_markers
    }

    /// Adds a marker at `t` seconds on the open source video and returns
    /// the marker count afterwards.
    pub fn add_marker(&mut self, t: f64) -> Result<usize> {
        self.require_source_video()?;
        self.clip_markers = markers::add_marker(&self.clip_markers, t);
        Ok(self.clip_markers.len())
    }

    /// Removes markers near `t` and returns the marker count afterwards.
    pub fn delete_marker_near(&mut self, t: f64) -> Result<usize> {
        self.require_source_video()?;
        self.clip_markers = markers::delete_marker_near(&self.clip_markers, t);
        Ok(self.clip_markers.len())
    }

    pub fn clear_markers(&mut self) {
        self.clip_markers.clear();
    }

    /// Cut segments derived from the current markers.
    pub fn segments(&self) -> Vec<ClipSegment> {
        markers::segments_from_markers(&self.clip_markers)
    }

    fn require_source_video(&self) -> Result<()> {
        match self.current_source_relpath() {
            Some(_) => Ok(()),
            None => Err(EngineError::NoSourceVideo),
        }
    }

    // --- selection --------------------------------------------------------

    /// Applies one checkbox interaction, resolving the view's path order
    /// from the listing or the result list.
    pub fn toggle_selection(
        &mut self,
        view: ViewKind,
        relpath: &str,
        checked: bool,
        shift: bool,
    ) {
        let rows = match view {
            ViewKind::Folders => &self.listing.videos,
            ViewKind::Results => &self.results,
        };
        let items: Vec<&str> = rows.iter().map(|row| row.relpath.as_str()).collect();
        self.selection.toggle(view, &items, relpath, checked, shift);
    }

    pub fn select_all_results(&mut self) {
        let items: Vec<&str> = self.results.iter().map(|row| row.relpath.as_str()).collect();
        self.selection.select_all(&items);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // --- listing and results ----------------------------------------------

    pub fn set_listing(&mut self, listing: Listing) {
        self.listing = listing;
    }

    /// Replaces the result list and prunes selected paths that are no
    /// longer visible in either view. Paths still present in the directory
    /// listing survive, so cross-view selections keep working.
    pub fn replace_results(&mut self, kind: ResultsKind, rows: Vec<ResultRow>) {
        self.results = rows;
        self.results_kind = kind;

        let visible: BTreeSet<&str> = self
            .results
            .iter()
            .chain(self.listing.videos.iter())
            .map(|row| row.relpath.as_str())
            .collect();
        self.selection.retain_visible(|relpath| visible.contains(relpath));
    }

    pub fn clear_results(&mut self) {
        self.replace_results(ResultsKind::Tag, Vec::new());
    }

    // --- mutation reconciliation ------------------------------------------

    /// Reconciles a backend-confirmed rename of `old` into every place the
    /// path is mirrored: the open video, result rows, then the selection.
    ///
    /// A `changed: false` outcome or an empty new path is a no-op; the
    /// session never rewrites state onto an unconfirmed path.
    pub fn apply_rename(&mut self, old: &str, outcome: &RenameOutcome) -> RenameEffects {
        let mut effects = RenameEffects::default();
        if !outcome.changed || old.is_empty() || outcome.relpath.is_empty() {
            return effects;
        }

        if let Some(video) = self.current_video.as_mut()
            && video.kind == MediaKind::Source
            && video.relpath == old
        {
            video.relpath = outcome.relpath.clone();
            effects.media_reload_required = true;
        }

        for row in self.results.iter_mut().filter(|row| row.relpath == old) {
            row.relpath = outcome.relpath.clone();
            if !outcome.name.is_empty() {
                row.name = outcome.name.clone();
            }
            effects.rows_rewritten += 1;
        }

        if self.selection.contains(old) {
            self.selection.rekey(old, &outcome.relpath);
            effects.selection_rekeyed = true;
        }

        debug!(
            old,
            new = %outcome.relpath,
            media_reload = effects.media_reload_required,
            rows = effects.rows_rewritten,
            "rename reconciled"
        );
        effects
    }

    /// Reconciles a backend-confirmed deletion: stops playback if the open
    /// video was deleted, drops result rows and the selection entry.
    pub fn apply_delete(&mut self, relpath: &str) -> DeleteEffects {
        let mut effects = DeleteEffects::default();
        if relpath.is_empty() {
            return effects;
        }

        if self.current_source_relpath() == Some(relpath) {
            self.stop_playback();
            effects.playback_stopped = true;
        }

        let before = self.results.len();
        self.results.retain(|row| row.relpath != relpath);
        effects.rows_dropped = before - self.results.len();

        if self.selection.contains(relpath) {
            self.selection.remove(relpath);
            effects.selection_removed = true;
        }

        debug!(relpath, stopped = effects.playback_stopped, "delete reconciled");
        effects
    }

    // --- merge queue ------------------------------------------------------

    pub fn queue(&self) -> &[QueueItem] {
        &self.queue
    }

    pub fn queue_ids(&self) -> Vec<i64> {
        self.queue.iter().map(|item| item.id).collect()
    }

    pub fn has_queued_target(&self, target_relpath: &str) -> bool {
        self.queue
            .iter()
            .any(|item| item.target_relpath == target_relpath)
    }

    /// Replaces the queue mirror with the backend's view and prunes queue
    /// selections whose ids vanished.
    pub fn replace_queue(&mut self, items: Vec<QueueItem>) {
        self.queue = items;
        let ids: BTreeSet<i64> = self.queue.iter().map(|item| item.id).collect();
        self.queue_selection.retain(|id| ids.contains(id));
    }

    pub fn queue_selection(&self) -> &BTreeSet<i64> {
        &self.queue_selection
    }

    pub fn toggle_queue_item(&mut self, id: i64, checked: bool) {
        if !self.queue.iter().any(|item| item.id == id) {
            return;
        }
        if checked {
            self.queue_selection.insert(id);
        } else {
            self.queue_selection.remove(&id);
        }
    }

    pub fn select_all_queue(&mut self) {
        self.queue_selection = self.queue.iter().map(|item| item.id).collect();
    }

    pub fn clear_queue_selection(&mut self) {
        self.queue_selection.clear();
    }
}

#[cfg(test)]
mod tests {
    use crate::error::EngineError;
    use crate::selection::ViewKind;

    use super::{
        Listing, MediaKind, QueueItem, RenameOutcome, ResultRow, ResultsKind, Session,
    };

    fn row(relpath: &str) -> ResultRow {
        ResultRow {
            relpath: relpath.to_string(),
            name: relpath.rsplit('/').next().unwrap_or(relpath).to_string(),
        }
    }

    fn queue_item(id: i64, target_relpath: &str) -> QueueItem {
        QueueItem {
            id,
            position: id,
            target_relpath: target_relpath.to_string(),
            filename: target_relpath.to_string(),
        }
    }

    fn session_with_results(relpaths: &[&str]) -> Session {
        let mut session = Session::new();
        session.replace_results(
            ResultsKind::Tag,
            relpaths.iter().map(|rp| row(rp)).collect(),
        );
        session
    }

    #[test]
    fn markers_require_an_open_source_video() {
        let mut session = Session::new();
        assert_eq!(session.add_marker(3.0), Err(EngineError::NoSourceVideo));

        session.play(MediaKind::Target, "clips/a.mp4").expect("play");
        assert_eq!(session.add_marker(3.0), Err(EngineError::NoSourceVideo));

        session.play(MediaKind::Source, "a.mp4").expect("play");
        assert_eq!(session.add_marker(3.0), Ok(1));
    }

    #[test]
    fn switching_videos_discards_pending_markers() {
        let mut session = Session::new();
        session.play(MediaKind::Source, "a.mp4").expect("play");
        session.add_marker(3.0).expect("marker");
        session.add_marker(8.0).expect("marker");

        session.play(MediaKind::Source, "b.mp4").expect("play");
        assert!(session.clip_markers().is_empty());
        assert!(session.segments().is_empty());
    }

    #[test]
    fn playing_an_empty_path_is_rejected() {
        let mut session = Session::new();
        assert_eq!(
            session.play(MediaKind::Source, ""),
            Err(EngineError::EmptyRelpath)
        );
    }

    #[test]
    fn current_tags_come_from_the_open_source_filename() {
        let mut session = Session::new();
        session
            .play(MediaKind::Source, "games/match3 [goal, away].mp4")
            .expect("play");

        assert_eq!(session.current_tags(), vec!["goal", "away"]);
    }

    #[test]
    fn rename_rewrites_video_rows_and_selection() {
        let mut session = session_with_results(&["a.mp4", "b.mp4"]);
        session.play(MediaKind::Source, "a.mp4").expect("play");
        session.toggle_selection(ViewKind::Results, "a.mp4", true, false);

        let effects = session.apply_rename(
            "a.mp4",
            &RenameOutcome {
                changed: true,
                relpath: "a [goal].mp4".to_string(),
                name: "a [goal].mp4".to_string(),
            },
        );

        assert!(effects.media_reload_required);
        assert_eq!(effects.rows_rewritten, 1);
        assert!(effects.selection_rekeyed);
        assert_eq!(
            session.current_source_relpath(),
            Some("a [goal].mp4")
        );
        assert_eq!(session.results()[0].relpath, "a [goal].mp4");
        assert!(session.selection.contains("a [goal].mp4"));
        assert!(!session.selection.contains("a.mp4"));
    }

    #[test]
    fn unchanged_rename_outcome_is_a_no_op() {
        let mut session = session_with_results(&["a.mp4"]);
        let effects = session.apply_rename(
            "a.mp4",
            &RenameOutcome {
                changed: false,
                relpath: "a.mp4".to_string(),
                name: "a.mp4".to_string(),
            },
        );

        assert_eq!(effects, Default::default());
    }

    #[test]
    fn rename_of_a_different_open_video_keeps_playback() {
        let mut session = session_with_results(&["a.mp4", "b.mp4"]);
        session.play(MediaKind::Source, "b.mp4").expect("play");

        let effects = session.apply_rename(
            "a.mp4",
            &RenameOutcome {
                changed: true,
                relpath: "a2.mp4".to_string(),
                name: "a2.mp4".to_string(),
            },
        );

        assert!(!effects.media_reload_required);
        assert_eq!(session.current_source_relpath(), Some("b.mp4"));
    }

    #[test]
    fn delete_stops_playback_and_drops_rows_and_selection() {
        let mut session = session_with_results(&["a.mp4", "b.mp4"]);
        session.play(MediaKind::Source, "a.mp4").expect("play");
        session.toggle_selection(ViewKind::Results, "a.mp4", true, false);

        let effects = session.apply_delete("a.mp4");

        assert!(effects.playback_stopped);
        assert_eq!(effects.rows_dropped, 1);
        assert!(effects.selection_removed);
        assert!(session.current_video().is_none());
        assert_eq!(session.results().len(), 1);
        assert!(session.selection.is_empty());
    }

    #[test]
    fn replacing_results_prunes_paths_invisible_in_both_views() {
        let mut session = session_with_results(&["a.mp4", "b.mp4"]);
        session.set_listing(Listing {
            current_path: String::new(),
            parent_path: None,
            folders: Vec::new(),
            videos: vec![row("b.mp4")],
        });
        session.toggle_selection(ViewKind::Results, "a.mp4", true, false);
        session.toggle_selection(ViewKind::Results, "b.mp4", true, false);

        session.replace_results(ResultsKind::Name, vec![row("c.mp4")]);

        // a.mp4 vanished from both views; b.mp4 is still in the listing.
        assert!(!session.selection.contains("a.mp4"));
        assert!(session.selection.contains("b.mp4"));
    }

    #[test]
    fn shift_range_follows_the_result_list_order() {
        let mut session = session_with_results(&["a.mp4", "b.mp4", "c.mp4", "d.mp4"]);
        session.toggle_selection(ViewKind::Results, "a.mp4", true, false);
        session.toggle_selection(ViewKind::Results, "c.mp4", true, true);

        assert_eq!(
            session.selection.relpaths(),
            vec!["a.mp4", "b.mp4", "c.mp4"]
        );
    }

    #[test]
    fn select_all_results_leaves_no_anchor_for_shift_clicks() {
        let mut session = session_with_results(&["a.mp4", "b.mp4", "c.mp4", "d.mp4"]);
        session.toggle_selection(ViewKind::Results, "a.mp4", true, false);
        session.select_all_results();

        session.toggle_selection(ViewKind::Results, "c.mp4", false, true);

        assert_eq!(
            session.selection.relpaths(),
            vec!["a.mp4", "b.mp4", "d.mp4"]
        );
    }

    #[test]
    fn queue_replacement_prunes_vanished_queue_selections() {
        let mut session = Session::new();
        session.replace_queue(vec![queue_item(1, "t/a.mp4"), queue_item(2, "t/b.mp4")]);
        session.toggle_queue_item(1, true);
        session.toggle_queue_item(2, true);

        session.replace_queue(vec![queue_item(2, "t/b.mp4")]);

        assert_eq!(session.queue_selection().len(), 1);
        assert!(session.queue_selection().contains(&2));
    }

    #[test]
    fn queued_target_lookup_matches_exact_paths() {
        let mut session = Session::new();
        session.replace_queue(vec![queue_item(1, "t/a.mp4")]);

        assert!(session.has_queued_target("t/a.mp4"));
        assert!(!session.has_queued_target("t/a"));
    }
}
