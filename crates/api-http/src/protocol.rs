//! Wire types for the collaborator backend's JSON API.
//!
//! Deserialization is deliberately lenient: every field the client can
//! live without carries a default, unknown fields are ignored, and job
//! states stay strings until [`engine::JobStatus::from_wire`] classifies
//! them. A backend that grows new fields or phases must never break an
//! already-deployed client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use engine::markers::ClipSegment;
use engine::session::{Listing, QueueItem, RenameOutcome, ResultRow};
use engine::JobStatus;

/// Sentinel query that matches files carrying no tags at all.
pub const NO_TAGS_QUERY: &str = "__no_tags__";

/// Tag mutation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagAction {
    Add,
    Remove,
}

/// Multi-tag search combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

// --- listing --------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub current_path: String,
    #[serde(default)]
    pub parent_path: Option<String>,
    #[serde(default)]
    pub folders: Vec<ResultRow>,
    #[serde(default)]
    pub videos: Vec<ResultRow>,
}

impl From<ListResponse> for Listing {
    fn from(value: ListResponse) -> Self {
        Listing {
            current_path: value.current_path,
            parent_path: value.parent_path,
            folders: value.folders,
            videos: value.videos,
        }
    }
}

// --- search ---------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TagSearchRequest<'a> {
    pub query: &'a str,
    pub mode: SearchMode,
    pub refresh: bool,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NameSearchRequest<'a> {
    pub query: &'a str,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<ResultRow>,
    #[serde(default)]
    pub count: u64,
}

// --- tag index ------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TagCount {
    pub tag: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagIndexResponse {
    #[serde(default)]
    pub tags: Vec<TagCount>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub building: bool,
    #[serde(default)]
    pub error: Option<String>,
}

// --- file mutations -------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TagEditRequest<'a> {
    pub relpath: &'a str,
    pub action: TagAction,
    pub tag: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagEditResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub changed: bool,
    #[serde(default)]
    pub relpath: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TagEditResponse {
    pub fn rename_outcome(&self) -> RenameOutcome {
        RenameOutcome {
            changed: self.changed,
            relpath: self.relpath.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameRequest<'a> {
    pub relpath: &'a str,
    pub new_name: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenameResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub changed: bool,
    #[serde(default)]
    pub relpath: String,
    #[serde(default)]
    pub name: String,
}

impl RenameResponse {
    pub fn rename_outcome(&self) -> RenameOutcome {
        RenameOutcome {
            changed: self.changed,
            relpath: self.relpath.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteRequest<'a> {
    pub relpath: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OkResponse {
    #[serde(default)]
    pub ok: bool,
}

// --- clips ----------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ClipsCreateRequest<'a> {
    pub relpath: &'a str,
    pub segments: &'a [ClipSegment],
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedClip {
    pub relpath: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClipsCreateResponse {
    #[serde(default)]
    pub created: Vec<CreatedClip>,
}

// --- duplicate scan -------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DedupeScanRequest<'a> {
    pub dir_relpath: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DedupeDirsResponse {
    #[serde(default)]
    pub dirs: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanStarted {
    #[serde(default)]
    pub scan_id: String,
    #[serde(default)]
    pub root: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ScanCounters {
    #[serde(default)]
    pub dirs: u64,
    #[serde(default)]
    pub video_files: u64,
    #[serde(default)]
    pub candidate_files: u64,
    #[serde(default)]
    pub hashed_files: u64,
    #[serde(default)]
    pub duplicate_files: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DuplicateGroup {
    #[serde(default)]
    pub group_id: String,
    /// The file that survives when the group is moved away.
    #[serde(default)]
    pub keep: String,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub progress: ScanCounters,
    #[serde(default)]
    pub log_tail: Vec<String>,
    #[serde(default)]
    pub groups: Vec<DuplicateGroup>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ScanStatus {
    pub fn job_status(&self) -> JobStatus {
        JobStatus::from_wire(&self.status)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DedupeMoveRequest<'a> {
    pub scan_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<&'a str>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DedupeMoveResponse {
    #[serde(default)]
    pub moved: Vec<String>,
}

// --- merge ----------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MergeStartRequest<'a> {
    pub profile: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MergeStarted {
    #[serde(default)]
    pub job_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MergeStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub progress_pct: f64,
    #[serde(default)]
    pub download_ready: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl MergeStatus {
    pub fn job_status(&self) -> JobStatus {
        JobStatus::from_wire(&self.status)
    }
}

// --- queue ----------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueResponse {
    #[serde(default)]
    pub items: Vec<QueueItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueAddRequest<'a> {
    pub target_relpath: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueAddResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub item: Option<QueueItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueReorderRequest<'a> {
    pub ordered_ids: &'a [i64],
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use engine::JobStatus;

    use super::{
        DedupeDirsResponse, ListResponse, MergeStatus, QueueAddResponse, ScanStatus,
        TagIndexResponse,
    };

    #[test]
    fn scan_status_decodes_a_full_backend_payload() {
        let status: ScanStatus = serde_json::from_value(json!({
            "status": "running",
            "phase": "hashing",
            "message": "Hashe Kandidaten",
            "progress": {
                "dirs": 4, "video_files": 120, "candidate_files": 30,
                "hashed_files": 12, "duplicate_files": 3
            },
            "log_tail": ["hash a.mp4", "hash b.mp4"],
            "updated_at": "2026-08-23T10:15:00+00:00"
        }))
        .expect("scan status decodes");

        assert_eq!(status.job_status(), JobStatus::Running);
        assert_eq!(status.progress.hashed_files, 12);
        assert!(status.updated_at.is_some());
        assert!(status.groups.is_empty());
    }

    #[test]
    fn scan_status_tolerates_a_minimal_payload() {
        let status: ScanStatus = serde_json::from_value(json!({})).expect("empty decodes");
        assert_eq!(status.job_status(), JobStatus::Running);
        assert!(status.updated_at.is_none());
    }

    #[test]
    fn merge_status_keeps_unknown_states_non_terminal() {
        let status: MergeStatus =
            serde_json::from_value(json!({ "status": "concat", "progress_pct": 55.5 }))
                .expect("merge status decodes");

        assert_eq!(status.job_status(), JobStatus::Running);
        assert!(!status.download_ready);
    }

    #[test]
    fn listing_decodes_rows_with_extra_fields() {
        let listing: ListResponse = serde_json::from_value(json!({
            "current_path": "games",
            "parent_path": "",
            "folders": [{ "name": "sub", "relpath": "games/sub", "kind": "dir" }],
            "videos": [{ "name": "a.mp4", "relpath": "games/a.mp4", "size": 123 }]
        }))
        .expect("listing decodes");

        assert_eq!(listing.videos[0].relpath, "games/a.mp4");
        assert_eq!(listing.folders.len(), 1);
    }

    #[test]
    fn queue_add_response_without_item_decodes() {
        let response: QueueAddResponse =
            serde_json::from_value(json!({ "ok": true })).expect("decodes");
        assert!(response.item.is_none());
    }

    #[test]
    fn dedupe_dirs_decode_keeps_the_root_entry() {
        let response: DedupeDirsResponse =
            serde_json::from_value(json!({ "dirs": ["", "games", "games/sub"] }))
                .expect("dirs decode");
        assert_eq!(response.dirs, vec!["", "games", "games/sub"]);
    }

    #[test]
    fn tag_index_reports_building_state() {
        let index: TagIndexResponse =
            serde_json::from_value(json!({ "building": true, "tags": [] })).expect("decodes");
        assert!(index.building);
    }
}
