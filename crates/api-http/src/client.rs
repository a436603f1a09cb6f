//! HTTP client for the collaborator backend.

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use engine::markers::ClipSegment;
use engine::session::MediaKind;

use crate::error::{ApiError, Result};
use crate::protocol::{
    ClipsCreateRequest, ClipsCreateResponse, DedupeDirsResponse, DedupeMoveRequest,
    DedupeMoveResponse, DedupeScanRequest, DeleteRequest, ErrorBody, ListResponse,
    MergeStartRequest, MergeStarted, MergeStatus, NameSearchRequest, OkResponse, QueueAddRequest,
    QueueAddResponse, QueueReorderRequest, QueueResponse, RenameRequest, RenameResponse,
    ScanStarted, ScanStatus, SearchMode, SearchResponse, TagAction, TagEditRequest,
    TagEditResponse, TagIndexResponse, TagSearchRequest,
};

/// Result page size requested for tag and name searches.
pub const SEARCH_LIMIT: usize = 200;

/// Typed access to the backend API under one base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for `base_url`, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // --- endpoints --------------------------------------------------------

    pub async fn list(&self, path: &str) -> Result<ListResponse> {
        let url = format!(
            "{}/api/list?path={}",
            self.base_url,
            urlencoding::encode(path)
        );
        self.get(&url, "list").await
    }

    pub async fn search_tags(
        &self,
        query: &str,
        mode: SearchMode,
        refresh: bool,
    ) -> Result<SearchResponse> {
        let url = format!("{}/api/tags/search", self.base_url);
        let body = TagSearchRequest {
            query,
            mode,
            refresh,
            limit: SEARCH_LIMIT,
        };
        self.post(&url, &body, "tag search").await
    }

    pub async fn search_names(&self, query: &str) -> Result<SearchResponse> {
        let url = format!("{}/api/name/search", self.base_url);
        let body = NameSearchRequest {
            query,
            limit: SEARCH_LIMIT,
        };
        self.post(&url, &body, "name search").await
    }

    pub async fn tag_index(&self, refresh: bool) -> Result<TagIndexResponse> {
        let url = if refresh {
            format!("{}/api/tags/list?refresh=1", self.base_url)
        } else {
            format!("{}/api/tags/list", self.base_url)
        };
        self.get(&url, "tag index").await
    }

    pub async fn edit_tags(
        &self,
        relpath: &str,
        action: TagAction,
        tag: &str,
    ) -> Result<TagEditResponse> {
        let url = format!("{}/api/tags/edit", self.base_url);
        let body = TagEditRequest {
            relpath,
            action,
            tag,
        };
        self.post(&url, &body, "tag edit").await
    }

    pub async fn rename_file(&self, relpath: &str, new_name: &str) -> Result<RenameResponse> {
        let url = format!("{}/api/files/rename", self.base_url);
        let body = RenameRequest { relpath, new_name };
        self.post(&url, &body, "rename").await
    }

    pub async fn delete_file(&self, relpath: &str) -> Result<OkResponse> {
        let url = format!("{}/api/files/delete", self.base_url);
        let body = DeleteRequest { relpath };
        self.post(&url, &body, "delete").await
    }

    pub async fn create_clips(
        &self,
        relpath: &str,
        segments: &[ClipSegment],
    ) -> Result<ClipsCreateResponse> {
        let url = format!("{}/api/clips/create", self.base_url);
        let body = ClipsCreateRequest { relpath, segments };
        self.post(&url, &body, "clip creation").await
    }

    pub async fn dedupe_dirs(&self) -> Result<DedupeDirsResponse> {
        let url = format!("{}/api/dedupe/dirs", self.base_url);
        self.get(&url, "dedupe dirs").await
    }

    pub async fn start_dedupe_scan(&self, dir_relpath: &str) -> Result<ScanStarted> {
        let url = format!("{}/api/dedupe/scan", self.base_url);
        let body = DedupeScanRequest { dir_relpath };
        self.post(&url, &body, "dedupe scan start").await
    }

    pub async fn dedupe_scan_status(&self, scan_id: &str) -> Result<ScanStatus> {
        let url = format!(
            "{}/api/dedupe/scan/status/{}",
            self.base_url,
            urlencoding::encode(scan_id)
        );
        self.get(&url, "dedupe scan status").await
    }

    /// Moves found duplicates away; `group_id: None` moves every group.
    pub async fn dedupe_move(
        &self,
        scan_id: &str,
        group_id: Option<&str>,
    ) -> Result<DedupeMoveResponse> {
        let url = format!("{}/api/dedupe/move", self.base_url);
        let body = DedupeMoveRequest { scan_id, group_id };
        self.post(&url, &body, "dedupe move").await
    }

    pub async fn start_merge(&self, profile: &str) -> Result<MergeStarted> {
        let url = format!("{}/api/merge/start", self.base_url);
        let body = MergeStartRequest { profile };
        self.post(&url, &body, "merge start").await
    }

    pub async fn merge_status(&self, job_id: &str) -> Result<MergeStatus> {
        let url = format!(
            "{}/api/merge/status?job_id={}",
            self.base_url,
            urlencoding::encode(job_id)
        );
        self.get(&url, "merge status").await
    }

    pub async fn fetch_queue(&self) -> Result<QueueResponse> {
        let url = format!("{}/api/queue", self.base_url);
        self.get(&url, "queue").await
    }

    /// Adds a target file to the merge queue. The backend answers 409 when
    /// the file is already queued; that maps to [`ApiError::AlreadyQueued`].
    pub async fn queue_add(&self, target_relpath: &str) -> Result<QueueAddResponse> {
        let url = format!("{}/api/queue/add", self.base_url);
        let body = QueueAddRequest { target_relpath };
        match self.post(&url, &body, "queue add").await {
            Err(ApiError::Status { status: 409, .. }) => Err(ApiError::AlreadyQueued),
            other => other,
        }
    }

    pub async fn queue_reorder(&self, ordered_ids: &[i64]) -> Result<OkResponse> {
        let url = format!("{}/api/queue/reorder", self.base_url);
        let body = QueueReorderRequest { ordered_ids };
        self.post(&url, &body, "queue reorder").await
    }

    pub async fn queue_remove(&self, id: i64) -> Result<OkResponse> {
        let url = format!("{}/api/queue/item?id={}", self.base_url, id);
        let response = self.http.delete(&url).send().await?;
        Self::decode(response, "queue remove").await
    }

    pub async fn queue_clear(&self) -> Result<OkResponse> {
        let url = format!("{}/api/queue/clear", self.base_url);
        self.post(&url, &serde_json::json!({}), "queue clear").await
    }

    // --- URL builders -----------------------------------------------------

    /// Streaming URL for a video. Each path segment is percent-encoded on
    /// its own so the separating slashes survive.
    pub fn media_url(&self, kind: MediaKind, relpath: &str) -> String {
        let tree = match kind {
            MediaKind::Source => "source",
            MediaKind::Target => "target",
        };
        let encoded: Vec<String> = relpath
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/media/{}/{}", self.base_url, tree, encoded.join("/"))
    }

    /// Download URL for a finished merge job.
    pub fn merge_download_url(&self, job_id: &str) -> String {
        format!(
            "{}/api/merge/download/{}",
            self.base_url,
            urlencoding::encode(job_id)
        )
    }

    // --- plumbing ----------------------------------------------------------

    async fn get<T: DeserializeOwned>(&self, url: &str, context: &'static str) -> Result<T> {
        debug!(url, "GET");
        let response = self.http.get(url).send().await?;
        Self::decode(response, context).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
        context: &'static str,
    ) -> Result<T> {
        debug!(url, "POST");
        let response = self.http.post(url).json(body).send().await?;
        Self::decode(response, context).await
    }

    /// Maps non-2xx responses to [`ApiError::Status`], preferring the
    /// backend's `error` message over the bare status code.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &'static str,
    ) -> Result<T> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.error)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        if status == StatusCode::NO_CONTENT || body.is_empty() {
            return serde_json::from_slice(b"{}")
                .map_err(|source| ApiError::Decode { context, source });
        }
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode { context, source })
    }
}
