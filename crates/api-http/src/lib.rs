//! HTTP boundary to the collaborator backend: typed client, job poll
//! supervision and session reconciliation flows.

pub mod client;
pub mod error;
pub mod merge;
pub mod protocol;
pub mod queue;
pub mod reconcile;
pub mod scan;
pub mod supervisor;

pub use client::{ApiClient, SEARCH_LIMIT};
pub use error::{ApiError, Result};
pub use merge::{MergeOutcome, MergeProgress, run_merge};
pub use protocol::{NO_TAGS_QUERY, SearchMode, TagAction};
pub use reconcile::{BulkReport, Collaborator, Reconciler};
pub use scan::{ScanOutcome, ScanProgress, run_dedupe_scan};
pub use supervisor::{PollVerdict, supervise};
