//! Transport-agnostic core for the video library curation client.

pub mod error;
pub mod jobs;
pub mod markers;
pub mod queue;
pub mod selection;
pub mod session;
pub mod tags;

pub use error::{EngineError, Result};
pub use jobs::{JobStatus, JobTracker, PollConfig, STALE_AFTER};
pub use markers::{ClipSegment, MARKER_EPSILON, segments_from_markers};
pub use selection::{SelectionModel, ViewKind};
pub use session::{
    DeleteEffects, Listing, MediaKind, QueueItem, RenameEffects, RenameOutcome, ResultRow,
    ResultsKind, Session, VideoRef,
};
pub use tags::extract_tags;
