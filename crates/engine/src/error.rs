use std::fmt::{Display, Formatter};

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by session transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A marker or clip operation requires an open source video.
    NoSourceVideo,
    /// A playback or mutation target was addressed by an empty path.
    EmptyRelpath,
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSourceVideo => write!(f, "no source video is open"),
            Self::EmptyRelpath => write!(f, "relative path is empty"),
        }
    }
}

impl std::error::Error for EngineError {}
