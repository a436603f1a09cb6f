use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Error type for the collaborator HTTP boundary and the job workflows
/// built on it.
#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a usable HTTP response.
    Transport(reqwest::Error),
    /// Non-2xx response; `message` is the backend's `error` field when the
    /// body carried one, otherwise `HTTP <status>`.
    Status { status: u16, message: String },
    /// The queue already contains this target file.
    AlreadyQueued,
    /// 2xx response whose body did not decode into the expected shape.
    Decode {
        context: &'static str,
        source: serde_json::Error,
    },
    /// A job start call answered 2xx but returned no job id.
    MissingJobId { workflow: &'static str },
    /// The backend reported the job as failed.
    JobFailed {
        workflow: &'static str,
        message: String,
    },
    /// The job outlived its poll ceiling.
    Timeout {
        workflow: &'static str,
        elapsed: Duration,
    },
    /// The caller cancelled the workflow.
    Cancelled { workflow: &'static str },
    /// The backend answered 2xx but refused the mutation.
    MutationRejected { operation: &'static str },
    Engine(engine::EngineError),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::Status { status, message } => write!(f, "backend error ({status}): {message}"),
            Self::AlreadyQueued => write!(f, "this video is already in the queue"),
            Self::Decode { context, source } => {
                write!(f, "response decode failed ({context}): {source}")
            }
            Self::MissingJobId { workflow } => {
                write!(f, "{workflow} job started without a job id")
            }
            Self::JobFailed { workflow, message } => write!(f, "{workflow} failed: {message}"),
            Self::Timeout { workflow, elapsed } => {
                write!(f, "{workflow} timed out after {}s", elapsed.as_secs())
            }
            Self::Cancelled { workflow } => write!(f, "{workflow} was cancelled"),
            Self::MutationRejected { operation } => write!(f, "{operation} was rejected"),
            Self::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Decode { source, .. } => Some(source),
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

impl From<engine::EngineError> for ApiError {
    fn from(value: engine::EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ApiError;

    #[test]
    fn status_errors_carry_the_backend_message() {
        let error = ApiError::Status {
            status: 404,
            message: String::from("Datei nicht gefunden."),
        };
        assert_eq!(error.to_string(), "backend error (404): Datei nicht gefunden.");
    }

    #[test]
    fn timeout_reports_the_workflow_and_elapsed_seconds() {
        let error = ApiError::Timeout {
            workflow: "merge",
            elapsed: Duration::from_secs(3600),
        };
        assert_eq!(error.to_string(), "merge timed out after 3600s");
    }

    #[test]
    fn already_queued_is_a_domain_message_not_an_http_code() {
        assert_eq!(
            ApiError::AlreadyQueued.to_string(),
            "this video is already in the queue"
        );
    }
}
