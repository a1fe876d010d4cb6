use std::fmt;

use report_core::{ChangeEvent, Report, SubscriptionId, UploadId, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    UploadFinished {
        upload_id: UploadId,
        result: Result<Report, SubmitError>,
    },
    SnapshotLoaded {
        subscription: SubscriptionId,
        result: Result<Vec<Report>, FetchError>,
    },
    Change {
        subscription: SubscriptionId,
        event: ChangeEvent,
    },
    /// The feed ended or failed on its own. Never sent after a close request.
    FeedClosed {
        subscription: SubscriptionId,
        reason: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: FailureKind,
    pub message: String,
}

impl RemoteError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    /// A single payload exceeded the accepted size.
    Oversized,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response"),
            FailureKind::Oversized => write!(f, "payload too large"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Storage,
    Insert,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStage::Storage => write!(f, "storage upload"),
            UploadStage::Insert => write!(f, "report insert"),
        }
    }
}

/// A storage or insert call failed. A stored object is not removed when the
/// insert afterwards fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} failed: {source}")]
pub struct UploadError {
    pub stage: UploadStage,
    #[source]
    pub source: RemoteError,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("report list read failed: {0}")]
pub struct FetchError(#[from] pub RemoteError);

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to build engine runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to spawn engine thread: {0}")]
    Thread(#[source] std::io::Error),
}
