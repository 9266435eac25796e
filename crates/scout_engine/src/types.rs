use std::fmt;
use std::io;

use scout_core::Record;

/// Transport-level reason a page or API request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl FetchFailure {
    /// Failures that will not change on a second attempt.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            FetchFailure::InvalidUrl
                | FetchFailure::HttpStatus(404 | 410)
                | FetchFailure::TooLarge { .. }
                | FetchFailure::UnsupportedContentType { .. }
        )
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::InvalidUrl => write!(f, "invalid url"),
            FetchFailure::HttpStatus(code) => write!(f, "http status {code}"),
            FetchFailure::Timeout => write!(f, "timeout"),
            FetchFailure::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FetchFailure::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FetchFailure::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FetchFailure::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{failure}: {message}")]
pub struct FetchError {
    pub failure: FetchFailure,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(failure: FetchFailure, message: impl Into<String>) -> Self {
        Self {
            failure,
            message: message.into(),
        }
    }
}

/// Whether a failed extraction is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transient,
    Permanent,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transient => write!(f, "transient"),
            FailureKind::Permanent => write!(f, "permanent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} extraction failure: {message}")]
pub struct ExtractError {
    pub kind: FailureKind,
    pub message: String,
}

impl ExtractError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

impl From<FetchError> for ExtractError {
    fn from(err: FetchError) -> Self {
        let kind = if err.failure.is_permanent() {
            FailureKind::Permanent
        } else {
            FailureKind::Transient
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("malformed search response: {0}")]
    Decode(String),
    #[error("search provider unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cannot encode column: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("store worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("cursor file io error: {0}")]
    Io(#[from] io::Error),
    #[error("cursor file is corrupt: {0}")]
    Corrupt(String),
    #[error("cursor could not be serialized: {0}")]
    Encode(String),
}

/// Returned by `put` once the queue has been closed; hands the record back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("record queue is closed")]
pub struct QueueClosed(pub Record);
