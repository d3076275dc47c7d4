//! Error taxonomy for a watch run.
//!
//! Storage and fetch failures abort the run for one content kind; notify
//! failures are recorded per channel and never abort anything.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reading or writing a persisted seen-set.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("state I/O failed for {}: {source}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("state file {} is not a valid identifier list: {source}", path.display())]
    Parse { path: PathBuf, #[source] source: serde_json::Error },

    #[error("could not encode state for {}: {source}", path.display())]
    Encode { path: PathBuf, #[source] source: serde_json::Error },

    #[error("could not replace state file {}: {source}", path.display())]
    Persist { path: PathBuf, #[source] source: std::io::Error },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Failure listing the catalog.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("catalog response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid catalog url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

/// Failure delivering one notification to one channel.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notify request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("channel rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("notifier is not configured")]
    Disabled,

    #[error("{0}")]
    Other(String),
}

/// Coarse class of a fatal run failure, as reported in a run outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Storage,
    Fetch,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self { ErrorKind::Storage => f.write_str("storage"), ErrorKind::Fetch => f.write_str("fetch") }
    }
}

/// Anything that aborts one kind's run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl RunError {
    pub fn kind(&self) -> ErrorKind {
        match self { RunError::Storage(_) => ErrorKind::Storage, RunError::Fetch(_) => ErrorKind::Fetch }
    }
}
