// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

/// Failure of an external fetch/render call. An empty page is NOT an error;
/// these variants are the hard failures that the retry policy applies to.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out after {0}s waiting for markers")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("no elements matching `{0}` appeared on the page")]
    MarkersMissing(String),

    #[error("rendering session unavailable: {0}")]
    Session(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Transport(format!("request timeout: {e}"))
        } else if let Some(status) = e.status() {
            FetchError::Status {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("reading snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("encoding snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("writing snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
