//! Error types for the page capability and the review ledger.
//!
//! Run-level plumbing (config loading, snapshot persistence) propagates
//! `Box<dyn Error>`; the types here exist where a caller branches on the kind
//! of failure.

use crate::review::ReviewStatus;
use thiserror::Error;

/// Failure to bring a page into a queryable state.
///
/// Every variant is fatal to the candidate being fetched, never to the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("navigation timed out after {0}s")]
    Timeout(u64),

    #[error("render API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("cannot move article from {from} to {to}")]
    InvalidTransition { from: ReviewStatus, to: ReviewStatus },

    #[error("no article with link {0} in this snapshot")]
    UnknownArticle(String),
}
