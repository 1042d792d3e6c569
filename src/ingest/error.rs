//! Classified failures for the sync path.
//!
//! Per-record problems (malformed battles, duplicate identity keys) are
//! absorbed inside the coordinator and never show up here; only batch-level
//! aborts do.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// The caller-supplied player tag is not a valid tag, or the upstream API
    /// does not know it.
    #[error("invalid player tag: {0:?}")]
    InvalidTag(String),

    /// Missing credential, or the upstream rejected it.
    #[error("battle log credential missing or rejected by upstream")]
    UpstreamAuth,

    /// Upstream rate limit or IP block; retryable later.
    #[error("battle log API rate limited or forbidden")]
    UpstreamRateLimited,

    /// Transient network failure or timeout reaching the upstream API.
    #[error("battle log API unreachable: {0}")]
    UpstreamUnavailable(String),

    /// The upstream responded, but not with the shape we can ingest.
    #[error("unexpected battle log response shape: {0}")]
    UpstreamShape(String),

    /// Storage-level failure; already-committed matches remain valid and a
    /// retried sync will simply skip them.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl SyncError {
    /// Whether the caller can expect a later retry to succeed without any
    /// change on their side.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::UpstreamRateLimited | SyncError::UpstreamUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability_follows_the_taxonomy() {
        assert!(SyncError::UpstreamRateLimited.is_retryable());
        assert!(SyncError::UpstreamUnavailable("timeout".into()).is_retryable());
        assert!(!SyncError::UpstreamAuth.is_retryable());
        assert!(!SyncError::InvalidTag("x".into()).is_retryable());
        assert!(!SyncError::Storage("down".into()).is_retryable());
    }
}
