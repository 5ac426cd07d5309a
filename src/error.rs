use thiserror::Error;

/// Failure classes for forum workflows. The class decides where the failure
/// surfaces (inline next to a form, as a toast, or silently degraded) and
/// whether any network side effect may already have happened.
#[derive(Debug, Error)]
pub enum ForumError {
    /// Bad input shape, size, or type. Recovered locally; no network call
    /// has been made.
    #[error("{0}")]
    Validation(String),

    /// A category name had no matching id. Submissions abort before any
    /// upload or write.
    #[error("unknown category: {0}")]
    Resolution(String),

    /// An attachment slot request exceeded the per-thread cap.
    #[error("only {remaining} more image(s) can be added (max {max} total)")]
    Capacity { remaining: usize, max: usize },

    /// An upload failed mid-submission. Earlier uploads from the same
    /// submission are not rolled back.
    #[error("upload failed: {0}")]
    Upload(String),

    /// The data service rejected a write, typically via its row-level
    /// authorization policy. Surfaced verbatim.
    #[error("{0}")]
    Write(String),

    /// Both the paginated listing procedure and the fallback query failed.
    #[error("failed to load threads: {0}")]
    Listing(String),
}

impl ForumError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ForumError::Validation(msg.into())
    }
}
