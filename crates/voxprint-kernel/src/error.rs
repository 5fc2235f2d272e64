//! Kernel error types.
//!
//! Building a [`KeywordRouter`](crate::router::KeywordRouter) is the only
//! fallible operation in this crate.  Routing itself never fails: an
//! unmatched utterance is simply `None`.

/// Unified error type for the voxprint kernel.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// Building the internal automaton failed.
    #[error("router build error: {reason}")]
    RouterBuildError { reason: String },

    /// A regex pattern supplied to the router is invalid.
    #[error("invalid regex pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A keyword group was registered without any keywords.
    #[error("keyword group `{group}` has no keywords")]
    EmptyKeywordGroup { group: String },

    /// Catch-all for unexpected internal errors.
    #[error("internal kernel error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the kernel crate.
pub type Result<T> = std::result::Result<T, KernelError>;
