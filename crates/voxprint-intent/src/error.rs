//! Intent engine error types.
//!
//! Errors never reach the user: the dispatcher turns every failure into an
//! [`AIResponse`](crate::dispatcher::AIResponse) with a feedback class.
//! [`IntentError`] exists for construction-time failures (pattern
//! compilation) and for the internal seams where a helper needs to say why
//! it could not produce a value.

use crate::command::CommandAction;
use crate::context::WorkflowMode;

/// Unified error type for the intent engine.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    // -- Settings -----------------------------------------------------------
    /// A setting value was recognized but is outside the legal set.
    #[error("invalid value `{value}` for {field}")]
    InvalidSettingValue { field: &'static str, value: String },

    /// A command was missing a parameter it needs.
    #[error("{action:?} is missing parameter `{param}`")]
    MissingParameter {
        action: CommandAction,
        param: &'static str,
    },

    /// The setting does not exist for the current workflow.
    #[error("{action:?} is not a setting in {mode:?} mode")]
    UnsupportedSetting {
        action: CommandAction,
        mode: WorkflowMode,
    },

    // -- Context ------------------------------------------------------------
    /// A persisted context could not be decoded.
    #[error("context decode error: {0}")]
    ContextDecode(#[from] serde_json::Error),

    // -- Upstream crate errors ----------------------------------------------
    /// An error propagated from the kernel crate.
    #[error("kernel error: {0}")]
    Kernel(#[from] voxprint_kernel::KernelError),

    /// A grammar pattern failed to compile.
    #[error("invalid selection pattern: {0}")]
    Pattern(#[from] regex::Error),

    // -- Generic ------------------------------------------------------------
    /// Catch-all for unexpected internal errors.
    #[error("internal intent error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the intent crate.
pub type Result<T> = std::result::Result<T, IntentError>;
