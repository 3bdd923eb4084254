//! Fatal conditions raised by the bootstrap stages
//!
//! Every failure is terminal for the calling script. Stages only return
//! these values; the top-level boundary decides how to print them and
//! terminates the process exactly once.

use thiserror::Error;

use crate::usage::format_usage;

/// Result alias used by every bootstrap stage
pub type Result<T> = std::result::Result<T, PreflightError>;

/// A fatal condition, tagged by how it is reported
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreflightError {
    /// The invocation had the wrong shape (missing flag, missing argument).
    /// Reported with usage text and exit code 0.
    #[error("{}", message.as_deref().unwrap_or("usage"))]
    Usage { message: Option<String> },

    /// A filesystem mismatch or a policy violation.
    /// Reported with a single message and exit code 1.
    #[error("{0}")]
    Validation(String),
}

impl PreflightError {
    /// Usage error without a context message
    pub fn usage() -> Self {
        PreflightError::Usage { message: None }
    }

    /// Usage error prefixed by a context message
    pub fn usage_with(message: impl Into<String>) -> Self {
        PreflightError::Usage {
            message: Some(message.into()),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PreflightError::Validation(message.into())
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, PreflightError::Usage { .. })
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            PreflightError::Usage { .. } => 0,
            PreflightError::Validation(_) => 1,
        }
    }

    /// Short tag used in machine-readable output
    pub fn kind(&self) -> &'static str {
        match self {
            PreflightError::Usage { .. } => "usage",
            PreflightError::Validation(_) => "validation",
        }
    }

    /// Text shown to the user: usage text for usage errors, the bare
    /// message for validation errors
    pub fn render(&self, program: &str, usage_text: &str) -> String {
        match self {
            PreflightError::Usage { message } => {
                format_usage(program, usage_text, message.as_deref())
            }
            PreflightError::Validation(message) => message.clone(),
        }
    }
}
