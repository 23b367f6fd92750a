//! Error types for form collaborators.
//!
//! Failures of the validate and submit collaborators are never turned into
//! tree errors. They travel as [`FormError`]s to the rejection hooks
//! configured on the [`Form`](crate::Form).

use std::fmt::Display;

use thiserror::Error;

/// Failures raised by the validation and submission collaborators.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FormError {
    /// A collaborator rejected the value it was given
    #[error("Collaborator rejected the form value: {reason}")]
    Rejected { reason: String },

    /// A spawned validation or submission task did not complete
    #[error("Form task failed: {reason}")]
    TaskFailed { reason: String },

    /// A validation pass was requested but no validator is configured
    #[error("No validator configured for this form")]
    MissingValidator,
}

impl FormError {
    /// Creates a [`FormError::Rejected`] from any displayable reason.
    pub fn rejected(reason: impl Display) -> Self {
        FormError::Rejected {
            reason: reason.to_string(),
        }
    }

    /// Check if this error is a collaborator rejection
    pub fn is_rejected(&self) -> bool {
        matches!(self, FormError::Rejected { .. })
    }

    /// Check if this error comes from a task that did not complete
    pub fn is_task_failure(&self) -> bool {
        matches!(self, FormError::TaskFailed { .. })
    }

    /// Check if this error indicates a missing collaborator
    pub fn is_missing_validator(&self) -> bool {
        matches!(self, FormError::MissingValidator)
    }
}

// Conversion from FormError to the main Error type
impl From<FormError> for crate::Error {
    fn from(err: FormError) -> Self {
        crate::Error::Form(err)
    }
}
