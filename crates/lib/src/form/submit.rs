//! Submission.
//!
//! Submitting reads the root composite as of the call, checks the errors
//! currently distributed in the tree and only then hands the value to the
//! [`Submit`] collaborator. Errors returned by the collaborator are routed
//! through the tree exactly like a validation result.

use std::{fmt, future::Future};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Form, FormError, validation::reject};
use crate::{ErrorScope, FieldError, Node, Result, Value};

/// Asynchronous submission collaborator.
///
/// Returns the errors the receiving side found, addressed by path; an empty
/// list means the submission was accepted. Returning `Err` is a rejection.
///
/// Async closures taking a [`Value`] implement this trait.
#[async_trait]
pub trait Submit: Send + Sync {
    /// Submits a snapshot of the form value.
    async fn submit(&self, value: Value) -> Result<Vec<FieldError>>;
}

#[async_trait]
impl<F, Fut> Submit for F
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<FieldError>>> + Send + 'static,
{
    async fn submit(&self, value: Value) -> Result<Vec<FieldError>> {
        (self)(value).await
    }
}

/// Terminal status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitState {
    /// The value was submitted and accepted
    Success,
    /// The tree held errors, or a collaborator rejected; nothing was accepted
    ValidationError,
    /// The submitter returned errors, now distributed in the tree
    SubmitError,
}

impl SubmitState {
    /// Returns true for [`SubmitState::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitState::Success)
    }
}

impl fmt::Display for SubmitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitState::Success => write!(f, "success"),
            SubmitState::ValidationError => write!(f, "validation_error"),
            SubmitState::SubmitError => write!(f, "submit_error"),
        }
    }
}

impl Form {
    /// Submits the current value and resolves to the outcome.
    ///
    /// 1. the root composite is read as of the call;
    /// 2. with `validate_on_submit`, the validator runs on that value first;
    /// 3. any error in the tree resolves [`SubmitState::ValidationError`]
    ///    without calling the submitter;
    /// 4. a submitter rejection goes to the submit-rejection hook and
    ///    resolves [`SubmitState::ValidationError`];
    /// 5. returned errors are distributed and resolve
    ///    [`SubmitState::SubmitError`].
    pub fn submit_async(&self) -> impl Future<Output = SubmitState> + Send + '_ {
        let snapshot = self.get_value();
        self.run_submission(snapshot)
    }

    /// Submits the current value in the background, discarding the outcome.
    ///
    /// Only side effects are observable: errors landing on nodes and
    /// whatever the submitter does.
    pub fn submit(&self) {
        let Some(form) = self.this.upgrade() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no tokio runtime available, skipping submission");
            reject(
                &self.submit_rejection,
                FormError::TaskFailed {
                    reason: "no tokio runtime available".to_string(),
                }
                .into(),
                "submit",
            );
            return;
        };
        let snapshot = self.get_value();
        handle.spawn(async move {
            form.run_submission(snapshot).await;
        });
    }

    async fn run_submission(&self, snapshot: Value) -> SubmitState {
        let state = self.submission_pipeline(snapshot).await;
        debug!(%state, "submission finished");
        state
    }

    async fn submission_pipeline(&self, snapshot: Value) -> SubmitState {
        if self.settings.validate_on_submit
            && let Some(validator) = self.validator.clone()
        {
            match validator.validate(snapshot.clone()).await {
                Ok(errors) => self.handle_validation(&errors),
                Err(err) => {
                    reject(&self.validate_rejection, err, "validate");
                    return SubmitState::ValidationError;
                }
            }
        }

        let errors = self.get_errors(ErrorScope::Group);
        if !errors.is_empty() {
            debug!(errors = errors.len(), "tree holds errors, submission blocked");
            return SubmitState::ValidationError;
        }

        let Some(submitter) = self.submitter.clone() else {
            return SubmitState::Success;
        };
        match submitter.submit(snapshot).await {
            Ok(errors) if errors.is_empty() => SubmitState::Success,
            Ok(errors) => {
                self.handle_validation(&errors);
                SubmitState::SubmitError
            }
            Err(err) => {
                reject(&self.submit_rejection, err, "submit");
                SubmitState::ValidationError
            }
        }
    }
}
