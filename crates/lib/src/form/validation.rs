//! Validation orchestration.
//!
//! When an event matching the configured [`ValidationTrigger`] reaches the
//! root, the form snapshots its composite and runs the [`Validate`]
//! collaborator on a spawned tokio task. The returned list is applied with
//! [`Node::handle_validation`]; a failure goes to the validate-rejection hook
//! and leaves the tree's errors untouched.
//!
//! Dispatches are neither debounced nor cancelled. Several passes may be in
//! flight at once and their results are applied in completion order, so a
//! slow early pass can overwrite the errors of a faster later one.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use super::{Form, FormError, RejectionHook, ValidationTrigger};
use crate::{Error, FieldError, Node, Result, Value};

/// Asynchronous validation collaborator.
///
/// Receives a snapshot of the root composite and returns every error found,
/// addressed by path. Returning `Err` is a rejection: the tree is left as is.
///
/// Async closures taking a [`Value`] implement this trait.
#[async_trait]
pub trait Validate: Send + Sync {
    /// Validates a snapshot of the form value.
    async fn validate(&self, value: Value) -> Result<Vec<FieldError>>;
}

#[async_trait]
impl<F, Fut> Validate for F
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<FieldError>>> + Send + 'static,
{
    async fn validate(&self, value: Value) -> Result<Vec<FieldError>> {
        (self)(value).await
    }
}

/// Hands `err` to `hook`, or logs it when no hook is configured.
pub(super) fn reject(hook: &Option<RejectionHook>, err: Error, collaborator: &str) {
    warn!(collaborator, error = %err, "form collaborator rejected");
    if let Some(hook) = hook {
        hook(err);
    }
}

impl Form {
    /// Runs one validation pass on the current value and applies the result.
    ///
    /// Unlike automatic dispatches, a failure is returned to the caller and
    /// the rejection hook is not called.
    pub async fn validate(&self) -> Result<Vec<FieldError>> {
        let validator = self
            .validator
            .clone()
            .ok_or(FormError::MissingValidator)?;
        let snapshot = self.get_value();
        let errors = validator.validate(snapshot).await?;
        self.handle_validation(&errors);
        Ok(errors)
    }

    /// The trigger this form validates on, if any.
    pub fn validation_trigger(&self) -> Option<ValidationTrigger> {
        self.settings.validation_trigger
    }

    /// Dispatches a validation pass when `trigger` matches the configuration.
    pub(super) fn trigger(&self, trigger: ValidationTrigger) {
        if self.settings.validation_trigger != Some(trigger) {
            return;
        }
        let Some(validator) = self.validator.clone() else {
            return;
        };
        let snapshot = self.get_value();
        self.dispatch_validation(trigger, validator, snapshot);
    }

    fn dispatch_validation(
        &self,
        trigger: ValidationTrigger,
        validator: Arc<dyn Validate>,
        snapshot: Value,
    ) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(%trigger, "no tokio runtime available, skipping validation");
            reject(
                &self.validate_rejection,
                FormError::TaskFailed {
                    reason: "no tokio runtime available".to_string(),
                }
                .into(),
                "validate",
            );
            return;
        };

        debug!(%trigger, "dispatching validation");
        let form = self.this.clone();
        let hook = self.validate_rejection.clone();
        handle.spawn(async move {
            match validator.validate(snapshot).await {
                Ok(errors) => match form.upgrade() {
                    Some(form) => {
                        trace!(%trigger, errors = errors.len(), "validation resolved");
                        form.handle_validation(&errors);
                    }
                    None => trace!(%trigger, "form dropped before validation resolved"),
                },
                Err(err) => reject(&hook, err, "validate"),
            }
        });
    }
}
