//! Form configuration and construction.
//!
//! [`FormSettings`] holds the serializable knobs of a form (when validation
//! runs, whether submission re-validates) and can be loaded from JSON.
//! [`FormBuilder`] wires the settings together with the collaborators that
//! cannot be serialized: composer, equality, subscriber, validator,
//! submitter and rejection hooks.

use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex, Weak},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Form, RejectionHook, submit::Submit, validation::Validate};
use crate::{
    Composer, Error, FieldError, RecordComposer, Result, Value,
    group::Branch,
    node::{EqualFn, NodeEvent, Subscriber, default_equal_fn},
    path,
};

/// Event class that makes the form run its validator.
///
/// - [`Value`](ValidationTrigger::Value): any value change reaching the root
/// - [`Focus`](ValidationTrigger::Focus): any node gaining focus
/// - [`Blur`](ValidationTrigger::Blur): any node losing focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationTrigger {
    /// Validate after every value mutation anywhere in the tree
    Value,
    /// Validate whenever a node is focused
    Focus,
    /// Validate whenever a node is blurred
    Blur,
}

impl fmt::Display for ValidationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationTrigger::Value => write!(f, "value"),
            ValidationTrigger::Focus => write!(f, "focus"),
            ValidationTrigger::Blur => write!(f, "blur"),
        }
    }
}

/// Serializable form configuration.
///
/// ```
/// # use formtree::{FormSettings, ValidationTrigger};
/// let settings = FormSettings::from_json(r#"{"validation_trigger": "blur"}"#).unwrap();
/// assert_eq!(settings.validation_trigger, Some(ValidationTrigger::Blur));
/// assert!(!settings.validate_on_submit);
///
/// let disabled = FormSettings::from_json(r#"{"validation_trigger": null}"#).unwrap();
/// assert_eq!(disabled.validation_trigger, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    /// When the validator runs. `None` disables automatic validation.
    pub validation_trigger: Option<ValidationTrigger>,
    /// Run the validator on the submitted value before the error check.
    pub validate_on_submit: bool,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            validation_trigger: Some(ValidationTrigger::Value),
            validate_on_submit: false,
        }
    }
}

impl FormSettings {
    /// Parses settings from a JSON document. Missing fields take their
    /// default values.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Serializes the settings to a JSON document.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::from)
    }
}

/// Builder for [`Form`].
///
/// ```
/// # use formtree::{Form, FieldError, Node, ValidationTrigger, Value};
/// fn require_name(value: &Value) -> formtree::Result<Vec<FieldError>> {
///     let mut errors = Vec::new();
///     if value.pointer("name").is_none() {
///         errors.push(FieldError::new("name", "required"));
///     }
///     Ok(errors)
/// }
///
/// let form = Form::builder()
///     .validation_trigger(Some(ValidationTrigger::Blur))
///     .validate(|value| async move { require_name(&value) })
///     .build();
///
/// assert_eq!(form.path(), ".");
/// ```
pub struct FormBuilder {
    composer: Arc<dyn Composer>,
    initial: Option<Value>,
    equal_fn: Option<EqualFn>,
    subscriber: Option<Subscriber>,
    settings: FormSettings,
    validator: Option<Arc<dyn Validate>>,
    submitter: Option<Arc<dyn Submit>>,
    validate_rejection: Option<RejectionHook>,
    submit_rejection: Option<RejectionHook>,
}

impl FormBuilder {
    /// Create a builder for a record form with default settings.
    pub fn new() -> Self {
        Self {
            composer: Arc::new(RecordComposer),
            initial: None,
            equal_fn: None,
            subscriber: None,
            settings: FormSettings::default(),
            validator: None,
            submitter: None,
            validate_rejection: None,
            submit_rejection: None,
        }
    }

    /// Set the composer of the root composite. Defaults to [`RecordComposer`].
    pub fn composer(mut self, composer: impl Composer + 'static) -> Self {
        self.composer = Arc::new(composer);
        self
    }

    /// Set the initial composite. Defaults to the composer's default.
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }

    /// Set the equality used by [`Node::is_dirty`](crate::Node::is_dirty).
    pub fn equal_fn<F>(mut self, equal_fn: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.equal_fn = Some(Arc::new(equal_fn));
        self
    }

    /// Set the subscriber receiving the root's events.
    pub fn subscriber<F>(mut self, subscriber: F) -> Self
    where
        F: Fn(&NodeEvent) + Send + Sync + 'static,
    {
        self.subscriber = Some(Arc::new(subscriber));
        self
    }

    /// Replace all settings at once.
    pub fn settings(mut self, settings: FormSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the validation trigger. `None` disables automatic validation.
    pub fn validation_trigger(mut self, trigger: Option<ValidationTrigger>) -> Self {
        self.settings.validation_trigger = trigger;
        self
    }

    /// Run the validator on submission before checking the tree's errors.
    pub fn validate_on_submit(mut self, enabled: bool) -> Self {
        self.settings.validate_on_submit = enabled;
        self
    }

    /// Set the validator from an async closure.
    pub fn validate<F, Fut>(self, validate: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<FieldError>>> + Send + 'static,
    {
        self.validator(validate)
    }

    /// Set the validator.
    pub fn validator(mut self, validator: impl Validate + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Set the submitter from an async closure.
    pub fn submit<F, Fut>(self, submit: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<FieldError>>> + Send + 'static,
    {
        self.submitter(submit)
    }

    /// Set the submitter.
    pub fn submitter(mut self, submitter: impl Submit + 'static) -> Self {
        self.submitter = Some(Arc::new(submitter));
        self
    }

    /// Set the hook receiving validator failures.
    pub fn validate_rejection<F>(mut self, hook: F) -> Self
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        self.validate_rejection = Some(Arc::new(hook));
        self
    }

    /// Set the hook receiving submitter failures.
    pub fn submit_rejection<F>(mut self, hook: F) -> Self
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        self.submit_rejection = Some(Arc::new(hook));
        self
    }

    /// Build the form.
    pub fn build(self) -> Arc<Form> {
        let initial = self.initial.unwrap_or_else(|| self.composer.default());
        debug!(
            trigger = ?self.settings.validation_trigger,
            validate_on_submit = self.settings.validate_on_submit,
            validator = self.validator.is_some(),
            submitter = self.submitter.is_some(),
            "building form"
        );
        Arc::new_cyclic(|this: &Weak<Form>| Form {
            this: this.clone(),
            value: Mutex::new(initial.clone()),
            initial,
            equal_fn: self.equal_fn.unwrap_or_else(default_equal_fn),
            branch: Branch::new(path::ROOT_PATH.to_string(), self.composer, self.subscriber),
            settings: self.settings,
            validator: self.validator,
            submitter: self.submitter,
            validate_rejection: self.validate_rejection,
            submit_rejection: self.submit_rejection,
        })
    }
}

impl Default for FormBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormBuilder")
            .field("composer", &self.composer)
            .field("initial", &self.initial)
            .field("settings", &self.settings)
            .field("validator", &self.validator.is_some())
            .field("submitter", &self.submitter.is_some())
            .finish_non_exhaustive()
    }
}
