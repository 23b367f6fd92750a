//! The root of a form tree.
//!
//! A [`Form`] is the group node with no parent. It stores the composite
//! value every other node reads from, and owns the cross-cutting
//! collaborators: the validator and its trigger, the submitter and the
//! rejection hooks. Value changes, focus and blur anywhere in the tree end
//! up at the form, which decides whether to run validation.

use std::{
    fmt,
    sync::{Arc, Mutex, Weak},
};

use tracing::trace;

use crate::{
    Error, FieldError, Value,
    group::Branch,
    node::{EqualFn, ErrorScope, FieldKey, GroupNode, Node, NodeRef, Notification, lock},
};

pub mod errors;
pub mod settings;
pub mod submit;
pub mod validation;

pub use errors::FormError;
pub use settings::{FormBuilder, FormSettings, ValidationTrigger};
pub use submit::{Submit, SubmitState};
pub use validation::Validate;

/// Hook receiving collaborator failures.
pub type RejectionHook = Arc<dyn Fn(Error) + Send + Sync>;

/// Root node of a form tree.
///
/// ```
/// # use formtree::{Field, FieldGroup, Form, Node, RecordComposer, Value};
/// # use serde_json::json;
/// let form = Form::builder().build();
/// let name = Field::new(&form, "name");
/// let address = FieldGroup::new(&form, "address", RecordComposer);
/// let street = Field::new(&address, "street");
///
/// name.set_value("Carl".into());
/// street.set_value("Main St".into());
///
/// assert_eq!(
///     form.get_value(),
///     Value::from(json!({"name": "Carl", "address": {"street": "Main St"}}))
/// );
/// ```
pub struct Form {
    this: Weak<Form>,
    value: Mutex<Value>,
    initial: Value,
    equal_fn: EqualFn,
    branch: Branch,
    settings: FormSettings,
    validator: Option<Arc<dyn Validate>>,
    submitter: Option<Arc<dyn Submit>>,
    validate_rejection: Option<RejectionHook>,
    submit_rejection: Option<RejectionHook>,
}

impl Form {
    /// Starts building a form.
    pub fn builder() -> FormBuilder {
        FormBuilder::new()
    }

    /// The settings this form was built with.
    pub fn settings(&self) -> &FormSettings {
        &self.settings
    }

    /// Applies `edit` to the composite. Returns the new composite, or `None`
    /// when it is null.
    fn edit_composite(&self, edit: impl FnOnce(&mut Value)) -> Option<Value> {
        let mut value = lock(&self.value);
        if value.is_null() {
            return None;
        }
        edit(&mut *value);
        Some(value.clone())
    }

    /// A value change reached the root.
    fn value_changed(&self, value: Value) {
        self.branch.emit_value(value);
        self.trigger(ValidationTrigger::Value);
    }
}

impl Node for Form {
    fn path(&self) -> String {
        self.branch.path().to_string()
    }

    fn get_value(&self) -> Value {
        lock(&self.value).clone()
    }

    fn get_initial_value(&self) -> Value {
        self.initial.clone()
    }

    fn set_value(&self, value: Value) {
        trace!(%value, "form value set");
        self.branch.mark_modified();
        *lock(&self.value) = value.clone();
        self.branch.broadcast(&value);
        self.value_changed(value);
    }

    fn get_errors(&self, scope: ErrorScope) -> Vec<FieldError> {
        self.branch.get_errors(scope)
    }

    fn set_errors(&self, errors: Vec<FieldError>) {
        self.branch.set_errors(errors);
    }

    fn append_errors(&self, errors: &[FieldError]) {
        self.branch.append_errors(errors);
    }

    fn clear_errors(&self, scope: ErrorScope) {
        self.branch.clear_errors(scope);
    }

    fn handle_validation(&self, errors: &[FieldError]) {
        self.branch.handle_validation(errors);
    }

    fn is_dirty(&self) -> bool {
        !(self.equal_fn)(&self.initial, &self.get_value())
    }

    fn is_touched(&self) -> bool {
        self.branch.is_touched()
    }

    fn is_active(&self) -> bool {
        self.branch.is_active()
    }

    fn is_modified(&self) -> bool {
        self.branch.is_modified()
    }

    fn handle_focus(&self) {
        self.branch.focus();
        self.trigger(ValidationTrigger::Focus);
    }

    fn handle_blur(&self) {
        self.branch.blur();
        self.trigger(ValidationTrigger::Blur);
    }

    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Child => {
                self.branch.mark_modified();
                self.value_changed(self.get_value());
            }
            Notification::Parent { .. } => {
                trace!("form ignored parent notification");
            }
        }
    }

    fn dispose(&self) {
        self.branch.dispose_children();
    }
}

impl GroupNode for Form {
    fn attach_node(&self, key: FieldKey, node: NodeRef) -> String {
        let initial = node.get_initial_value();
        let path = self.branch.register(key.clone(), node);

        let composer = self.branch.composer();
        let Some(value) = self.edit_composite(|value| composer.patch(value, &key, initial)) else {
            trace!(%key, "attached into null form value");
            return path;
        };
        self.branch.mark_modified();
        self.value_changed(value);
        path
    }

    fn detach_node(&self, key: &FieldKey) -> bool {
        let removed = self.branch.unregister(key);

        let composer = self.branch.composer();
        if let Some(value) = self.edit_composite(|value| composer.delete(value, key)) {
            self.branch.mark_modified();
            self.value_changed(value);
        }
        removed
    }

    fn get_node(&self, key: &FieldKey) -> Option<NodeRef> {
        self.branch.get_node(key)
    }

    fn list_nodes(&self) -> Vec<(FieldKey, NodeRef)> {
        self.branch.list_nodes()
    }

    fn extract_value(&self, key: &FieldKey) -> Option<Value> {
        let value = lock(&self.value);
        if value.is_null() {
            return None;
        }
        self.branch.composer().extract(&value, key)
    }

    fn patch_value(&self, key: &FieldKey, value: Value) -> Option<Value> {
        let composer = self.branch.composer();
        let patched = self.edit_composite(|composite| composer.patch(composite, key, value))?;
        self.branch.mark_modified();
        Some(patched)
    }

    fn write_value(&self, key: &FieldKey, value: Value) -> Option<Value> {
        let composer = self.branch.composer();
        self.edit_composite(|composite| composer.patch(composite, key, value))
    }

    fn handle_focus_within(&self) {
        self.branch.touch();
        self.trigger(ValidationTrigger::Focus);
    }

    fn handle_blur_within(&self) {
        self.branch.touch();
        self.trigger(ValidationTrigger::Blur);
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("value", &*lock(&self.value))
            .field("initial", &self.initial)
            .field("settings", &self.settings)
            .field("branch", &self.branch)
            .field("validator", &self.validator.is_some())
            .field("submitter", &self.submitter.is_some())
            .finish_non_exhaustive()
    }
}
