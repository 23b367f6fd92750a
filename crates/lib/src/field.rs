//! Leaf nodes.
//!
//! A [`Field`] holds one scalar (or opaque) value and has no children. It is
//! the end point of downward propagation: a parent replacing its value sends
//! every field a [`Notification::Parent`] carrying the field's new slot.
//!
//! While attached, the field reads its value from its parent's composite and
//! an empty slot reads as null. It falls back to its own copy once detached
//! or while the parent's value is null.

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use tracing::{debug, trace};

use crate::{
    Value,
    node::{
        AsParent, EqualFn, ErrorScope, FieldError, FieldKey, Node, NodeEvent, Notification,
        ParentLink, Subscriber, default_equal_fn, lock, publish, route_exact,
    },
    path,
};

#[derive(Debug, Default)]
struct FieldState {
    value: Value,
    touched: bool,
    active: bool,
    modified: bool,
    errors: Vec<FieldError>,
}

/// Leaf node of a form tree.
///
/// Fields are created attached: [`Field::new`] and [`FieldBuilder::attach`]
/// register the field with its parent before returning it. The parent keeps
/// the field alive; the returned handle may be dropped freely.
///
/// ```
/// # use formtree::{Field, Form, Node, Value};
/// let form = Form::builder().build();
/// let name = Field::builder("name").initial("Carl").attach(&form);
///
/// assert_eq!(name.path(), "name");
/// assert_eq!(form.get_value().pointer("name"), Some(&Value::from("Carl")));
///
/// name.set_value("Ana".into());
/// assert!(name.is_dirty());
/// assert_eq!(form.get_value().pointer("name"), Some(&Value::from("Ana")));
/// ```
pub struct Field {
    path: String,
    parent: ParentLink,
    initial: Value,
    equal_fn: EqualFn,
    subscriber: Option<Subscriber>,
    state: Mutex<FieldState>,
}

impl Field {
    /// Creates a field with no initial value under `key` of `parent`.
    pub fn new(parent: &impl AsParent, key: impl Into<FieldKey>) -> Arc<Self> {
        Self::builder(key).attach(parent)
    }

    /// Starts building a field that will live under `key`.
    pub fn builder(key: impl Into<FieldKey>) -> FieldBuilder {
        FieldBuilder::new(key)
    }

    /// The key of this field inside its parent.
    pub fn key(&self) -> &FieldKey {
        self.parent.key()
    }

    fn emit_value(&self, value: Value) {
        publish(&self.subscriber, NodeEvent::Value { value });
    }

    fn emit_errors(&self) {
        let errors = lock(&self.state).errors.clone();
        publish(&self.subscriber, NodeEvent::Error { errors });
    }
}

impl Node for Field {
    fn path(&self) -> String {
        self.path.clone()
    }

    fn get_value(&self) -> Value {
        self.parent
            .slot(self)
            .unwrap_or_else(|| lock(&self.state).value.clone())
    }

    fn get_initial_value(&self) -> Value {
        self.initial.clone()
    }

    fn set_value(&self, value: Value) {
        trace!(path = %self.path, %value, "field value set");
        {
            let mut state = lock(&self.state);
            state.modified = true;
            state.value = value.clone();
        }
        self.parent.patch(value.clone());
        self.emit_value(value);
        self.parent.notify(Notification::Child);
    }

    fn get_errors(&self, _scope: ErrorScope) -> Vec<FieldError> {
        lock(&self.state).errors.clone()
    }

    fn set_errors(&self, errors: Vec<FieldError>) {
        lock(&self.state).errors = errors;
        self.emit_errors();
    }

    fn append_errors(&self, errors: &[FieldError]) {
        let routed = route_exact(errors, &self.path);
        lock(&self.state).errors.extend(routed);
        self.emit_errors();
    }

    fn clear_errors(&self, _scope: ErrorScope) {
        lock(&self.state).errors.clear();
        self.emit_errors();
    }

    fn handle_validation(&self, errors: &[FieldError]) {
        let routed = route_exact(errors, &self.path);
        trace!(path = %self.path, routed = routed.len(), "field errors replaced by validation");
        lock(&self.state).errors = routed;
        self.emit_errors();
    }

    fn is_dirty(&self) -> bool {
        let current = self.get_value();
        !(self.equal_fn)(&self.initial, &current)
    }

    fn is_touched(&self) -> bool {
        lock(&self.state).touched
    }

    fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    fn is_modified(&self) -> bool {
        lock(&self.state).modified
    }

    fn handle_focus(&self) {
        {
            let mut state = lock(&self.state);
            state.active = true;
            state.touched = true;
        }
        self.parent.focus_within();
    }

    fn handle_blur(&self) {
        {
            let mut state = lock(&self.state);
            state.active = false;
            state.touched = true;
        }
        self.parent.blur_within();
    }

    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Parent { value } => {
                {
                    let mut state = lock(&self.state);
                    state.modified = true;
                    state.value = value.clone();
                }
                self.emit_value(value);
            }
            Notification::Child => {
                trace!(path = %self.path, "field ignored child notification");
            }
        }
    }

    fn dispose(&self) {
        debug!(path = %self.path, "disposing field");
        self.parent.detach();
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Field")
            .field("path", &self.path)
            .field("initial", &self.initial)
            .field("value", &state.value)
            .field("touched", &state.touched)
            .field("active", &state.active)
            .field("modified", &state.modified)
            .field("errors", &state.errors)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Field`].
///
/// The field is created and attached by [`attach`](FieldBuilder::attach).
pub struct FieldBuilder {
    key: FieldKey,
    initial: Value,
    equal_fn: Option<EqualFn>,
    subscriber: Option<Subscriber>,
}

impl FieldBuilder {
    /// Create a builder for a field under `key`.
    pub fn new(key: impl Into<FieldKey>) -> Self {
        Self {
            key: key.into(),
            initial: Value::Null,
            equal_fn: None,
            subscriber: None,
        }
    }

    /// Set the initial value. Defaults to `Null`.
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = value.into();
        self
    }

    /// Set the equality used by [`Node::is_dirty`]. Defaults to `==`.
    pub fn equal_fn<F>(mut self, equal_fn: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.equal_fn = Some(Arc::new(equal_fn));
        self
    }

    /// Set the subscriber receiving this field's events.
    pub fn subscriber<F>(mut self, subscriber: F) -> Self
    where
        F: Fn(&NodeEvent) + Send + Sync + 'static,
    {
        self.subscriber = Some(Arc::new(subscriber));
        self
    }

    /// Create the field and attach it to `parent`.
    ///
    /// If the parent's value is non-null the field's initial value is written
    /// into its slot and the change propagates to the root.
    pub fn attach(self, parent: &impl AsParent) -> Arc<Field> {
        let parent = parent.as_parent();
        let path = path::child_path(&parent.path(), &self.key);
        let field = Arc::new(Field {
            path,
            parent: ParentLink::new(self.key.clone(), &parent),
            state: Mutex::new(FieldState {
                value: self.initial.clone(),
                ..FieldState::default()
            }),
            initial: self.initial,
            equal_fn: self.equal_fn.unwrap_or_else(default_equal_fn),
            subscriber: self.subscriber,
        });

        let attached = parent.attach_node(self.key, field.clone());
        debug_assert_eq!(attached, field.path);
        debug!(path = %field.path, "field attached");
        field
    }
}

impl fmt::Debug for FieldBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBuilder")
            .field("key", &self.key)
            .field("initial", &self.initial)
            .field("equal_fn", &self.equal_fn.is_some())
            .field("subscriber", &self.subscriber.is_some())
            .finish()
    }
}
