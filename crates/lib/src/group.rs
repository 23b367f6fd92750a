//! Group nodes.
//!
//! A [`FieldGroup`] does not store a value of its own: its value is the slot
//! its parent's composite holds under the group's key. Reads go through
//! [`GroupNode::extract_value`] on the parent and writes are carried up to the
//! root with [`GroupNode::write_value`], so the root composite stays the
//! single source of truth.
//!
//! [`Branch`] holds the bookkeeping shared by every children-bearing node
//! (flags, local errors, child registry) and is reused by [`Form`](crate::Form).

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use tracing::{debug, trace};

use crate::{
    Composer, RecordComposer, Value,
    node::{
        AsParent, EqualFn, ErrorScope, FieldError, FieldKey, GroupNode, Node, NodeEvent, NodeRef,
        Notification, ParentLink, Registry, Subscriber, collect_group_errors, default_equal_fn,
        distribute_append, distribute_validation, lock, publish, route_below, route_exact,
    },
    path,
};

#[derive(Default)]
struct BranchState {
    touched: bool,
    active: bool,
    modified: bool,
    errors: Vec<FieldError>,
    nodes: Registry,
}

/// Flags, errors and children of a group or root node.
pub(crate) struct Branch {
    path: String,
    composer: Arc<dyn Composer>,
    subscriber: Option<Subscriber>,
    state: Mutex<BranchState>,
}

impl Branch {
    pub(crate) fn new(
        path: String,
        composer: Arc<dyn Composer>,
        subscriber: Option<Subscriber>,
    ) -> Self {
        Self {
            path,
            composer,
            subscriber,
            state: Mutex::new(BranchState::default()),
        }
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn composer(&self) -> &dyn Composer {
        self.composer.as_ref()
    }

    pub(crate) fn emit_value(&self, value: Value) {
        publish(&self.subscriber, NodeEvent::Value { value });
    }

    fn emit_errors(&self) {
        let errors = lock(&self.state).errors.clone();
        publish(&self.subscriber, NodeEvent::Error { errors });
    }

    /// Registers a child and returns its path.
    pub(crate) fn register(&self, key: FieldKey, node: NodeRef) -> String {
        let path = path::child_path(&self.path, &key);
        debug!(parent = %self.path, %key, "attaching node");
        lock(&self.state).nodes.insert(key, node);
        path
    }

    /// Removes a child. Returns whether one was registered under `key`.
    pub(crate) fn unregister(&self, key: &FieldKey) -> bool {
        let removed = lock(&self.state).nodes.remove(key).is_some();
        debug!(parent = %self.path, %key, removed, "detaching node");
        removed
    }

    pub(crate) fn get_node(&self, key: &FieldKey) -> Option<NodeRef> {
        lock(&self.state).nodes.get(key)
    }

    pub(crate) fn list_nodes(&self) -> Vec<(FieldKey, NodeRef)> {
        lock(&self.state).nodes.snapshot()
    }

    pub(crate) fn child_count(&self) -> usize {
        lock(&self.state).nodes.len()
    }

    /// Sends every child its slot of `value`.
    pub(crate) fn broadcast(&self, value: &Value) {
        for (key, node) in self.list_nodes() {
            let slot = if value.is_null() {
                Value::Null
            } else {
                self.composer.extract(value, &key).unwrap_or_default()
            };
            node.notify(Notification::Parent { value: slot });
        }
    }

    pub(crate) fn mark_modified(&self) {
        lock(&self.state).modified = true;
    }

    pub(crate) fn focus(&self) {
        let mut state = lock(&self.state);
        state.active = true;
        state.touched = true;
    }

    pub(crate) fn blur(&self) {
        let mut state = lock(&self.state);
        state.active = false;
        state.touched = true;
    }

    pub(crate) fn touch(&self) {
        lock(&self.state).touched = true;
    }

    pub(crate) fn is_touched(&self) -> bool {
        lock(&self.state).touched
    }

    pub(crate) fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    pub(crate) fn is_modified(&self) -> bool {
        lock(&self.state).modified
    }

    pub(crate) fn get_errors(&self, scope: ErrorScope) -> Vec<FieldError> {
        let (mut errors, children) = {
            let state = lock(&self.state);
            (state.errors.clone(), state.nodes.snapshot())
        };
        if scope == ErrorScope::Group {
            collect_group_errors(&children, &mut errors);
        }
        errors
    }

    pub(crate) fn set_errors(&self, errors: Vec<FieldError>) {
        lock(&self.state).errors = errors;
        self.emit_errors();
    }

    pub(crate) fn append_errors(&self, errors: &[FieldError]) {
        let routed = route_exact(errors, &self.path);
        let children = {
            let mut state = lock(&self.state);
            state.errors.extend(routed);
            state.nodes.snapshot()
        };
        self.emit_errors();
        distribute_append(&children, &route_below(errors, &self.path));
    }

    pub(crate) fn clear_errors(&self, scope: ErrorScope) {
        let children = {
            let mut state = lock(&self.state);
            state.errors.clear();
            state.nodes.snapshot()
        };
        self.emit_errors();
        if scope == ErrorScope::Group {
            for (_, node) in children {
                node.clear_errors(ErrorScope::Group);
            }
        }
    }

    pub(crate) fn handle_validation(&self, errors: &[FieldError]) {
        let routed = route_exact(errors, &self.path);
        let below = route_below(errors, &self.path);
        trace!(
            path = %self.path,
            local = routed.len(),
            total = errors.len(),
            below = below.len(),
            "routing validation errors"
        );
        let children = {
            let mut state = lock(&self.state);
            state.errors = routed;
            state.nodes.snapshot()
        };
        self.emit_errors();
        distribute_validation(&children, &below);
    }

    pub(crate) fn dispose_children(&self) {
        for (_, node) in self.list_nodes() {
            node.dispose();
        }
    }
}

impl fmt::Debug for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Branch")
            .field("path", &self.path)
            .field("composer", &self.composer)
            .field("touched", &state.touched)
            .field("active", &state.active)
            .field("modified", &state.modified)
            .field("errors", &state.errors)
            .field("children", &state.nodes.len())
            .finish_non_exhaustive()
    }
}

/// Intermediate node whose value is a composite slot of its parent.
///
/// ```
/// # use formtree::{Field, FieldGroup, Form, GroupNode, Node, RecordComposer, Value};
/// let form = Form::builder().build();
/// let address = FieldGroup::new(&form, "address", RecordComposer);
/// let street = Field::new(&address, "street");
///
/// street.set_value("Main St".into());
///
/// assert_eq!(street.path(), "address.street");
/// assert_eq!(address.extract_value(&"street".into()), Some(Value::from("Main St")));
/// assert_eq!(form.get_value().pointer("address.street"), Some(&Value::from("Main St")));
/// ```
pub struct FieldGroup {
    parent: ParentLink,
    initial: Value,
    equal_fn: EqualFn,
    branch: Branch,
}

impl FieldGroup {
    /// Creates a group under `key` of `parent` whose initial value is the
    /// composer's default composite.
    pub fn new(
        parent: &impl AsParent,
        key: impl Into<FieldKey>,
        composer: impl Composer + 'static,
    ) -> Arc<Self> {
        Self::builder(key).composer(composer).attach(parent)
    }

    /// Starts building a group that will live under `key`.
    pub fn builder(key: impl Into<FieldKey>) -> FieldGroupBuilder {
        FieldGroupBuilder::new(key)
    }

    /// The key of this group inside its parent.
    pub fn key(&self) -> &FieldKey {
        self.parent.key()
    }

    /// The group's composite as held by its parent, if any.
    fn composite(&self) -> Option<Value> {
        self.parent.extract().filter(|value| !value.is_null())
    }

    /// Applies `edit` to a copy of the composite and writes it back up the
    /// tree. Returns the new composite, or `None` when it is null.
    fn edit_composite(&self, edit: impl FnOnce(&dyn Composer, &mut Value)) -> Option<Value> {
        let mut group = self.composite()?;
        edit(self.branch.composer(), &mut group);
        self.parent.write(group.clone());
        Some(group)
    }
}

impl Node for FieldGroup {
    fn path(&self) -> String {
        self.branch.path().to_string()
    }

    fn get_value(&self) -> Value {
        self.parent.extract().unwrap_or_default()
    }

    fn get_initial_value(&self) -> Value {
        self.initial.clone()
    }

    fn set_value(&self, value: Value) {
        trace!(path = %self.branch.path(), %value, "group value set");
        self.branch.mark_modified();
        self.parent.patch(value.clone());
        self.branch.broadcast(&value);
        self.branch.emit_value(value);
        self.parent.notify(Notification::Child);
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
        self.parent.focus_within();
    }

    fn handle_blur(&self) {
        self.branch.blur();
        self.parent.blur_within();
    }

    fn notify(&self, notification: Notification) {
        self.branch.mark_modified();
        match notification {
            Notification::Child => {
                self.branch.emit_value(self.get_value());
                self.parent.notify(Notification::Child);
            }
            Notification::Parent { value } => {
                self.branch.emit_value(value.clone());
                self.branch.broadcast(&value);
            }
        }
    }

    fn dispose(&self) {
        debug!(path = %self.branch.path(), "disposing group");
        self.branch.dispose_children();
        self.parent.detach();
    }
}

impl GroupNode for FieldGroup {
    fn attach_node(&self, key: FieldKey, node: NodeRef) -> String {
        let initial = node.get_initial_value();
        let path = self.branch.register(key.clone(), node);

        let Some(group) = self.edit_composite(|composer, group| composer.patch(group, &key, initial))
        else {
            trace!(path = %self.branch.path(), %key, "attached into null composite");
            return path;
        };
        self.branch.mark_modified();
        self.branch.emit_value(group);
        self.parent.notify(Notification::Child);
        path
    }

    fn detach_node(&self, key: &FieldKey) -> bool {
        let removed = self.branch.unregister(key);

        if let Some(group) = self.edit_composite(|composer, group| composer.delete(group, key)) {
            self.branch.mark_modified();
            self.branch.emit_value(group);
            self.parent.notify(Notification::Child);
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
        let group = self.composite()?;
        self.branch.composer().extract(&group, key)
    }

    fn patch_value(&self, key: &FieldKey, value: Value) -> Option<Value> {
        let group =
            self.edit_composite(|composer, group| composer.patch(group, key, value))?;
        self.branch.mark_modified();
        Some(group)
    }

    fn write_value(&self, key: &FieldKey, value: Value) -> Option<Value> {
        self.edit_composite(|composer, group| composer.patch(group, key, value))
    }

    fn handle_focus_within(&self) {
        self.branch.touch();
        self.parent.focus_within();
    }

    fn handle_blur_within(&self) {
        self.branch.touch();
        self.parent.blur_within();
    }
}

impl fmt::Debug for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldGroup")
            .field("key", self.parent.key())
            .field("initial", &self.initial)
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

/// Builder for [`FieldGroup`].
pub struct FieldGroupBuilder {
    key: FieldKey,
    composer: Arc<dyn Composer>,
    initial: Option<Value>,
    equal_fn: Option<EqualFn>,
    subscriber: Option<Subscriber>,
}

impl FieldGroupBuilder {
    /// Create a builder for a record group under `key`.
    pub fn new(key: impl Into<FieldKey>) -> Self {
        Self {
            key: key.into(),
            composer: Arc::new(RecordComposer),
            initial: None,
            equal_fn: None,
            subscriber: None,
        }
    }

    /// Set the composer. Defaults to [`RecordComposer`].
    pub fn composer(mut self, composer: impl Composer + 'static) -> Self {
        self.composer = Arc::new(composer);
        self
    }

    /// Set the initial composite. Defaults to the composer's default.
    ///
    /// A `Null` initial value makes the group a null composite: children
    /// attached to it are registered without writing any slot.
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
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

    /// Set the subscriber receiving this group's events.
    pub fn subscriber<F>(mut self, subscriber: F) -> Self
    where
        F: Fn(&NodeEvent) + Send + Sync + 'static,
    {
        self.subscriber = Some(Arc::new(subscriber));
        self
    }

    /// Create the group and attach it to `parent`.
    pub fn attach(self, parent: &impl AsParent) -> Arc<FieldGroup> {
        let parent = parent.as_parent();
        let path = path::child_path(&parent.path(), &self.key);
        let initial = self
            .initial
            .unwrap_or_else(|| self.composer.default());
        let group = Arc::new(FieldGroup {
            parent: ParentLink::new(self.key.clone(), &parent),
            initial,
            equal_fn: self.equal_fn.unwrap_or_else(default_equal_fn),
            branch: Branch::new(path, self.composer, self.subscriber),
        });

        let attached = parent.attach_node(self.key, group.clone());
        debug_assert_eq!(attached, group.branch.path());
        debug!(path = %group.branch.path(), children = group.branch.child_count(), "group attached");
        group
    }
}

impl fmt::Debug for FieldGroupBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldGroupBuilder")
            .field("key", &self.key)
            .field("composer", &self.composer)
            .field("initial", &self.initial)
            .finish_non_exhaustive()
    }
}
