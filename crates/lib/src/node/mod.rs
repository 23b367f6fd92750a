//! The node capability set shared by every element of a form tree.
//!
//! A form tree is made of three kinds of nodes:
//!
//! - [`Field`](crate::Field) - a leaf holding a scalar value
//! - [`FieldGroup`](crate::FieldGroup) - an intermediate node whose value is
//!   composed from its children
//! - [`Form`](crate::Form) - the root group, owner of the composite value and
//!   of the validation and submission collaborators
//!
//! All of them implement [`Node`]; the two children-bearing variants also
//! implement [`GroupNode`]. Parents own their children (`Arc<dyn Node>`),
//! while a child only keeps a `Weak<dyn GroupNode>` back-reference used for
//! lookups and never for ownership.
//!
//! # Propagation protocol
//!
//! A mutation at any node is kept consistent through [`Notification`]s:
//!
//! - upward, a node that changed its value calls its parent's
//!   [`notify`](Node::notify) with [`Notification::Child`]; each ancestor
//!   marks itself modified, publishes its new value and forwards the signal
//!   until it reaches the root, where validation may be triggered;
//! - downward, a group whose value was replaced sends every child a
//!   [`Notification::Parent`] carrying the child's slot of the new value.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use serde::{Deserialize, Serialize};

use crate::Value;

pub mod errors;

pub use errors::{FieldError, route_below, route_exact};

/// Key of a child slot inside a group.
///
/// Records are keyed by name and sequences by index. The key's display form
/// is the component that appears in the child's path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldKey {
    /// Named slot of a record
    Name(String),
    /// Indexed slot of a sequence
    Index(usize),
}

impl FieldKey {
    /// Returns the index of this key, parsing names that are decimal numbers.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            FieldKey::Index(index) => Some(*index),
            FieldKey::Name(name) => name.parse().ok(),
        }
    }

    /// Returns the name of this key if it is a named key.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            FieldKey::Name(name) => Some(name),
            FieldKey::Index(_) => None,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Name(name) => write!(f, "{name}"),
            FieldKey::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for FieldKey {
    fn from(value: &str) -> Self {
        FieldKey::Name(value.to_string())
    }
}

impl From<String> for FieldKey {
    fn from(value: String) -> Self {
        FieldKey::Name(value)
    }
}

impl From<&String> for FieldKey {
    fn from(value: &String) -> Self {
        FieldKey::Name(value.clone())
    }
}

impl From<usize> for FieldKey {
    fn from(value: usize) -> Self {
        FieldKey::Index(value)
    }
}

/// Which errors an error query or mutation targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorScope {
    /// Only the errors stored on the node itself
    #[default]
    Current,
    /// The node's errors followed by every descendant's, depth-first
    Group,
}

/// Event published to a node's [`Subscriber`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeEvent {
    /// The node's value changed
    Value {
        /// The node's new value
        value: Value,
    },
    /// The node's error list was replaced or extended
    Error {
        /// The node's current-scope errors after the change
        errors: Vec<FieldError>,
    },
}

/// Signal exchanged between related nodes to keep the tree consistent.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Sent by a parent to a child: the child's slot now holds `value`.
    Parent {
        /// The child's new value, `Null` when the parent value is null
        value: Value,
    },
    /// Sent by a child to its parent: the child's value changed.
    Child,
}

/// Callback receiving a node's events.
///
/// Subscribers are fire-and-forget: their return value is ignored and they
/// are always called without any node lock held, so they may query the tree.
pub type Subscriber = Arc<dyn Fn(&NodeEvent) + Send + Sync>;

/// Equality used by [`Node::is_dirty`].
pub type EqualFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Shared handle to any node of a tree.
pub type NodeRef = Arc<dyn Node>;

/// Returns the default equality: structural comparison of the values.
pub fn default_equal_fn() -> EqualFn {
    Arc::new(|a: &Value, b: &Value| a == b)
}

/// Capabilities shared by every node in a form tree.
pub trait Node: Send + Sync + fmt::Debug {
    /// The node's path from the root. The root's path is `"."`.
    fn path(&self) -> String;

    /// The node's current value. `Null` when the node has no value.
    fn get_value(&self) -> Value;

    /// The value the node was constructed with.
    fn get_initial_value(&self) -> Value;

    /// Replaces the node's value and propagates the change.
    fn set_value(&self, value: Value);

    /// Sets the value back to the initial value. Interaction flags are kept.
    fn reset(&self) {
        self.set_value(self.get_initial_value());
    }

    /// Returns the errors in `scope`.
    fn get_errors(&self, scope: ErrorScope) -> Vec<FieldError>;

    /// Replaces the node's own errors verbatim and publishes them.
    ///
    /// The list is not filtered nor distributed: callers address a single
    /// node with it.
    fn set_errors(&self, errors: Vec<FieldError>);

    /// Appends the errors addressed to this node's exact path, and for
    /// groups forwards the whole list to every child.
    fn append_errors(&self, errors: &[FieldError]);

    /// Clears the node's errors, or the whole subtree's for
    /// [`ErrorScope::Group`].
    fn clear_errors(&self, scope: ErrorScope);

    /// Applies the full result of a validation pass.
    ///
    /// Each node keeps the entries addressed to its exact path and groups
    /// hand the same full list to every child. Every node publishes an
    /// error event on each pass, even when its list is unchanged.
    fn handle_validation(&self, errors: &[FieldError]);

    /// True when there are no errors in `scope`.
    fn is_valid(&self, scope: ErrorScope) -> bool {
        self.get_errors(scope).is_empty()
    }

    /// True when the current value differs from the initial value under the
    /// node's equality function.
    fn is_dirty(&self) -> bool;

    /// True once the node, or a descendant, has been focused or blurred.
    fn is_touched(&self) -> bool;

    /// True while the node itself is focused.
    fn is_active(&self) -> bool;

    /// True once any value-affecting operation happened on the node.
    fn is_modified(&self) -> bool;

    /// Marks the node as focused.
    fn handle_focus(&self);

    /// Marks the node as blurred.
    fn handle_blur(&self);

    /// Receives a propagation signal from a related node.
    fn notify(&self, notification: Notification);

    /// Disposes the node's descendants, then detaches it from its parent.
    fn dispose(&self);
}

/// Capabilities of nodes that own children: [`FieldGroup`](crate::FieldGroup)
/// and [`Form`](crate::Form).
pub trait GroupNode: Node {
    /// Registers `node` under `key` and returns its path.
    ///
    /// When the group's value is non-null the child's initial value is
    /// written into its slot and the change is propagated; attaching into a
    /// null value only records the child.
    fn attach_node(&self, key: FieldKey, node: NodeRef) -> String;

    /// Removes the child under `key`. Returns whether a child was present.
    fn detach_node(&self, key: &FieldKey) -> bool;

    /// Returns the child under `key`.
    fn get_node(&self, key: &FieldKey) -> Option<NodeRef>;

    /// Returns every `(key, child)` pair in insertion order.
    fn list_nodes(&self) -> Vec<(FieldKey, NodeRef)>;

    /// Reads one slot of the group's current value.
    fn extract_value(&self, key: &FieldKey) -> Option<Value>;

    /// Writes one slot of the group's current value and marks the group
    /// modified. Children and subscribers are not notified. Returns the new
    /// composite, or `None` when the group's value is null.
    fn patch_value(&self, key: &FieldKey, value: Value) -> Option<Value>;

    /// Writes one slot of the group's current value without touching any
    /// flag. Used to carry a descendant's write up to the root.
    fn write_value(&self, key: &FieldKey, value: Value) -> Option<Value>;

    /// Sets the value back to the initial value.
    fn reset_value(&self) {
        self.reset();
    }

    /// True when any child reports [`is_valid`](Node::is_valid) for its
    /// current scope.
    ///
    /// Note that this answers for a *valid* child, not for a child holding
    /// errors.
    fn has_nested_error(&self) -> bool {
        self.list_nodes()
            .iter()
            .any(|(_, node)| node.is_valid(ErrorScope::Current))
    }

    /// A descendant gained focus: mark touched and propagate upwards.
    fn handle_focus_within(&self);

    /// A descendant lost focus: mark touched and propagate upwards.
    fn handle_blur_within(&self);

    /// Children in insertion order.
    fn nodes(&self) -> Vec<NodeRef> {
        self.list_nodes().into_iter().map(|(_, node)| node).collect()
    }

    /// Child keys in insertion order.
    fn fields(&self) -> Vec<FieldKey> {
        self.list_nodes().into_iter().map(|(key, _)| key).collect()
    }

    /// `(key, child)` pairs in insertion order.
    fn entries(&self) -> Vec<(FieldKey, NodeRef)> {
        self.list_nodes()
    }
}

/// Anything a node can be attached to.
///
/// Implemented for `Arc`s of the concrete group types and for
/// `Arc<dyn GroupNode>`.
pub trait AsParent {
    /// Returns the parent as a shared group handle.
    fn as_parent(&self) -> Arc<dyn GroupNode>;
}

impl<T: GroupNode + 'static> AsParent for Arc<T> {
    fn as_parent(&self) -> Arc<dyn GroupNode> {
        self.clone()
    }
}

impl AsParent for Arc<dyn GroupNode> {
    fn as_parent(&self) -> Arc<dyn GroupNode> {
        self.clone()
    }
}

/// Non-owning link from a child to its parent.
#[derive(Clone)]
pub(crate) struct ParentLink {
    key: FieldKey,
    parent: Weak<dyn GroupNode>,
}

impl ParentLink {
    pub(crate) fn new(key: FieldKey, parent: &Arc<dyn GroupNode>) -> Self {
        Self {
            key,
            parent: Arc::downgrade(parent),
        }
    }

    pub(crate) fn key(&self) -> &FieldKey {
        &self.key
    }

    /// Upgrades the weak reference. `None` once the parent was dropped.
    pub(crate) fn get(&self) -> Option<Arc<dyn GroupNode>> {
        self.parent.upgrade()
    }

    /// Reads this node's slot from the parent's value.
    pub(crate) fn extract(&self) -> Option<Value> {
        self.get()?.extract_value(&self.key)
    }

    /// Reads the slot of `node` while it is registered under a parent holding
    /// a composite. A hole reads as `Null`.
    ///
    /// `None` once `node` was detached or replaced, or while the parent's
    /// value is null.
    pub(crate) fn slot(&self, node: &dyn Node) -> Option<Value> {
        let parent = self.get()?;
        let registered = parent.get_node(&self.key)?;
        if !std::ptr::addr_eq(Arc::as_ptr(&registered), node as *const dyn Node) {
            return None;
        }
        if parent.get_value().is_null() {
            return None;
        }
        Some(parent.extract_value(&self.key).unwrap_or_default())
    }

    /// Writes this node's slot, marking the parent modified.
    pub(crate) fn patch(&self, value: Value) -> Option<Value> {
        self.get()?.patch_value(&self.key, value)
    }

    /// Writes this node's slot without marking the parent modified.
    pub(crate) fn write(&self, value: Value) -> Option<Value> {
        self.get()?.write_value(&self.key, value)
    }

    pub(crate) fn notify(&self, notification: Notification) {
        if let Some(parent) = self.get() {
            parent.notify(notification);
        }
    }

    pub(crate) fn focus_within(&self) {
        if let Some(parent) = self.get() {
            parent.handle_focus_within();
        }
    }

    pub(crate) fn blur_within(&self) {
        if let Some(parent) = self.get() {
            parent.handle_blur_within();
        }
    }

    pub(crate) fn detach(&self) -> bool {
        self.get().is_some_and(|parent| parent.detach_node(&self.key))
    }
}

impl fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentLink")
            .field("key", &self.key)
            .field("attached", &(self.parent.strong_count() > 0))
            .finish()
    }
}

/// Insertion-ordered child registry with unique keys.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<(FieldKey, NodeRef)>,
}

impl Registry {
    /// Inserts `node`, replacing an existing child with the same key in place.
    pub(crate) fn insert(&mut self, key: FieldKey, node: NodeRef) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = node,
            None => self.entries.push((key, node)),
        }
    }

    pub(crate) fn remove(&mut self, key: &FieldKey) -> Option<NodeRef> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub(crate) fn get(&self, key: &FieldKey) -> Option<NodeRef> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node.clone())
    }

    pub(crate) fn snapshot(&self) -> Vec<(FieldKey, NodeRef)> {
        self.entries.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Locks a node's state, recovering from a poisoned lock.
///
/// A subscriber that panics never holds a node lock, so the protected state
/// is consistent even after a poisoning panic.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Publishes `event` to an optional subscriber.
pub(crate) fn publish(subscriber: &Option<Subscriber>, event: NodeEvent) {
    if let Some(subscriber) = subscriber {
        subscriber(&event);
    }
}

/// Forwards `errors` to every child's [`Node::handle_validation`].
pub(crate) fn distribute_validation(children: &[(FieldKey, NodeRef)], errors: &[FieldError]) {
    for (_, node) in children {
        node.handle_validation(errors);
    }
}

/// Forwards `errors` to every child's [`Node::append_errors`].
pub(crate) fn distribute_append(children: &[(FieldKey, NodeRef)], errors: &[FieldError]) {
    for (_, node) in children {
        node.append_errors(errors);
    }
}

/// Collects the group-scope errors of every child, depth-first.
pub(crate) fn collect_group_errors(children: &[(FieldKey, NodeRef)], out: &mut Vec<FieldError>) {
    for (_, node) in children {
        out.extend(node.get_errors(ErrorScope::Group));
    }
}
