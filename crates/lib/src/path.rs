//! Node paths.
//!
//! Every node in a form tree is addressed by a dot separated path computed
//! when it attaches to its parent. The root node is always [`ROOT_PATH`]; a
//! direct child of the root is addressed by its key alone, and deeper nodes
//! join their parent's path and their key with a dot:
//!
//! ```text
//! .                    root
//! address              child of root
//! address.street       child of "address"
//! contacts.0.email     child of the sequence item "contacts.0"
//! ```
//!
//! Error routing compares [`FieldError`](crate::FieldError) paths with node
//! paths using [`matches_exact`] and [`is_within`].

use std::fmt::Display;

/// Path of the root node.
pub const ROOT_PATH: &str = ".";

/// Separator between path components.
pub const SEPARATOR: char = '.';

/// Returns true if `path` is the root path.
pub fn is_root(path: &str) -> bool {
    path == ROOT_PATH
}

/// Builds the path of a child attached under `parent` with `key`.
///
/// ```
/// # use formtree::path::child_path;
/// assert_eq!(child_path(".", "address"), "address");
/// assert_eq!(child_path("address", "street"), "address.street");
/// assert_eq!(child_path("contacts", 0), "contacts.0");
/// ```
pub fn child_path(parent: &str, key: impl Display) -> String {
    if is_root(parent) {
        key.to_string()
    } else {
        format!("{parent}{SEPARATOR}{key}")
    }
}

/// Returns true if an error addressed to `error_path` belongs to the current
/// scope of the node at `node_path`.
pub fn matches_exact(error_path: &str, node_path: &str) -> bool {
    error_path == node_path
}

/// Returns true if `error_path` addresses a strict descendant of the node at
/// `node_path`.
///
/// Every path other than the root itself is a descendant of the root.
///
/// ```
/// # use formtree::path::is_within;
/// assert!(is_within("address.street", "address"));
/// assert!(!is_within("address", "address"));
/// assert!(!is_within("addressee", "address"));
/// assert!(is_within("name", "."));
/// ```
pub fn is_within(error_path: &str, node_path: &str) -> bool {
    if is_root(node_path) {
        return !is_root(error_path);
    }
    error_path
        .strip_prefix(node_path)
        .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

/// Returns true if `error_path` belongs to the group scope of the node at
/// `node_path`: the node itself or any of its descendants.
///
/// ```
/// # use formtree::path::in_group_scope;
/// assert!(in_group_scope("address", "address"));
/// assert!(in_group_scope("address.street", "address"));
/// assert!(!in_group_scope("addresses", "address"));
/// ```
pub fn in_group_scope(error_path: &str, node_path: &str) -> bool {
    matches_exact(error_path, node_path) || is_within(error_path, node_path)
}

/// Splits a path into its components. The root path has no components.
pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|component| !component.is_empty())
}
