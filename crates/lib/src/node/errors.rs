//! Field errors and the rules that route them to nodes.
//!
//! A [`FieldError`] is addressed to a node by path. Routing is exact: a node
//! keeps only the errors whose path equals its own, and a group hands the
//! full list on to each child so every node can pick its own entries. Errors
//! addressed to paths with no matching node are dropped silently.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path;

/// A validation or submission error addressed to one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldError {
    /// Path of the node the error belongs to, e.g. `"address.street"`
    pub path: String,
    /// Human readable description
    pub message: String,
}

impl FieldError {
    /// Creates an error for the node at `path`.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an error addressed to the root node.
    pub fn root(message: impl Into<String>) -> Self {
        Self::new(path::ROOT_PATH, message)
    }

    /// Returns true if this error belongs to the current scope of the node
    /// at `node_path`.
    pub fn targets(&self, node_path: &str) -> bool {
        path::matches_exact(&self.path, node_path)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Returns the entries of `errors` addressed exactly to `node_path`, keeping
/// their relative order.
///
/// ```
/// # use formtree::{FieldError, route_exact};
/// let errors = vec![
///     FieldError::new("address", "incomplete"),
///     FieldError::new("address.street", "required"),
/// ];
/// assert_eq!(route_exact(&errors, "address"), vec![errors[0].clone()]);
/// assert!(route_exact(&errors, "name").is_empty());
/// ```
pub fn route_exact(errors: &[FieldError], node_path: &str) -> Vec<FieldError> {
    errors
        .iter()
        .filter(|error| error.targets(node_path))
        .cloned()
        .collect()
}

/// Returns the entries of `errors` addressed to strict descendants of the
/// node at `node_path`. Only these can be claimed below that node.
pub fn route_below(errors: &[FieldError], node_path: &str) -> Vec<FieldError> {
    errors
        .iter()
        .filter(|error| path::is_within(&error.path, node_path))
        .cloned()
        .collect()
}
