//!
//! formtree: hierarchical state containers for structured input.
//! This library provides the node tree behind a form: values composed from
//! nested fields, interaction flags, path-addressed errors and asynchronous
//! validation and submission, without any UI dependency.
//!
//! ## Core Concepts
//!
//! formtree is built around several key concepts:
//!
//! * **Nodes (`node::Node`)**: The capability set every element of a tree implements: value access, flags, errors and the propagation protocol.
//! * **Fields (`field::Field`)**: Leaf nodes holding a scalar value.
//! * **Groups (`group::FieldGroup`)**: Intermediate nodes whose value is a composite slot of their parent, assembled from their children.
//! * **Forms (`form::Form`)**: The root node. Stores the single composite value and owns the validation and submission collaborators.
//! * **Composers (`composer::Composer`)**: Pluggable strategies reading and writing one slot of a composite value:
//!     * **RecordComposer**: keyed records.
//!     * **SequenceComposer**: indexed sequences that keep holes on delete.
//! * **Field errors (`node::FieldError`)**: Errors addressed to a node by its dot separated path and routed through the tree by exact path match.

pub mod composer;
pub mod field;
pub mod form;
pub mod group;
pub mod node;
pub mod path;
pub mod value;

pub use composer::{Composer, MAX_SEQUENCE_PADDING, RecordComposer, SequenceComposer};
pub use field::{Field, FieldBuilder};
pub use form::{
    Form, FormBuilder, FormError, FormSettings, RejectionHook, Submit, SubmitState, Validate,
    ValidationTrigger,
};
pub use group::{FieldGroup, FieldGroupBuilder};
pub use node::{
    AsParent, EqualFn, ErrorScope, FieldError, FieldKey, GroupNode, Node, NodeEvent, NodeRef,
    Notification, Subscriber, route_below, route_exact,
};
pub use value::Value;

/// Result type used throughout the formtree library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the formtree library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured collaborator errors from the form module
    #[error(transparent)]
    Form(form::FormError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Form(_) => "form",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error is a collaborator rejection.
    pub fn is_rejection(&self) -> bool {
        match self {
            Error::Form(form_err) => form_err.is_rejected(),
            _ => false,
        }
    }

    /// Check if this error comes from a background task.
    pub fn is_task_failure(&self) -> bool {
        match self {
            Error::Form(form_err) => form_err.is_task_failure(),
            _ => false,
        }
    }

    /// Check if this error is related to serialization.
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, Error::Serialize(_))
    }
}
