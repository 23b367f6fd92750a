//! Form integration tests
//!
//! The root node is exercised from several angles, one module per concern:
//! - state: touched/active/modified/dirty flags at the root
//! - errors: error manipulation and collection at the root
//! - composition: attaching and detaching children
//! - values: the root composite and its views
//! - validation: trigger dispatch and validation results
//! - submission: the submit pipeline and its outcomes
//! - events: what the root's subscriber observes

mod events;
mod state;
mod validation;
mod values;
