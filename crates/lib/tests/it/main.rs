/*! Integration tests for formtree.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - field: Tests for the Field leaf node
 * - group: Tests for FieldGroup nodes nested in a form
 * - form: Tests for the Form root node, split by concern (state, errors,
 *   composition, values, validation, submission, events)
 * - routing: Tests for path-addressed error routing across the whole tree
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("formtree=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod form;
