use formtree::{Field, FieldGroup, Form, GroupNode, Node, RecordComposer, Value};
use serde_json::json;

use crate::helpers::*;

#[test]
fn fresh_form_is_pristine() {
    let form = Form::builder().build();

    assert!(!form.is_touched());
    assert!(!form.is_active());
    assert!(!form.is_modified());
    assert!(!form.is_dirty());
    assert!(form.is_valid(Default::default()));
}

#[test]
fn attaching_marks_the_form_modified() {
    let form = Form::builder().validation_trigger(None).build();
    Field::new(&form, "name");

    assert!(form.is_modified());
    assert!(form.is_dirty());
}

#[test]
fn attaching_to_a_null_form_changes_nothing() {
    let form = Form::builder()
        .initial(Value::Null)
        .validation_trigger(None)
        .build();
    let name = Field::new(&form, "name");

    assert!(!form.is_modified());
    assert_eq!(form.get_value(), Value::Null);
    assert_eq!(form.list_nodes().len(), 1);
    assert_eq!(name.path(), "name");
}

#[test]
fn detaching_marks_the_form_modified() {
    let form = Form::builder()
        .initial(value(json!({"name": "Carl"})))
        .validation_trigger(None)
        .build();

    assert!(!form.detach_node(&"name".into()));
    assert!(form.is_modified());
    assert_eq!(form.get_value(), value(json!({})));
}

#[test]
fn patch_value_marks_modified_and_write_value_does_not() {
    let form = Form::builder().validation_trigger(None).build();

    form.write_value(&"name".into(), "Carl".into());
    assert!(!form.is_modified());
    assert_eq!(form.get_value(), value(json!({"name": "Carl"})));

    form.patch_value(&"name".into(), "Ana".into());
    assert!(form.is_modified());
}

#[test]
fn set_value_marks_modified() {
    let form = Form::builder().validation_trigger(None).build();

    form.set_value(value(json!({"name": "Carl"})));

    assert!(form.is_modified());
    assert!(form.is_dirty());
}

#[test]
fn nested_field_edits_reach_the_root() {
    let tree = plain_address_form();
    let attached = tree.form.get_value();

    tree.street.set_value("Main St".into());

    assert!(tree.form.is_modified());
    assert_ne!(tree.form.get_value(), attached);
    assert!(tree.address.is_modified());
    assert!(!tree.name.is_modified());
}

#[test]
fn focus_and_blur_at_the_root() {
    let form = Form::builder().validation_trigger(None).build();

    form.handle_focus();
    assert!(form.is_active());
    assert!(form.is_touched());

    form.handle_blur();
    assert!(!form.is_active());
    assert!(form.is_touched());
}

#[test]
fn focus_deep_in_the_tree_touches_the_root() {
    let form = Form::builder().validation_trigger(None).build();
    let outer = FieldGroup::new(&form, "outer", RecordComposer);
    let inner = FieldGroup::new(&outer, "inner", RecordComposer);
    let leaf = Field::new(&inner, "leaf");

    leaf.handle_focus();

    assert!(leaf.is_active());
    let ancestors: [&dyn Node; 3] = [&*form, &*outer, &*inner];
    for node in ancestors {
        assert!(node.is_touched(), "{} should be touched", node.path());
        assert!(!node.is_active(), "{} should not be active", node.path());
    }
}

#[test]
fn reset_restores_the_initial_value() {
    let form = Form::builder()
        .initial(value(json!({"name": "Carl"})))
        .validation_trigger(None)
        .build();
    let name = Field::builder("name").initial("Carl").attach(&form);

    name.set_value("Ana".into());
    assert!(form.is_dirty());

    form.reset();
    assert!(!form.is_dirty());
    assert_eq!(name.get_value(), "Carl");
}
