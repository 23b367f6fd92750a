use formtree::{Field, FieldGroup, Form, GroupNode, Node, RecordComposer, Value};
use serde_json::json;

use crate::helpers::*;

#[test]
fn initial_value_defaults_to_an_empty_record() {
    let form = Form::builder().build();

    assert_eq!(form.get_value(), value(json!({})));
    assert_eq!(form.get_initial_value(), value(json!({})));
}

#[test]
fn field_initial_is_written_into_the_form() {
    let form = Form::builder()
        .initial(value(json!({"name": "From form"})))
        .validation_trigger(None)
        .build();
    let name = Field::builder("name").initial("From field").attach(&form);

    assert_eq!(name.get_value(), "From field");
    assert_eq!(form.get_value(), value(json!({"name": "From field"})));
    assert_eq!(form.get_initial_value(), value(json!({"name": "From form"})));
}

#[test]
fn set_value_reaches_every_descendant() {
    let tree = plain_address_form();

    tree.form.set_value(value(json!({
        "name": "Carl",
        "address": {"street": "Main St", "state": "TX"}
    })));

    assert_eq!(tree.name.get_value(), "Carl");
    assert_eq!(tree.street.get_value(), "Main St");
    assert_eq!(tree.state.get_value(), "TX");
    assert!(tree.name.is_modified());
    assert!(tree.state.is_modified());
}

#[test]
fn set_value_with_missing_slots_nulls_children() {
    let tree = plain_address_form();
    tree.street.set_value("Main St".into());

    tree.form.set_value(value(json!({"name": "Carl"})));

    assert_eq!(tree.address.get_value(), Value::Null);
    assert_eq!(tree.street.get_value(), Value::Null);
}

#[test]
fn patch_value_is_visible_to_the_field() {
    let tree = plain_address_form();

    tree.form.patch_value(&"name".into(), "Test".into());

    assert_eq!(tree.name.get_value(), "Test");
    assert_eq!(
        tree.form.get_value(),
        value(json!({"name": "Test", "address": {"street": null, "state": null}}))
    );
}

#[test]
fn extract_value_reads_one_slot() {
    let tree = plain_address_form();
    tree.street.set_value("Main St".into());

    assert_eq!(
        tree.form.extract_value(&"address".into()),
        Some(value(json!({"street": "Main St", "state": null})))
    );
    assert_eq!(tree.form.extract_value(&"missing".into()), None);
}

#[test]
fn extract_from_a_null_form_is_none() {
    let form = Form::builder()
        .initial(Value::Null)
        .validation_trigger(None)
        .build();

    assert_eq!(form.extract_value(&"name".into()), None);
    assert_eq!(form.patch_value(&"name".into(), "x".into()), None);
    assert!(!form.is_modified());
}

#[test]
fn reset_value_restores_the_initial_composite() {
    let form = Form::builder()
        .initial(value(json!({"name": "Carl", "address": {"street": "Main St"}})))
        .validation_trigger(None)
        .build();
    let name = Field::new(&form, "name");
    let address = FieldGroup::new(&form, "address", RecordComposer);
    let street = Field::new(&address, "street");

    name.set_value("Ana".into());
    street.set_value("Side St".into());

    form.reset_value();

    assert_eq!(name.get_value(), "Carl");
    assert_eq!(street.get_value(), "Main St");
    assert!(!form.is_dirty());
}

#[test]
fn custom_equality_drives_dirty() {
    let form = Form::builder()
        .initial(value(json!({"name": null})))
        .equal_fn(|a, b| a.pointer("name") == b.pointer("name"))
        .validation_trigger(None)
        .build();
    let name = Field::new(&form, "name");
    let other = Field::new(&form, "other");

    other.set_value("ignored".into());
    assert!(!form.is_dirty());

    name.set_value("Carl".into());
    assert!(form.is_dirty());
}
