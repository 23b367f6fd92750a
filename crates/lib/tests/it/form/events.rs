use formtree::{Field, FieldGroup, Form, Node, RecordComposer, Value};
use serde_json::json;

use crate::helpers::*;

#[test]
fn root_publishes_value_changes() {
    let (log, subscriber) = event_recorder();
    let form = Form::builder()
        .subscriber(subscriber)
        .validation_trigger(None)
        .build();

    let name = Field::new(&form, "name");
    assert_eq!(drain(&log), vec![value_event(json!({"name": null}))]);

    name.set_value("Carl".into());
    assert_eq!(drain(&log), vec![value_event(json!({"name": "Carl"}))]);

    let address = FieldGroup::new(&form, "address", RecordComposer);
    Field::new(&address, "street");
    assert_eq!(
        drain(&log),
        vec![
            value_event(json!({"name": "Carl", "address": {}})),
            value_event(json!({"name": "Carl", "address": {"street": null}})),
        ]
    );
}

#[test]
fn set_value_publishes_once() {
    let (log, subscriber) = event_recorder();
    let form = Form::builder()
        .subscriber(subscriber)
        .validation_trigger(None)
        .build();

    form.set_value(value(json!({"name": "Carl"})));

    assert_eq!(drain(&log), vec![value_event(json!({"name": "Carl"}))]);
}

#[test]
fn null_form_stays_silent_on_attach() {
    let (log, subscriber) = event_recorder();
    let form = Form::builder()
        .initial(Value::Null)
        .subscriber(subscriber)
        .validation_trigger(None)
        .build();

    Field::new(&form, "name");

    assert!(drain(&log).is_empty());
}

#[test]
fn validation_publishes_every_pass() {
    let (log, subscriber) = event_recorder();
    let form = Form::builder()
        .subscriber(subscriber)
        .validation_trigger(None)
        .build();

    form.handle_validation(&[error(".", "incomplete")]);
    form.handle_validation(&[error(".", "incomplete")]);
    assert_eq!(
        drain(&log),
        vec![
            error_event(vec![error(".", "incomplete")]),
            error_event(vec![error(".", "incomplete")]),
        ]
    );

    form.handle_validation(&[]);
    form.handle_validation(&[]);
    assert_eq!(drain(&log), vec![error_event(vec![]), error_event(vec![])]);
}

#[test]
fn manual_error_changes_always_publish() {
    let (log, subscriber) = event_recorder();
    let form = Form::builder()
        .subscriber(subscriber)
        .validation_trigger(None)
        .build();

    form.set_errors(vec![error(".", "first")]);
    form.append_errors(&[error(".", "second")]);
    form.clear_errors(Default::default());

    assert_eq!(
        drain(&log),
        vec![
            error_event(vec![error(".", "first")]),
            error_event(vec![error(".", "first"), error(".", "second")]),
            error_event(vec![]),
        ]
    );
}
