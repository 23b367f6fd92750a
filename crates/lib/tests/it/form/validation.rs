use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use formtree::{
    Error, ErrorScope, Field, FieldError, Form, FormError, Node, Result, ValidationTrigger, Value,
};
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn value_trigger_validates_every_change() {
    let validator = RecordingValidator::new();
    let tree = address_form(Form::builder().validator(validator.clone()));
    settle().await;

    assert_eq!(
        validator.history(),
        vec![
            value(json!({"name": null})),
            value(json!({"name": null, "address": {}})),
            value(json!({"name": null, "address": {"street": null}})),
            value(json!({"name": null, "address": {"street": null, "state": null}})),
        ]
    );

    tree.street.set_value("Main St".into());
    tree.state.set_value("TX".into());
    settle().await;

    assert_eq!(
        validator.history()[4..],
        [
            value(json!({"name": null, "address": {"street": "Main St", "state": null}})),
            value(json!({"name": null, "address": {"street": "Main St", "state": "TX"}})),
        ]
    );
}

#[tokio::test]
async fn detach_and_set_value_trigger_validation() {
    let validator = RecordingValidator::new();
    let tree = address_form(Form::builder().validator(validator.clone()));
    settle().await;
    let before = validator.calls();

    tree.state.dispose();
    tree.form.set_value(value(json!({"name": "Carl"})));
    settle().await;

    assert_eq!(validator.calls(), before + 2);
    assert_eq!(
        validator.history()[before],
        value(json!({"name": null, "address": {"street": null}}))
    );
}

#[tokio::test]
async fn results_are_routed_into_the_tree() {
    let validator = RecordingValidator::answering(vec![
        error("name", "required"),
        error("address.state", "unknown state"),
    ]);
    let tree = address_form(Form::builder().validator(validator));
    settle().await;

    assert_eq!(
        tree.name.get_errors(ErrorScope::Current),
        vec![error("name", "required")]
    );
    assert_eq!(
        tree.state.get_errors(ErrorScope::Current),
        vec![error("address.state", "unknown state")]
    );
    assert!(tree.street.is_valid(ErrorScope::Current));
    assert_eq!(tree.form.get_errors(ErrorScope::Group).len(), 2);
}

#[tokio::test]
async fn focus_trigger_ignores_value_changes() {
    let validator = RecordingValidator::new();
    let tree = address_form(
        Form::builder()
            .validation_trigger(Some(ValidationTrigger::Focus))
            .validator(validator.clone()),
    );

    tree.name.set_value("Carl".into());
    settle().await;
    assert_eq!(validator.calls(), 0);

    tree.street.handle_focus();
    tree.street.handle_blur();
    settle().await;
    assert_eq!(
        validator.history(),
        vec![value(json!({
            "name": "Carl",
            "address": {"street": null, "state": null}
        }))]
    );
}

#[tokio::test]
async fn blur_trigger_validates_on_blur_only() {
    let validator = RecordingValidator::new();
    let tree = address_form(
        Form::builder()
            .validation_trigger(Some(ValidationTrigger::Blur))
            .validator(validator.clone()),
    );

    tree.name.handle_focus();
    tree.name.set_value("Carl".into());
    settle().await;
    assert_eq!(validator.calls(), 0);

    tree.name.handle_blur();
    tree.form.handle_blur();
    settle().await;
    assert_eq!(validator.calls(), 2);
}

#[tokio::test]
async fn no_trigger_disables_validation() {
    let validator = RecordingValidator::new();
    let tree = address_form(
        Form::builder()
            .validation_trigger(None)
            .validator(validator.clone()),
    );

    tree.name.set_value("Carl".into());
    tree.name.handle_focus();
    tree.name.handle_blur();
    settle().await;

    assert_eq!(validator.calls(), 0);
    assert_eq!(tree.form.validation_trigger(), None);
}

#[tokio::test]
async fn rejection_leaves_errors_untouched() {
    let (rejections, hook) = rejection_recorder();
    let tree = address_form(
        Form::builder()
            .validation_trigger(Some(ValidationTrigger::Blur))
            .validate(|_value: Value| rejecting("offline"))
            .validate_rejection(hook),
    );
    tree.name.set_errors(vec![error("name", "stale")]);

    tree.name.handle_blur();
    settle().await;

    assert_eq!(
        *rejections.lock().unwrap(),
        vec!["Collaborator rejected the form value: offline".to_string()]
    );
    assert_eq!(
        tree.name.get_errors(ErrorScope::Current),
        vec![error("name", "stale")]
    );
}

/// Answers late for the value "slow" and immediately otherwise.
async fn slow_or_fast(value: Value) -> Result<Vec<FieldError>> {
    if value.pointer("name") == Some(&Value::from("slow")) {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(vec![error("name", "slow pass")])
    } else {
        Ok(vec![error("name", "fast pass")])
    }
}

#[tokio::test]
async fn last_resolved_pass_wins() {
    let form = Form::builder().validate(slow_or_fast).build();
    let name = Field::new(&form, "name");

    name.set_value("slow".into());
    name.set_value("fast".into());
    tokio::time::sleep(Duration::from_millis(100)).await;

    // the earlier, slower pass resolved last
    assert_eq!(
        name.get_errors(ErrorScope::Current),
        vec![error("name", "slow pass")]
    );
}

#[tokio::test]
async fn validate_runs_inline() {
    let validator = RecordingValidator::answering(vec![error("name", "required")]);
    let tree = address_form(
        Form::builder()
            .validation_trigger(None)
            .validator(validator.clone()),
    );

    let errors = tree.form.validate().await.unwrap();

    assert_eq!(errors, vec![error("name", "required")]);
    assert!(!tree.name.is_valid(ErrorScope::Current));
    assert_eq!(validator.calls(), 1);
}

#[tokio::test]
async fn validate_without_validator_fails() {
    let form = Form::builder().build();

    let err = form.validate().await.unwrap_err();

    assert!(matches!(err, Error::Form(FormError::MissingValidator)));
    assert!(matches!(&err, Error::Form(inner) if inner.is_missing_validator()));
    assert!(!err.is_task_failure());
    assert_eq!(err.module(), "form");
}

#[tokio::test]
async fn validate_returns_rejections_to_the_caller() {
    let (rejections, hook) = rejection_recorder();
    let form = Form::builder()
        .validation_trigger(None)
        .validate(|_value: Value| rejecting("offline"))
        .validate_rejection(hook)
        .build();

    let err = form.validate().await.unwrap_err();

    assert!(err.is_rejection());
    assert!(rejections.lock().unwrap().is_empty());
}

#[test]
fn dispatch_without_runtime_reports_task_failure() {
    let failures: Arc<Mutex<Vec<Error>>> = Arc::default();
    let sink = failures.clone();
    let form = Form::builder()
        .validator(RecordingValidator::new())
        .validate_rejection(move |err| sink.lock().unwrap().push(err))
        .build();

    Field::new(&form, "name");

    let failures = failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].is_task_failure());
    assert!(!failures[0].is_rejection());
    assert!(failures[0].to_string().starts_with("Form task failed"));
}

#[tokio::test]
async fn dropped_form_ignores_late_results() {
    let validator = RecordingValidator::answering(vec![error("name", "late")]);
    let tree = address_form(Form::builder().validator(validator.clone()));
    drop(tree);

    settle().await;

    assert_eq!(validator.calls(), 4);
}
