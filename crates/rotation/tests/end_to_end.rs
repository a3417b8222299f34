//! Full rotations driven through the dispatcher

mod common;

use common::{CURRENT_VALUE, RecordingTarget, rotating_store, sid, vid};
use pretty_assertions::assert_eq;
use stagehand_rotation::config::{ConfigError, DEFAULT_EXCLUDE_CHARACTERS};
use stagehand_rotation::prelude::*;
use stagehand_rotation::rotation::{CreateOutcome, FinishOutcome};

#[tokio::test]
async fn test_full_rotation_of_db_password() {
    // GIVEN: db-pwd with v1 = "old123" CURRENT and v2 staged PENDING
    let store = rotating_store();
    let handler = RotationHandler::new(store.clone(), RecordingTarget::default());
    let event = |step: &str| RotationEvent::new(common::SECRET, "v2", step);

    // WHEN: createSecret runs, twice
    let created = handler.handle(event("createSecret")).await.unwrap();
    let pending = store.value_of(&sid(), &vid("v2")).unwrap();
    let again = handler.handle(event("createSecret")).await.unwrap();

    // THEN: v2 holds a fresh value and the redelivery changed nothing
    assert_eq!(created, StepOutcome::Created(CreateOutcome::Created));
    assert_eq!(again, StepOutcome::Created(CreateOutcome::AlreadyExists));
    assert_ne!(pending, CURRENT_VALUE);
    assert_eq!(store.value_of(&sid(), &vid("v2")).unwrap(), pending);

    // WHEN: setSecret and testSecret run
    assert_eq!(handler.handle(event("setSecret")).await.unwrap(), StepOutcome::Set);
    assert_eq!(handler.handle(event("testSecret")).await.unwrap(), StepOutcome::Tested);

    // THEN: The target saw the pending value, not the current one
    assert_eq!(*handler_target_applied(&handler), vec![pending.clone()]);

    // WHEN: finishSecret runs
    let finished = handler.handle(event("finishSecret")).await.unwrap();

    // THEN: v2 is CURRENT, v1 is demoted
    assert_eq!(
        finished,
        StepOutcome::Finished(FinishOutcome::Promoted {
            previous: Some(vid("v1"))
        })
    );
    let stages = store.version_stages(&sid()).unwrap();
    assert!(stages[&vid("v2")].contains(&Stage::Current));
    assert!(!stages[&vid("v1")].contains(&Stage::Current));
    assert!(stages[&vid("v1")].contains(&Stage::Previous));

    // WHEN: finishSecret is redelivered
    let err = handler.handle(event("finishSecret")).await.unwrap_err();

    // THEN: The gate reports the rotation as already complete
    assert!(err.is_already_complete());
}

fn handler_target_applied(
    handler: &RotationHandler<MemorySecretStore, RecordingTarget>,
) -> parking_lot::MutexGuard<'_, Vec<String>> {
    handler.target().applied.lock()
}

#[tokio::test]
async fn test_json_payload_is_dispatched() {
    let store = rotating_store();
    let handler = RotationHandler::new(store.clone(), RecordingTarget::default());

    let outcome = handler
        .handle_json(r#"{"ClientRequestToken":"v2","SecretId":"db-pwd","Step":"createSecret"}"#)
        .await
        .unwrap();

    assert_eq!(outcome, StepOutcome::Created(CreateOutcome::Created));
    assert!(store.value_of(&sid(), &vid("v2")).is_some());
}

#[tokio::test]
async fn test_malformed_json_is_rejected_before_any_store_call() {
    let store = rotating_store();
    let handler = RotationHandler::new(store.clone(), RecordingTarget::default());

    for payload in ["not json", r#"{"SecretId":"db-pwd","Step":"createSecret"}"#] {
        let err = handler.handle_json(payload).await.unwrap_err();
        assert!(matches!(err, RotationError::MalformedEvent(_)), "{payload}: {err}");
    }
    assert_eq!(store.metrics().total_count(), 0);
}

#[tokio::test]
async fn test_unimplemented_target_fails_set_and_test() {
    let store = rotating_store();
    let handler = RotationHandler::new(store.clone(), UnimplementedTarget);

    handler
        .handle(RotationEvent::new(common::SECRET, "v2", "createSecret"))
        .await
        .unwrap();

    for (step, expected) in [("setSecret", "setSecret"), ("testSecret", "testSecret")] {
        let err = handler
            .handle(RotationEvent::new(common::SECRET, "v2", step))
            .await
            .unwrap_err();
        assert!(
            matches!(err, RotationError::NotImplemented { step, .. } if step == expected),
            "{err}"
        );
    }
}

#[tokio::test]
async fn test_rejected_test_keeps_current_in_place() {
    // GIVEN: A target whose login check refuses the pending value
    let store = rotating_store();
    let handler = RotationHandler::new(store.clone(), RecordingTarget::rejecting());
    let event = |step: &str| RotationEvent::new(common::SECRET, "v2", step);

    handler.handle(event("createSecret")).await.unwrap();
    handler.handle(event("setSecret")).await.unwrap();

    // WHEN: testSecret runs
    let err = handler.handle(event("testSecret")).await.unwrap_err();

    // THEN: The failure surfaces and v1 stays CURRENT
    assert!(matches!(
        err,
        RotationError::TargetFailed {
            step: "testSecret",
            ..
        }
    ));
    assert_eq!(
        store.version_stages(&sid()).unwrap()[&vid("v1")],
        vec![Stage::Current]
    );
}

#[tokio::test]
async fn test_set_before_create_fails() {
    // GIVEN: v2 is staged PENDING but has no value yet
    let store = rotating_store();
    let handler = RotationHandler::new(store.clone(), RecordingTarget::default());

    // WHEN: setSecret arrives out of order
    let err = handler
        .handle(RotationEvent::new(common::SECRET, "v2", "setSecret"))
        .await
        .unwrap_err();

    // THEN: The missing pending value is an error, nothing was applied
    assert!(matches!(err, RotationError::Store { ref source, .. } if source.is_not_found()));
    assert!(handler.target().applied.lock().is_empty());
}

#[tokio::test]
async fn test_configured_policy_reaches_create() {
    let store = rotating_store();
    let config = RotationConfig::from_lookup(|key| match key {
        "STAGEHAND_PASSWORD_LENGTH" => Some("16".to_string()),
        _ => None,
    })
    .unwrap();
    let handler = RotationHandler::new(store.clone(), RecordingTarget::default())
        .with_config(config)
        .unwrap();

    handler
        .handle(RotationEvent::new(common::SECRET, "v2", "createSecret"))
        .await
        .unwrap();

    assert_eq!(store.value_of(&sid(), &vid("v2")).unwrap().len(), 16);
}

#[test]
fn test_invalid_config_is_refused() {
    let store = std::sync::Arc::new(MemorySecretStore::new());
    let config = RotationConfig {
        password: PasswordPolicy {
            length: 0,
            ..PasswordPolicy::default()
        },
    };

    let err = RotationHandler::new(store, UnimplementedTarget)
        .with_config(config)
        .unwrap_err();

    assert!(matches!(
        err,
        RotationError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[tokio::test]
async fn test_empty_exclusion_override_keeps_fixed_set_out() {
    // GIVEN: A configuration that clears the extra exclusions
    let store = rotating_store();
    let config = RotationConfig::from_lookup(|key| match key {
        "STAGEHAND_PASSWORD_LENGTH" => Some("4096".to_string()),
        "STAGEHAND_EXCLUDE_CHARACTERS" => Some(String::new()),
        _ => None,
    })
    .unwrap();
    let handler = RotationHandler::new(store.clone(), RecordingTarget::default())
        .with_config(config)
        .unwrap();

    // WHEN: createSecret generates a long value
    handler
        .handle(RotationEvent::new(common::SECRET, "v2", "createSecret"))
        .await
        .unwrap();

    // THEN: None of the connection-string breaking characters appear
    let value = store.value_of(&sid(), &vid("v2")).unwrap();
    assert_eq!(value.chars().count(), 4096);
    let forbidden: Vec<char> = value
        .chars()
        .filter(|c| DEFAULT_EXCLUDE_CHARACTERS.contains(*c))
        .collect();
    assert!(forbidden.is_empty(), "{forbidden:?}");
}
