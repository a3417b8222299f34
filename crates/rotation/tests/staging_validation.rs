//! Integration tests for the staging gate
//!
//! The gate runs before every step, so each property is checked for all four
//! step names and must leave the store untouched.

mod common;

use common::{RecordingTarget, rotating_store, seeded_store, sid, vid};
use rstest::rstest;
use stagehand_rotation::prelude::*;
use stagehand_rotation::rotation::check_staging;

const STEPS: [&str; 4] = ["createSecret", "setSecret", "testSecret", "finishSecret"];

fn handler(store: std::sync::Arc<MemorySecretStore>) -> RotationHandler<MemorySecretStore, RecordingTarget> {
    RotationHandler::new(store, RecordingTarget::default())
}

#[rstest]
#[case::create("createSecret")]
#[case::set("setSecret")]
#[case::test("testSecret")]
#[case::finish("finishSecret")]
#[tokio::test]
async fn test_rotation_disabled_rejects_every_step(#[case] step: &str) {
    // GIVEN: A rotating secret whose rotation flag is off
    let store = rotating_store();
    store.set_rotation_enabled(&sid(), false).unwrap();
    let handler = handler(store.clone());

    // WHEN: Any step is invoked
    let err = handler
        .handle(RotationEvent::new(common::SECRET, "v2", step))
        .await
        .unwrap_err();

    // THEN: It fails with RotationNotEnabled and nothing was written
    assert!(matches!(err, RotationError::RotationNotEnabled { .. }));
    assert_eq!(store.metrics().mutation_count(), 0);
    assert_eq!(store.metrics().total_count(), 1);
}

#[rstest]
#[case::create("createSecret")]
#[case::set("setSecret")]
#[case::test("testSecret")]
#[case::finish("finishSecret")]
#[tokio::test]
async fn test_unknown_version_rejected(#[case] step: &str) {
    let store = rotating_store();
    let handler = handler(store.clone());

    let err = handler
        .handle(RotationEvent::new(common::SECRET, "v9", step))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RotationError::UnknownVersion { ref version, .. } if *version == vid("v9")
    ));
    assert_eq!(store.metrics().mutation_count(), 0);
    assert_eq!(store.metrics().total_count(), 1);
    assert!(handler.target().applied.lock().is_empty());
    assert!(handler.target().tested.lock().is_empty());
}

#[tokio::test]
async fn test_already_current_rejected_for_every_step() {
    let store = rotating_store();
    let handler = handler(store.clone());

    for step in STEPS {
        let err = handler
            .handle(RotationEvent::new(common::SECRET, "v1", step))
            .await
            .unwrap_err();

        assert!(err.is_already_complete(), "{step}: {err}");
    }
    assert_eq!(store.metrics().mutation_count(), 0);
}

#[tokio::test]
async fn test_current_and_pending_on_same_version_is_already_current() {
    // GIVEN: A token carrying both CURRENT and PENDING (state right after finishSecret)
    let store = seeded_store();
    store
        .put_version(&sid(), vid("v2"), "new456", vec![Stage::Pending, Stage::Current])
        .unwrap();

    // WHEN / THEN: CURRENT wins
    let err = check_staging(store.as_ref(), &sid(), &vid("v2"))
        .await
        .unwrap_err();
    assert!(matches!(err, RotationError::AlreadyCurrent { .. }));
}

#[tokio::test]
async fn test_version_without_current_or_pending_is_not_pending() {
    // GIVEN: v0 exists only with a custom label
    let store = seeded_store();
    store
        .put_version(&sid(), vid("v0"), "ancient", vec![Stage::Custom("archived".into())])
        .unwrap();
    let handler = handler(store.clone());

    for step in STEPS {
        let err = handler
            .handle(RotationEvent::new(common::SECRET, "v0", step))
            .await
            .unwrap_err();
        assert!(matches!(err, RotationError::NotPending { .. }), "{step}: {err}");
    }
    assert_eq!(store.metrics().mutation_count(), 0);
}

#[tokio::test]
async fn test_invalid_step_costs_only_the_describe_call() {
    // GIVEN: A correctly staged rotation
    let store = rotating_store();
    let handler = handler(store.clone());

    // WHEN: An unknown step name arrives
    let err = handler
        .handle(RotationEvent::new(common::SECRET, "v2", "rollbackSecret"))
        .await
        .unwrap_err();

    // THEN: InvalidStep, after exactly one describe-secret call
    assert!(matches!(err, RotationError::InvalidStep { ref step } if step == "rollbackSecret"));
    assert_eq!(store.metrics().count(StoreOperation::DescribeSecret), 1);
    assert_eq!(store.metrics().total_count(), 1);
}

#[tokio::test]
async fn test_staging_failure_wins_over_invalid_step() {
    let store = rotating_store();
    store.set_rotation_enabled(&sid(), false).unwrap();
    let handler = handler(store);

    let err = handler
        .handle(RotationEvent::new(common::SECRET, "v2", "rollbackSecret"))
        .await
        .unwrap_err();

    assert!(matches!(err, RotationError::RotationNotEnabled { .. }));
}

#[tokio::test]
async fn test_gate_runs_fresh_on_every_invocation() {
    // GIVEN: A handler that already validated v2 once
    let store = rotating_store();
    let handler = handler(store.clone());
    handler
        .handle(RotationEvent::new(common::SECRET, "v2", "createSecret"))
        .await
        .unwrap();

    // WHEN: Rotation is disabled between deliveries
    store.set_rotation_enabled(&sid(), false).unwrap();

    // THEN: The next delivery sees the new state
    let err = handler
        .handle(RotationEvent::new(common::SECRET, "v2", "createSecret"))
        .await
        .unwrap_err();
    assert!(matches!(err, RotationError::RotationNotEnabled { .. }));
}

#[tokio::test]
async fn test_describe_failure_aborts() {
    let store = rotating_store();
    store.inject_failure(
        StoreOperation::DescribeSecret,
        StoreError::Unavailable {
            operation: StoreOperation::DescribeSecret,
            reason: "connection reset".into(),
        },
    );

    let err = check_staging(store.as_ref(), &sid(), &vid("v2"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RotationError::Store {
            operation: StoreOperation::DescribeSecret,
            ..
        }
    ));
    assert!(!err.is_validation());
}

#[tokio::test]
async fn test_missing_secret_is_a_store_error() {
    let store = seeded_store();
    let other = SecretId::new("nope").unwrap();

    let err = check_staging(store.as_ref(), &other, &vid("v2"))
        .await
        .unwrap_err();

    assert!(matches!(err, RotationError::Store { ref source, .. } if source.is_not_found()));
}

#[tokio::test]
async fn test_malformed_identifiers_never_reach_the_store() {
    let store = rotating_store();
    let handler = handler(store.clone());

    let err = handler
        .handle(RotationEvent::new("", "v2", "createSecret"))
        .await
        .unwrap_err();

    assert!(matches!(err, RotationError::InvalidInvocation(_)));
    assert_eq!(store.metrics().total_count(), 0);
}
