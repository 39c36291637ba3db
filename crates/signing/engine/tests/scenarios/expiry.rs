//! Expiry is pull-based and only applies to InProgress processes.

use crate::common::*;
use chrono::Duration;
use signing_types::*;

#[tokio::test]
async fn overdue_process_expires() {
    let (_, engine) = engine();
    let id = start(&engine, SigningMode::Sequential, mandatory(&["s1", "s2"])).await;
    let due = engine.get_process(&id).await.unwrap().due_at;

    assert_eq!(
        engine.evaluate_expiry(&id, due).await.unwrap(),
        ProcessStatus::InProgress
    );
    assert_eq!(
        engine
            .evaluate_expiry(&id, due + Duration::seconds(1))
            .await
            .unwrap(),
        ProcessStatus::Expired
    );

    let err = sign(&engine, &id, 1, "s1").await.unwrap_err();
    assert!(matches!(
        err,
        signing_engine::SigningError::ProcessTerminal { status: ProcessStatus::Expired, .. }
    ));
}

#[tokio::test]
async fn completed_and_rejected_are_immune() {
    let (_, engine) = engine();
    let done = start(&engine, SigningMode::Parallel, mandatory(&["s1"])).await;
    sign(&engine, &done, 1, "s1").await.unwrap();

    let refused = start_with(
        &engine,
        contract(b"%PDF second"),
        SigningMode::Parallel,
        mandatory(&["s1"]),
    )
    .await;
    engine.reject_slot(&refused, &slot(1), "no").await.unwrap();

    let far_future = chrono::Utc::now() + Duration::days(365);
    assert_eq!(
        engine.evaluate_expiry(&done, far_future).await.unwrap(),
        ProcessStatus::Completed
    );
    assert_eq!(
        engine.evaluate_expiry(&refused, far_future).await.unwrap(),
        ProcessStatus::Rejected
    );
    assert!(engine.sweep_expired(far_future).await.unwrap().is_empty());
}
