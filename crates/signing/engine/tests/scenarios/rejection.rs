//! Rejection by a mandatory signer is immediate and final.

use crate::common::*;
use signing_engine::SigningError;
use signing_types::*;

#[tokio::test]
async fn mid_process_rejection_is_terminal() {
    let (_, engine) = engine();
    let id = start(&engine, SigningMode::Sequential, mandatory(&["s1", "s2", "s3"])).await;
    let mut events = engine.subscribe();
    sign(&engine, &id, 1, "s1").await.unwrap();

    let status = engine
        .reject_slot(&id, &slot(2), "liability clause unacceptable")
        .await
        .unwrap();
    assert_eq!(status, ProcessStatus::Rejected);

    let err = sign(&engine, &id, 3, "s3").await.unwrap_err();
    assert!(matches!(
        err,
        SigningError::ProcessTerminal { ref process_id, status: ProcessStatus::Rejected } if process_id == &id
    ));

    let event = events.recv().await.unwrap();
    assert_eq!(event.old_status, ProcessStatus::InProgress);
    assert_eq!(event.new_status, ProcessStatus::Rejected);

    let slots = engine.get_slots(&id).await.unwrap();
    assert_eq!(slots[1].status, SlotStatus::Rejected);
    assert_eq!(slots[1].rejection_reason.as_deref(), Some("liability clause unacceptable"));
}

#[tokio::test]
async fn rejection_allowed_out_of_turn() {
    let (_, engine) = engine();
    let id = start(&engine, SigningMode::Sequential, mandatory(&["s1", "s2", "s3"])).await;

    let status = engine.reject_slot(&id, &slot(3), "not my contract").await.unwrap();
    assert_eq!(status, ProcessStatus::Rejected);
}

#[tokio::test]
async fn terminal_process_refuses_rejection_too() {
    let (_, engine) = engine();
    let id = start(&engine, SigningMode::Parallel, mandatory(&["s1", "s2"])).await;
    engine.reject_slot(&id, &slot(1), "no").await.unwrap();

    let err = engine.reject_slot(&id, &slot(2), "also no").await.unwrap_err();
    assert!(matches!(err, SigningError::ProcessTerminal { .. }));
}

#[tokio::test]
async fn committed_slot_cannot_be_rejected() {
    let (_, engine) = engine();
    let id = start(&engine, SigningMode::Parallel, mandatory(&["s1", "s2"])).await;
    sign(&engine, &id, 1, "s1").await.unwrap();

    let err = engine.reject_slot(&id, &slot(1), "changed my mind").await.unwrap_err();
    assert!(matches!(err, SigningError::InvalidSlotState { .. }));
    assert_eq!(engine.get_process(&id).await.unwrap().status, ProcessStatus::InProgress);
}
