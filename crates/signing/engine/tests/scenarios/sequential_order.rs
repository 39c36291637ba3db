//! Three sequential signers: order is enforced slot by slot.

use crate::common::*;
use signing_engine::SigningError;
use signing_types::*;

#[tokio::test]
async fn first_commit_reports_one_of_three() {
    let (_, engine) = engine();
    let id = start(&engine, SigningMode::Sequential, mandatory(&["s1", "s2", "s3"])).await;

    let result = sign(&engine, &id, 1, "s1").await.unwrap();
    assert_eq!(format!("{}", result.progress), "1/3");
    assert_eq!(result.status, ProcessStatus::InProgress);

    let view = engine.get_status(&id).await.unwrap();
    assert_eq!(view.status, ProcessStatus::InProgress);
    assert_eq!(view.eligible_slots.len(), 1);
    assert_eq!(view.eligible_slots[0].id, slot(2));
}

#[tokio::test]
async fn signer_three_cannot_jump_ahead() {
    let (_, engine) = engine();
    let id = start(&engine, SigningMode::Sequential, mandatory(&["s1", "s2", "s3"])).await;
    sign(&engine, &id, 1, "s1").await.unwrap();

    let err = sign(&engine, &id, 3, "s3").await.unwrap_err();
    match err {
        SigningError::InvalidSlotState {
            process_id,
            slot_id,
            reason,
        } => {
            assert_eq!(process_id, id);
            assert_eq!(slot_id, slot(3));
            assert!(reason.contains("slot-2"), "reason was {reason}");
        }
        other => panic!("expected InvalidSlotState, got {other:?}"),
    }

    // No mutation
    let slots = engine.get_slots(&id).await.unwrap();
    assert!(slots[2].is_pending());
    assert_eq!(engine.get_status(&id).await.unwrap().progress.committed_mandatory, 1);
}

#[tokio::test]
async fn completes_in_order_and_seals() {
    let (_, engine) = engine();
    let id = start(&engine, SigningMode::Sequential, mandatory(&["s1", "s2", "s3"])).await;
    sign(&engine, &id, 1, "s1").await.unwrap();
    sign(&engine, &id, 2, "s2").await.unwrap();
    let last = sign(&engine, &id, 3, "s3").await.unwrap();

    assert_eq!(last.status, ProcessStatus::Completed);
    let process = engine.get_process(&id).await.unwrap();
    assert_eq!(process.composite_hash, Some(last.chain_head));
    assert!(engine.get_status(&id).await.unwrap().eligible_slots.is_empty());

    let again = sign(&engine, &id, 3, "s3").await.unwrap_err();
    assert!(matches!(again, SigningError::ProcessTerminal { status: ProcessStatus::Completed, .. }));
}

#[tokio::test]
async fn unknown_slot_is_named() {
    let (_, engine) = engine();
    let id = start(&engine, SigningMode::Sequential, mandatory(&["s1"])).await;
    let err = sign(&engine, &id, 9, "s1").await.unwrap_err();
    assert!(matches!(err, SigningError::SlotNotFound { ref slot_id, .. } if slot_id == &slot(9)));
}
