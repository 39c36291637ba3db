//! Parallel signers racing: completion is evaluated exactly once.

use crate::common::*;
use signing_engine::{CommitRequest, SigningError};
use signing_types::*;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_commits_complete_once() {
    let (_, engine) = engine();
    let engine = Arc::new(engine);
    let id = start(&engine, SigningMode::Parallel, mandatory(&["p1", "p2"])).await;
    let mut events = engine.subscribe();

    let a = {
        let (engine, id) = (engine.clone(), id.clone());
        tokio::spawn(async move { sign(&engine, &id, 1, "p1").await })
    };
    let b = {
        let (engine, id) = (engine.clone(), id.clone());
        tokio::spawn(async move { sign(&engine, &id, 2, "p2").await })
    };
    let results = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];

    let completions = results
        .iter()
        .filter(|r| r.status == ProcessStatus::Completed)
        .count();
    assert_eq!(completions, 1);

    let process = engine.get_process(&id).await.unwrap();
    assert_eq!(process.status, ProcessStatus::Completed);
    assert_eq!(process.commit_count, 2);

    let event = events.recv().await.unwrap();
    assert_eq!(event.new_status, ProcessStatus::Completed);
    assert!(events.try_recv().is_err());

    let trail = engine.audit_trail(&id).await.unwrap();
    let completed = trail
        .iter()
        .filter(|e| e.kind == AuditEventKind::ProcessCompleted)
        .count();
    assert_eq!(completed, 1);
    assert!(engine.verify(&id).await.unwrap().verified);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_on_one_slot_has_one_winner() {
    let (_, engine) = engine();
    let engine = Arc::new(engine);
    let id = start(&engine, SigningMode::Parallel, mandatory(&["p1", "p2"])).await;

    let attempts: Vec<_> = (0..8)
        .map(|i| {
            let (engine, id) = (engine.clone(), id.clone());
            tokio::spawn(async move {
                engine
                    .commit_slot(
                        &id,
                        &slot(1),
                        CommitRequest::new("p1", signature(i)).with_idempotency_key(format!("req-{i}")),
                    )
                    .await
            })
        })
        .collect();

    let mut wins = 0;
    for attempt in futures::future::join_all(attempts).await {
        match attempt.unwrap() {
            Ok(_) => wins += 1,
            Err(SigningError::DuplicateCommit { replay, .. }) => assert!(!replay),
            Err(other) => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(engine.get_status(&id).await.unwrap().progress.committed_mandatory, 1);
}

#[tokio::test]
async fn commit_order_does_not_change_composite() {
    let (_, left) = engine();
    let (_, right) = engine();
    let a = start(&left, SigningMode::Parallel, mandatory(&["p1", "p2", "p3"])).await;
    let b = start(&right, SigningMode::Parallel, mandatory(&["p1", "p2", "p3"])).await;

    for (n, who) in [(1, "p1"), (2, "p2"), (3, "p3")] {
        sign(&left, &a, n, who).await.unwrap();
    }
    for (n, who) in [(3, "p3"), (1, "p1"), (2, "p2")] {
        sign(&right, &b, n, who).await.unwrap();
    }

    let left = left.get_process(&a).await.unwrap();
    let right = right.get_process(&b).await.unwrap();
    assert!(left.composite_hash.is_some());
    assert_eq!(left.composite_hash, right.composite_hash);
}
