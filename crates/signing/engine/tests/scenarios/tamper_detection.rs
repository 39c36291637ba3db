//! Verification after sealing: any change to stored evidence is found.

use crate::common::*;
use signing_engine::SigningError;
use signing_types::*;

async fn sealed_process() -> (
    std::sync::Arc<signing_storage::memory::InMemorySigningStorage>,
    signing_engine::SigningEngine,
    ProcessId,
) {
    let (storage, engine) = engine();
    let id = start(&engine, SigningMode::Sequential, mandatory(&["s1", "s2"])).await;
    sign(&engine, &id, 1, "s1").await.unwrap();
    sign(&engine, &id, 2, "s2").await.unwrap();
    (storage, engine, id)
}

#[tokio::test]
async fn completed_process_verifies() {
    let (_, engine, id) = sealed_process().await;
    let result = engine.verify(&id).await.unwrap();
    assert!(result.verified);
    assert!(result.sealed);
    assert!(result.mismatch_at.is_none());
}

#[tokio::test]
async fn flipped_document_byte_points_at_document() {
    let (storage, engine, id) = sealed_process().await;
    let process = engine.get_process(&id).await.unwrap();
    let mut content = engine.get_document(&process.document_id).await.unwrap().content;
    content[3] ^= 0x01;
    storage
        .overwrite_document_content(&process.document_id, content)
        .unwrap();

    let result = engine.verify(&id).await.unwrap();
    assert!(!result.verified);
    assert_eq!(
        result.mismatch_at,
        Some(MismatchLocation::Document {
            document_id: process.document_id.clone()
        })
    );
    assert_ne!(result.recomputed_hash, result.expected_hash);

    // Verification never mutates the process
    assert_eq!(engine.get_process(&id).await.unwrap(), process);
}

#[tokio::test]
async fn replaced_artifact_points_at_its_slot() {
    let (storage, engine, id) = sealed_process().await;
    let first = engine.get_slots(&id).await.unwrap().remove(0);
    let artifact_id = first.committed_artifact_id.clone().unwrap();
    let mut record = signing_storage::ArtifactStore::get_artifact(storage.as_ref(), &artifact_id)
        .await
        .unwrap()
        .unwrap();
    if let Artifact::Signature(ref mut sig) = record.artifact {
        sig.points[0].x += 1.0;
    }
    storage.overwrite_artifact(&artifact_id, record.artifact).unwrap();

    let result = engine.verify(&id).await.unwrap();
    assert!(!result.verified);
    assert_eq!(
        result.mismatch_at,
        Some(MismatchLocation::Slot {
            slot_id: slot(1),
            sequence_number: 1
        })
    );
}

#[tokio::test]
async fn verify_unknown_process_is_an_error() {
    let (_, engine) = engine();
    let err = engine.verify(&ProcessId::new("proc-missing")).await.unwrap_err();
    assert!(matches!(err, SigningError::ProcessNotFound(_)));
}
