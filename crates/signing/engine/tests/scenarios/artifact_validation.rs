//! Invalid artifacts are refused without touching the slot.

use crate::common::*;
use signing_engine::{CommitRequest, SigningError};
use signing_types::*;

#[tokio::test]
async fn zero_stroke_points_is_empty_artifact() {
    let (storage, engine) = engine();
    let id = start(&engine, SigningMode::Parallel, mandatory(&["s1"])).await;
    let before = signing_storage::AuditStore::list_audit(storage.as_ref(), &id)
        .await
        .unwrap()
        .len();

    let empty = ArtifactCandidate::Signature(SignatureCandidate {
        points: vec![],
        surface: CaptureSurface::unscaled(600.0, 200.0),
        stroke_width: 2,
        stroke_color: "#000000".to_string(),
        raster_image: RasterImage::new("image/png", vec![1u8; 16]),
    });
    let err = engine
        .commit_slot(&id, &slot(1), CommitRequest::new("s1", empty))
        .await
        .unwrap_err();
    assert!(matches!(err, SigningError::Validation(ValidationError::EmptyArtifact(_))));

    let slots = engine.get_slots(&id).await.unwrap();
    assert!(slots[0].is_pending());
    assert!(slots[0].committed_artifact_id.is_none());
    assert_eq!(engine.get_process(&id).await.unwrap().commit_count, 0);
    let after = signing_storage::AuditStore::list_audit(storage.as_ref(), &id)
        .await
        .unwrap()
        .len();
    assert_eq!(before, after);
}

#[tokio::test]
async fn six_mib_seal_is_too_large() {
    let (_, engine) = engine();
    let id = start(&engine, SigningMode::Parallel, mandatory(&["s1"])).await;

    let err = engine
        .commit_slot(&id, &slot(1), CommitRequest::new("s1", uploaded_seal("image/png", 6 * MIB)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SigningError::Validation(ValidationError::PayloadTooLarge { size, .. }) if size == 6 * MIB
    ));
}

#[tokio::test]
async fn four_mib_seal_with_wrong_type_is_unsupported() {
    let (_, engine) = engine();
    let id = start(&engine, SigningMode::Parallel, mandatory(&["s1"])).await;

    let err = engine
        .commit_slot(&id, &slot(1), CommitRequest::new("s1", uploaded_seal("application/zip", 4 * MIB)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SigningError::Validation(ValidationError::UnsupportedMediaType { .. })
    ));
    assert!(engine.get_slots(&id).await.unwrap()[0].is_pending());
}

#[tokio::test]
async fn valid_seal_commits_after_refusal() {
    let (_, engine) = engine();
    let id = start(&engine, SigningMode::Parallel, mandatory(&["s1"])).await;
    engine
        .commit_slot(&id, &slot(1), CommitRequest::new("s1", uploaded_seal("image/png", 6 * MIB)))
        .await
        .unwrap_err();

    let ok = engine
        .commit_slot(&id, &slot(1), CommitRequest::new("s1", uploaded_seal("image/png", 4 * MIB)))
        .await
        .unwrap();
    assert_eq!(ok.status, ProcessStatus::Completed);
}

#[tokio::test]
async fn unsupported_source_document_refused() {
    let (_, engine) = engine();
    let result = engine
        .create_process(
            DocumentInput::upload("notes.txt", "text/plain", b"hello".to_vec()),
            mandatory(&["s1"]),
            SigningMode::Parallel,
            chrono::Utc::now() + chrono::Duration::days(1),
            ProcessMetadata::new("initiator"),
        )
        .await;
    assert!(matches!(
        result,
        Err(SigningError::Validation(ValidationError::UnsupportedMediaType { .. }))
    ));
    assert!(engine
        .list_processes(&ProcessFilter::default())
        .await
        .unwrap()
        .is_empty());
}
