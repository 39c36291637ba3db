//! A storage failure part way through an operation is finished by the next
//! operation on the process, so retries converge on the intended outcome.

use crate::common::*;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use signing_engine::{CommitRequest, EngineConfig, SigningEngine, SigningError};
use signing_storage::memory::InMemorySigningStorage;
use signing_storage::{
    ArtifactStore, AuditStore, DocumentStore, ProcessStore, QueryWindow, SlotStore, StorageError,
    StorageResult,
};
use signing_types::*;
use std::sync::{Arc, Mutex};

/// The one write that fails next.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Fault {
    AdvanceChain,
    Complete,
    Reject,
    Audit(AuditEventKind),
}

/// In-memory storage that fails one chosen write once.
#[derive(Default)]
struct OutageStorage {
    inner: InMemorySigningStorage,
    armed: Mutex<Option<Fault>>,
}

impl OutageStorage {
    fn arm(&self, fault: Fault) {
        *self.armed.lock().unwrap() = Some(fault);
    }

    fn trip(&self, fault: Fault) -> StorageResult<()> {
        let mut armed = self.armed.lock().unwrap();
        if *armed == Some(fault) {
            *armed = None;
            return Err(StorageError::Backend("transient outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for OutageStorage {
    async fn create_document(&self, document: Document) -> StorageResult<()> {
        self.inner.create_document(document).await
    }

    async fn get_document(&self, document_id: &DocumentId) -> StorageResult<Option<Document>> {
        self.inner.get_document(document_id).await
    }
}

#[async_trait]
impl ProcessStore for OutageStorage {
    async fn create_process(&self, process: SigningProcess) -> StorageResult<()> {
        self.inner.create_process(process).await
    }

    async fn get_process(&self, process_id: &ProcessId) -> StorageResult<Option<SigningProcess>> {
        self.inner.get_process(process_id).await
    }

    async fn transition_process(
        &self,
        process_id: &ProcessId,
        expected: ProcessStatus,
        update: ProcessUpdate,
    ) -> StorageResult<SigningProcess> {
        match update {
            ProcessUpdate::AdvanceChain { .. } => self.trip(Fault::AdvanceChain)?,
            ProcessUpdate::Complete { .. } => self.trip(Fault::Complete)?,
            ProcessUpdate::Reject { .. } => self.trip(Fault::Reject)?,
            _ => {}
        }
        self.inner.transition_process(process_id, expected, update).await
    }

    async fn list_processes(
        &self,
        filter: &ProcessFilter,
        window: QueryWindow,
    ) -> StorageResult<Vec<SigningProcess>> {
        self.inner.list_processes(filter, window).await
    }

    async fn open_process_for_document(
        &self,
        document_id: &DocumentId,
    ) -> StorageResult<Option<SigningProcess>> {
        self.inner.open_process_for_document(document_id).await
    }
}

#[async_trait]
impl SlotStore for OutageStorage {
    async fn insert_slot(&self, process_id: &ProcessId, slot: SignerSlot) -> StorageResult<()> {
        self.inner.insert_slot(process_id, slot).await
    }

    async fn list_slots(&self, process_id: &ProcessId) -> StorageResult<Vec<SignerSlot>> {
        self.inner.list_slots(process_id).await
    }

    async fn transition_slot(
        &self,
        process_id: &ProcessId,
        slot_id: &SlotId,
        expected: SlotStatus,
        transition: SlotTransition,
    ) -> StorageResult<SignerSlot> {
        self.inner
            .transition_slot(process_id, slot_id, expected, transition)
            .await
    }
}

#[async_trait]
impl ArtifactStore for OutageStorage {
    async fn commit_artifact(
        &self,
        record: ArtifactRecord,
        commit_index: u32,
        idempotency_key: Option<String>,
    ) -> StorageResult<SignerSlot> {
        self.inner
            .commit_artifact(record, commit_index, idempotency_key)
            .await
    }

    async fn get_artifact(
        &self,
        artifact_id: &ArtifactId,
    ) -> StorageResult<Option<ArtifactRecord>> {
        self.inner.get_artifact(artifact_id).await
    }
}

#[async_trait]
impl AuditStore for OutageStorage {
    async fn append_audit(&self, event: AuditAppend) -> StorageResult<AuditEvent> {
        self.trip(Fault::Audit(event.kind))?;
        self.inner.append_audit(event).await
    }

    async fn list_audit(&self, process_id: &ProcessId) -> StorageResult<Vec<AuditEvent>> {
        self.inner.list_audit(process_id).await
    }
}

fn outage_engine() -> (Arc<OutageStorage>, SigningEngine) {
    let storage = Arc::new(OutageStorage::default());
    let engine = SigningEngine::new(storage.clone(), EngineConfig::default());
    (storage, engine)
}

fn count(trail: &[AuditEvent], kind: AuditEventKind) -> usize {
    trail.iter().filter(|e| e.kind == kind).count()
}

#[tokio::test]
async fn retried_commit_finishes_interrupted_chain_advance() {
    let (storage, engine) = outage_engine();
    let id = start(&engine, SigningMode::Parallel, mandatory(&["s1"])).await;
    let request = CommitRequest::new("s1", signature(1)).with_idempotency_key("k1");

    storage.arm(Fault::AdvanceChain);
    let first = engine.commit_slot(&id, &slot(1), request.clone()).await.unwrap_err();
    assert!(first.is_retryable());

    let retry = engine.commit_slot(&id, &slot(1), request).await.unwrap_err();
    assert!(matches!(retry, SigningError::DuplicateCommit { replay: true, .. }));

    let process = engine.get_process(&id).await.unwrap();
    assert_eq!(process.status, ProcessStatus::Completed);
    assert_eq!(process.commit_count, 1);
    assert!(engine.verify(&id).await.unwrap().verified);

    let trail = engine.audit_trail(&id).await.unwrap();
    assert_eq!(count(&trail, AuditEventKind::SlotCommitted), 1);
    assert_eq!(count(&trail, AuditEventKind::ProcessCompleted), 1);
}

#[tokio::test]
async fn missing_commit_record_is_ledgered_before_next_commit() {
    let (storage, engine) = outage_engine();
    let id = start(&engine, SigningMode::Sequential, mandatory(&["s1", "s2"])).await;

    storage.arm(Fault::Audit(AuditEventKind::SlotCommitted));
    assert!(sign(&engine, &id, 1, "s1").await.unwrap_err().is_retryable());

    let done = sign(&engine, &id, 2, "s2").await.unwrap();
    assert_eq!(done.status, ProcessStatus::Completed);

    let trail = engine.audit_trail(&id).await.unwrap();
    let commits: Vec<Option<SlotId>> = trail
        .iter()
        .filter(|e| e.kind == AuditEventKind::SlotCommitted)
        .map(|e| e.slot_id.clone())
        .collect();
    assert_eq!(commits, vec![Some(slot(1)), Some(slot(2))]);
    assert!(engine.verify(&id).await.unwrap().verified);
}

#[tokio::test]
async fn interrupted_completion_is_sealed_on_next_touch() {
    let (storage, engine) = outage_engine();
    let id = start(&engine, SigningMode::Parallel, mandatory(&["s1"])).await;

    storage.arm(Fault::Complete);
    assert!(sign(&engine, &id, 1, "s1").await.unwrap_err().is_retryable());
    assert_eq!(
        engine.get_process(&id).await.unwrap().status,
        ProcessStatus::InProgress
    );

    let status = engine.evaluate_expiry(&id, Utc::now()).await.unwrap();
    assert_eq!(status, ProcessStatus::Completed);

    let result = engine.verify(&id).await.unwrap();
    assert!(result.verified);
    assert!(result.sealed);
}

#[tokio::test]
async fn retried_mandatory_rejection_closes_process() {
    let (storage, engine) = outage_engine();
    let id = start(&engine, SigningMode::Parallel, mandatory(&["s1", "s2"])).await;
    let mut events = engine.subscribe();

    storage.arm(Fault::Reject);
    let first = engine.reject_slot(&id, &slot(1), "wrong terms").await.unwrap_err();
    assert!(first.is_retryable());

    let status = engine.reject_slot(&id, &slot(1), "wrong terms").await.unwrap();
    assert_eq!(status, ProcessStatus::Rejected);

    let event = events.recv().await.unwrap();
    assert_eq!(event.new_status, ProcessStatus::Rejected);

    let trail = engine.audit_trail(&id).await.unwrap();
    assert_eq!(count(&trail, AuditEventKind::SlotRejected), 1);
    assert_eq!(count(&trail, AuditEventKind::ProcessRejected), 1);
}

#[tokio::test]
async fn missing_closing_event_is_recorded_on_retry() {
    let (storage, engine) = outage_engine();
    let id = start(&engine, SigningMode::Parallel, mandatory(&["s1"])).await;
    let overdue = engine.get_process(&id).await.unwrap().due_at + Duration::seconds(1);

    storage.arm(Fault::Audit(AuditEventKind::ProcessExpired));
    assert!(engine.evaluate_expiry(&id, overdue).await.unwrap_err().is_retryable());
    assert_eq!(
        count(&engine.audit_trail(&id).await.unwrap(), AuditEventKind::ProcessExpired),
        0
    );

    assert_eq!(
        engine.evaluate_expiry(&id, overdue).await.unwrap(),
        ProcessStatus::Expired
    );
    let trail = engine.audit_trail(&id).await.unwrap();
    assert_eq!(count(&trail, AuditEventKind::ProcessExpired), 1);
    assert!(trail.windows(2).all(|w| w[1].previous_hash == Some(w[0].hash)));
}
