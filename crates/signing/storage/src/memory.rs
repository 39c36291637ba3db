//! In-memory reference implementation for signing storage traits.
//!
//! This adapter is deterministic and test-friendly. Production deployments
//! should use a transactional backend for source-of-truth data.

use crate::traits::{ArtifactStore, AuditStore, DocumentStore, ProcessStore, QueryWindow, SlotStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use signing_types::{
    Artifact, ArtifactId, ArtifactRecord, AuditAppend, AuditEvent, Document, DocumentId, ProcessFilter, ProcessId, ProcessStatus, ProcessUpdate, SignerSlot,
    SigningProcess, SlotId, SlotStatus, SlotTransition,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory signing storage adapter.
#[derive(Default)]
pub struct InMemorySigningStorage {
    documents: RwLock<HashMap<DocumentId, Document>>,
    processes: RwLock<HashMap<ProcessId, SigningProcess>>,
    slots: RwLock<HashMap<ProcessId, BTreeMap<u32, SignerSlot>>>,
    artifacts: RwLock<HashMap<ArtifactId, ArtifactRecord>>,
    audits: RwLock<HashMap<ProcessId, Vec<AuditEvent>>>,
}

impl InMemorySigningStorage {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Fault injection ──────────────────────────────────────────────
    //
    // Write-once records can only change behind the engine's back. These
    // helpers simulate that for integrity tests and drills.

    /// Replace a stored document's content without touching its bound hash.
    pub fn overwrite_document_content(
        &self,
        document_id: &DocumentId,
        content: Vec<u8>,
    ) -> StorageResult<()> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;
        let document = guard.get_mut(document_id).ok_or_else(|| {
            StorageError::NotFound(format!("document {} not found", document_id))
        })?;
        document.content = content;
        Ok(())
    }

    /// Replace a stored artifact body without touching its recorded hash.
    pub fn overwrite_artifact(
        &self,
        artifact_id: &ArtifactId,
        artifact: Artifact,
    ) -> StorageResult<()> {
        let mut guard = self
            .artifacts
            .write()
            .map_err(|_| StorageError::Backend("artifacts lock poisoned".to_string()))?;
        let record = guard.get_mut(artifact_id).ok_or_else(|| {
            StorageError::NotFound(format!("artifact {} not found", artifact_id))
        })?;
        record.artifact = artifact;
        Ok(())
    }

    /// Replace a stored slot wholesale.
    pub fn overwrite_slot(&self, process_id: &ProcessId, slot: SignerSlot) -> StorageResult<()> {
        let mut guard = self
            .slots
            .write()
            .map_err(|_| StorageError::Backend("slots lock poisoned".to_string()))?;
        let slots = guard.get_mut(process_id).ok_or_else(|| {
            StorageError::NotFound(format!("process {} has no slots", process_id))
        })?;
        slots.insert(slot.sequence_number, slot);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemorySigningStorage {
    async fn create_document(&self, document: Document) -> StorageResult<()> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;
        if guard.contains_key(&document.id) {
            return Err(StorageError::Conflict(format!(
                "document {} already exists",
                document.id
            )));
        }
        guard.insert(document.id.clone(), document);
        Ok(())
    }

    async fn get_document(&self, document_id: &DocumentId) -> StorageResult<Option<Document>> {
        let guard = self
            .documents
            .read()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;
        Ok(guard.get(document_id).cloned())
    }
}

#[async_trait]
impl ProcessStore for InMemorySigningStorage {
    async fn create_process(&self, process: SigningProcess) -> StorageResult<()> {
        let mut guard = self
            .processes
            .write()
            .map_err(|_| StorageError::Backend("processes lock poisoned".to_string()))?;

        if guard.contains_key(&process.id) {
            return Err(StorageError::Conflict(format!(
                "process {} already exists",
                process.id
            )));
        }
        if let Some(open) = guard
            .values()
            .find(|p| p.document_id == process.document_id && !p.is_terminal())
        {
            return Err(StorageError::Conflict(format!(
                "document {} already has open process {}",
                process.document_id, open.id
            )));
        }

        guard.insert(process.id.clone(), process);
        Ok(())
    }

    async fn get_process(&self, process_id: &ProcessId) -> StorageResult<Option<SigningProcess>> {
        let guard = self
            .processes
            .read()
            .map_err(|_| StorageError::Backend("processes lock poisoned".to_string()))?;
        Ok(guard.get(process_id).cloned())
    }

    async fn transition_process(
        &self,
        process_id: &ProcessId,
        expected: ProcessStatus,
        update: ProcessUpdate,
    ) -> StorageResult<SigningProcess> {
        let mut guard = self
            .processes
            .write()
            .map_err(|_| StorageError::Backend("processes lock poisoned".to_string()))?;
        let record = guard.get_mut(process_id).ok_or_else(|| {
            StorageError::NotFound(format!("process {} not found", process_id))
        })?;

        if record.status != expected {
            return Err(StorageError::InvariantViolation(format!(
                "invalid process transition: expected {}, found {}",
                expected, record.status
            )));
        }
        if record.status.is_terminal() {
            return Err(StorageError::InvariantViolation(format!(
                "process {} is terminal ({})",
                process_id, record.status
            )));
        }
        if let ProcessUpdate::AdvanceChain {
            expected_commit_count,
            ..
        } = &update
        {
            if record.commit_count != *expected_commit_count {
                return Err(StorageError::InvariantViolation(format!(
                    "chain moved: expected commit count {}, found {}",
                    expected_commit_count, record.commit_count
                )));
            }
        }

        update.apply(record);
        Ok(record.clone())
    }

    async fn list_processes(
        &self,
        filter: &ProcessFilter,
        window: QueryWindow,
    ) -> StorageResult<Vec<SigningProcess>> {
        let guard = self
            .processes
            .read()
            .map_err(|_| StorageError::Backend("processes lock poisoned".to_string()))?;
        let mut values = guard
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            values.truncate(limit);
        }
        Ok(apply_window(values, window))
    }

    async fn open_process_for_document(
        &self,
        document_id: &DocumentId,
    ) -> StorageResult<Option<SigningProcess>> {
        let guard = self
            .processes
            .read()
            .map_err(|_| StorageError::Backend("processes lock poisoned".to_string()))?;
        Ok(guard
            .values()
            .find(|p| &p.document_id == document_id && !p.is_terminal())
            .cloned())
    }
}

#[async_trait]
impl SlotStore for InMemorySigningStorage {
    async fn insert_slot(&self, process_id: &ProcessId, slot: SignerSlot) -> StorageResult<()> {
        let mut guard = self
            .slots
            .write()
            .map_err(|_| StorageError::Backend("slots lock poisoned".to_string()))?;
        let slots = guard.entry(process_id.clone()).or_default();
        if slots.contains_key(&slot.sequence_number) {
            return Err(StorageError::Conflict(format!(
                "process {} already has slot {}",
                process_id, slot.sequence_number
            )));
        }
        slots.insert(slot.sequence_number, slot);
        Ok(())
    }

    async fn list_slots(&self, process_id: &ProcessId) -> StorageResult<Vec<SignerSlot>> {
        let guard = self
            .slots
            .read()
            .map_err(|_| StorageError::Backend("slots lock poisoned".to_string()))?;
        Ok(guard
            .get(process_id)
            .map(|slots| slots.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn transition_slot(
        &self,
        process_id: &ProcessId,
        slot_id: &SlotId,
        expected: SlotStatus,
        transition: SlotTransition,
    ) -> StorageResult<SignerSlot> {
        let mut guard = self
            .slots
            .write()
            .map_err(|_| StorageError::Backend("slots lock poisoned".to_string()))?;
        let slot = guard
            .get_mut(process_id)
            .and_then(|slots| slots.values_mut().find(|s| &s.id == slot_id))
            .ok_or_else(|| {
                StorageError::NotFound(format!("slot {} of process {} not found", slot_id, process_id))
            })?;

        if slot.status != expected {
            return Err(StorageError::InvariantViolation(format!(
                "invalid slot transition: expected {}, found {}",
                expected, slot.status
            )));
        }

        transition.apply(slot);
        Ok(slot.clone())
    }
}

#[async_trait]
impl ArtifactStore for InMemorySigningStorage {
    async fn commit_artifact(
        &self,
        record: ArtifactRecord,
        commit_index: u32,
        idempotency_key: Option<String>,
    ) -> StorageResult<SignerSlot> {
        // Lock order: slots, then artifacts.
        let mut slots = self
            .slots
            .write()
            .map_err(|_| StorageError::Backend("slots lock poisoned".to_string()))?;
        let mut artifacts = self
            .artifacts
            .write()
            .map_err(|_| StorageError::Backend("artifacts lock poisoned".to_string()))?;

        let slot = slots
            .get_mut(&record.process_id)
            .and_then(|slots| slots.values_mut().find(|s| s.id == record.slot_id))
            .ok_or_else(|| {
                StorageError::NotFound(format!(
                    "slot {} of process {} not found",
                    record.slot_id, record.process_id
                ))
            })?;
        if slot.status != SlotStatus::Pending {
            return Err(StorageError::InvariantViolation(format!(
                "invalid slot transition: expected {}, found {}",
                SlotStatus::Pending,
                slot.status
            )));
        }
        if artifacts.contains_key(&record.id) {
            return Err(StorageError::Conflict(format!(
                "artifact {} already exists",
                record.id
            )));
        }

        SlotTransition::Commit {
            artifact_id: record.id.clone(),
            commit_index,
            idempotency_key,
            at: record.committed_at,
        }
        .apply(slot);
        let committed = slot.clone();
        artifacts.insert(record.id.clone(), record);
        Ok(committed)
    }

    async fn get_artifact(
        &self,
        artifact_id: &ArtifactId,
    ) -> StorageResult<Option<ArtifactRecord>> {
        let guard = self
            .artifacts
            .read()
            .map_err(|_| StorageError::Backend("artifacts lock poisoned".to_string()))?;
        Ok(guard.get(artifact_id).cloned())
    }
}

#[async_trait]
impl AuditStore for InMemorySigningStorage {
    async fn append_audit(&self, event: AuditAppend) -> StorageResult<AuditEvent> {
        let mut guard = self
            .audits
            .write()
            .map_err(|_| StorageError::Backend("audit lock poisoned".to_string()))?;
        let chain = guard.entry(event.process_id.clone()).or_default();

        let previous_hash = chain.last().map(|e| e.hash);
        let sequence = chain.len() as u64 + 1;
        let hash = AuditEvent::compute_hash(&event, sequence, previous_hash.as_ref())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let record = AuditEvent {
            event_id: format!("audit-{}", Uuid::new_v4()),
            sequence,
            process_id: event.process_id,
            slot_id: event.slot_id,
            kind: event.kind,
            artifact_hash: event.artifact_hash,
            chain_head: event.chain_head,
            actor_id: event.actor_id,
            detail: event.detail,
            timestamp: event.timestamp,
            previous_hash,
            hash,
        };

        tracing::trace!(
            process_id = %record.process_id,
            sequence = record.sequence,
            kind = %record.kind,
            "Audit event appended"
        );
        chain.push(record.clone());
        Ok(record)
    }

    async fn list_audit(&self, process_id: &ProcessId) -> StorageResult<Vec<AuditEvent>> {
        let guard = self
            .audits
            .read()
            .map_err(|_| StorageError::Backend("audit lock poisoned".to_string()))?;
        Ok(guard.get(process_id).cloned().unwrap_or_default())
    }
}

fn apply_window<T>(items: Vec<T>, window: QueryWindow) -> Vec<T> {
    let iter = items.into_iter().skip(window.offset);
    if window.limit == 0 {
        iter.collect()
    } else {
        iter.take(window.limit).collect()
    }
}
