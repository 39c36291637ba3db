use crate::StorageResult;
use async_trait::async_trait;
use signing_types::{
    ArtifactId, ArtifactRecord, AuditAppend, AuditEvent, Document, DocumentId, ProcessFilter,
    ProcessId, ProcessStatus, ProcessUpdate, SignerSlot, SigningProcess, SlotId, SlotStatus,
    SlotTransition,
};

/// Generic query window for paged reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

/// Storage interface for documents. Documents are write-once.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document; fails with `Conflict` if the id exists.
    async fn create_document(&self, document: Document) -> StorageResult<()>;

    async fn get_document(&self, document_id: &DocumentId) -> StorageResult<Option<Document>>;
}

/// Storage interface for signing process records.
#[async_trait]
pub trait ProcessStore: Send + Sync {
    /// Insert a new process; fails with `Conflict` if the id exists or the
    /// document already has a non-terminal process.
    async fn create_process(&self, process: SigningProcess) -> StorageResult<()>;

    async fn get_process(&self, process_id: &ProcessId) -> StorageResult<Option<SigningProcess>>;

    /// Apply `update` only if the stored status equals `expected`.
    ///
    /// Returns the updated record. A mismatch yields `InvariantViolation`
    /// and leaves the record untouched.
    async fn transition_process(
        &self,
        process_id: &ProcessId,
        expected: ProcessStatus,
        update: ProcessUpdate,
    ) -> StorageResult<SigningProcess>;

    /// List processes matching `filter`, newest first.
    async fn list_processes(
        &self,
        filter: &ProcessFilter,
        window: QueryWindow,
    ) -> StorageResult<Vec<SigningProcess>>;

    /// The non-terminal process for a document, if any.
    async fn open_process_for_document(
        &self,
        document_id: &DocumentId,
    ) -> StorageResult<Option<SigningProcess>>;
}

/// Storage interface for signer slots.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Insert a slot; fails with `Conflict` if the sequence number is taken.
    async fn insert_slot(&self, process_id: &ProcessId, slot: SignerSlot) -> StorageResult<()>;

    /// All slots of a process in ascending sequence-number order.
    async fn list_slots(&self, process_id: &ProcessId) -> StorageResult<Vec<SignerSlot>>;

    /// Compare-and-swap on the slot status.
    ///
    /// Applies `transition` only if the stored status equals `expected`;
    /// otherwise returns `InvariantViolation` without mutating anything.
    async fn transition_slot(
        &self,
        process_id: &ProcessId,
        slot_id: &SlotId,
        expected: SlotStatus,
        transition: SlotTransition,
    ) -> StorageResult<SignerSlot>;
}

/// Storage interface for committed artifacts. Artifacts are write-once.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `record` and move its slot from `Pending` to `Committed` as one
    /// unit.
    ///
    /// A slot that is no longer pending yields `InvariantViolation`, a taken
    /// artifact id yields `Conflict`. Either way nothing is written.
    async fn commit_artifact(
        &self,
        record: ArtifactRecord,
        commit_index: u32,
        idempotency_key: Option<String>,
    ) -> StorageResult<SignerSlot>;

    async fn get_artifact(&self, artifact_id: &ArtifactId)
        -> StorageResult<Option<ArtifactRecord>>;
}

/// Storage interface for append-only audit events.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append an event and return the canonical, hash-linked stored record.
    async fn append_audit(&self, event: AuditAppend) -> StorageResult<AuditEvent>;

    /// Events of one process, oldest first.
    async fn list_audit(&self, process_id: &ProcessId) -> StorageResult<Vec<AuditEvent>>;
}

/// Unified storage bundle used by the signing engine.
pub trait SigningStorage:
    DocumentStore + ProcessStore + SlotStore + ArtifactStore + AuditStore + Send + Sync
{
}

impl<T> SigningStorage for T where
    T: DocumentStore + ProcessStore + SlotStore + ArtifactStore + AuditStore + Send + Sync
{
}
