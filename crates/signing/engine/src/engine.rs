//! Signing Process Engine: the process state machine
//!
//! ```text
//! Draft ──start──▶ InProgress ──┬─▶ Completed   (last mandatory slot committed)
//!                               ├─▶ Rejected    (a mandatory signer refused)
//!                               └─▶ Expired     (due date passed)
//! ```
//!
//! Every mutating operation runs under a per-process async mutex, so the
//! "last mandatory slot commits → Completed" evaluation happens exactly once
//! even when commits race. Slot and process updates are additionally applied
//! by compare-and-swap in storage.
//!
//! A commit is several storage writes: artifact and slot together, then the
//! chain head, the ledger and possibly the closing transition. If storage
//! fails part way, the next operation on the process settles it first by
//! finishing the missing writes from what the slots already record.

use crate::config::EngineConfig;
use crate::error::{SigningError, SigningResult};
use crate::events::EventBus;
use crate::hasher::{ChainLink, ContentHasher};
use crate::resolver::SlotResolver;
use crate::validator::ArtifactValidator;
use crate::verification::VerificationService;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signing_storage::memory::InMemorySigningStorage;
use signing_storage::{QueryWindow, SigningStorage, StorageError};
use signing_types::{
    ArtifactCandidate, ArtifactId, ArtifactRecord, AuditAppend, AuditEvent, AuditEventKind,
    ContentHash, Document, DocumentId, DocumentInput, Priority, ProcessFilter, ProcessId,
    ProcessMetadata, ProcessStatus, ProcessStatusView, ProcessUpdate, Progress, Requirement,
    SignerId, SignerSlot, SignerSpec, SignerTask, SigningMode, SigningProcess, SlotCommitResult,
    SlotId, SlotStatus, SlotTransition, StatusChangeEvent, VerificationResult,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};

/// A signer's submission for one slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitRequest {
    /// Who is submitting; must be the slot's signer
    pub actor: SignerId,
    pub candidate: ArtifactCandidate,
    /// Reused by the caller on retries of the same submission
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl CommitRequest {
    pub fn new(actor: impl Into<String>, candidate: ArtifactCandidate) -> Self {
        Self {
            actor: SignerId::new(actor),
            candidate,
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Per-process mutual exclusion.
#[derive(Default)]
struct ProcessLocks {
    table: std::sync::Mutex<HashMap<ProcessId, Arc<Mutex<()>>>>,
}

impl ProcessLocks {
    async fn acquire(&self, process_id: &ProcessId) -> SigningResult<OwnedMutexGuard<()>> {
        let lock = {
            let mut table = self.table.lock().map_err(|_| {
                SigningError::Storage(StorageError::Backend(
                    "process lock table poisoned".to_string(),
                ))
            })?;
            Arc::clone(table.entry(process_id.clone()).or_default())
        };
        Ok(lock.lock_owned().await)
    }

    /// Drop the lock of a terminal process. Later callers take a fresh lock
    /// and observe the terminal status written under the old one.
    fn forget(&self, process_id: &ProcessId) {
        if let Ok(mut table) = self.table.lock() {
            table.remove(process_id);
        }
    }
}

/// The signing process engine.
pub struct SigningEngine {
    storage: Arc<dyn SigningStorage>,
    config: EngineConfig,
    validator: ArtifactValidator,
    verifier: VerificationService,
    events: EventBus,
    locks: ProcessLocks,
}

impl SigningEngine {
    pub fn new(storage: Arc<dyn SigningStorage>, config: EngineConfig) -> Self {
        Self {
            validator: ArtifactValidator::new(&config),
            verifier: VerificationService::new(Arc::clone(&storage)),
            events: EventBus::new(config.event_capacity),
            locks: ProcessLocks::default(),
            storage,
            config,
        }
    }

    /// Engine over in-memory storage with default configuration
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemorySigningStorage::new()),
            EngineConfig::default(),
        )
    }

    pub fn storage(&self) -> Arc<dyn SigningStorage> {
        Arc::clone(&self.storage)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn validator(&self) -> &ArtifactValidator {
        &self.validator
    }

    /// Status-change events for the notification layer
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChangeEvent> {
        self.events.subscribe()
    }

    // ── Authoring ────────────────────────────────────────────────────

    /// Create a process, attach its signers and open it for signing.
    pub async fn create_process(
        &self,
        document: DocumentInput,
        signers: Vec<SignerSpec>,
        mode: SigningMode,
        due_at: DateTime<Utc>,
        metadata: ProcessMetadata,
    ) -> SigningResult<ProcessId> {
        check_signers(mode, &signers)?;

        let process_id = self.create_draft(document, mode, due_at, metadata).await?;
        for signer in signers {
            self.add_signer(&process_id, signer).await?;
        }
        self.start_process(&process_id).await?;
        Ok(process_id)
    }

    /// Create a Draft process with no slots.
    ///
    /// Uploaded content is validated and fingerprinted here; an existing
    /// document keeps the fingerprint bound when it was first stored.
    pub async fn create_draft(
        &self,
        document: DocumentInput,
        mode: SigningMode,
        due_at: DateTime<Utc>,
        metadata: ProcessMetadata,
    ) -> SigningResult<ProcessId> {
        let now = Utc::now();
        if due_at <= now {
            return Err(SigningError::InvalidRequest(format!(
                "due date {} is not in the future",
                due_at
            )));
        }

        let document = self.resolve_document(document, now).await?;
        if let Some(open) = self
            .storage
            .open_process_for_document(&document.id)
            .await?
        {
            return Err(SigningError::DocumentBusy {
                document_id: document.id,
                process_id: open.id,
            });
        }

        let title = metadata
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| document.title.clone());
        let process = SigningProcess {
            id: ProcessId::generate(),
            document_id: document.id.clone(),
            title,
            initiator: metadata.initiator.clone(),
            priority: metadata.priority,
            mode,
            due_at,
            status: ProcessStatus::Draft,
            content_hash: document.content_hash,
            chain_head: document.content_hash,
            commit_count: 0,
            composite_hash: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        };
        let process_id = process.id.clone();

        if let Err(e) = self.storage.create_process(process).await {
            return Err(match e {
                StorageError::Conflict(_) => match self
                    .storage
                    .open_process_for_document(&document.id)
                    .await?
                {
                    Some(open) => SigningError::DocumentBusy {
                        document_id: document.id,
                        process_id: open.id,
                    },
                    None => SigningError::Storage(e),
                },
                other => SigningError::Storage(other),
            });
        }

        self.audit(
            AuditAppend::new(
                process_id.clone(),
                AuditEventKind::ProcessCreated,
                metadata.initiator,
                now,
            )
            .with_chain_head(document.content_hash)
            .with_detail(format!("mode={} document={}", mode, document.id)),
        )
        .await?;

        tracing::info!(
            process_id = %process_id,
            document_id = %document.id,
            mode = %mode,
            "Signing process created"
        );
        Ok(process_id)
    }

    /// Append a signer slot to a Draft process.
    pub async fn add_signer(
        &self,
        process_id: &ProcessId,
        signer: SignerSpec,
    ) -> SigningResult<SignerSlot> {
        let (_guard, process) = self.lock_process(process_id).await?;
        ensure_not_terminal(&process)?;
        if process.status != ProcessStatus::Draft {
            return Err(SigningError::InvalidRequest(format!(
                "process {} has started; its signers are fixed",
                process_id
            )));
        }

        let slots = self.storage.list_slots(process_id).await?;
        if process.mode == SigningMode::Hybrid {
            if let Some(last) = slots.last() {
                if signer.group < last.group {
                    return Err(SigningError::InvalidRequest(format!(
                        "group {} would follow group {}; groups must be contiguous",
                        signer.group, last.group
                    )));
                }
            }
        }

        let sequence_number = slots.last().map(|s| s.sequence_number + 1).unwrap_or(1);
        let slot = SignerSlot::new(sequence_number, signer);
        self.storage.insert_slot(process_id, slot.clone()).await?;

        self.audit(
            AuditAppend::new(
                process_id.clone(),
                AuditEventKind::SignerAdded,
                process.initiator.clone(),
                Utc::now(),
            )
            .with_slot(slot.id.clone())
            .with_detail(format!(
                "signer={} requirement={:?} group={}",
                slot.signer_id, slot.requirement, slot.group
            )),
        )
        .await?;

        tracing::debug!(process_id = %process_id, slot = %slot.id, signer = %slot.signer_id, "Signer added");
        Ok(slot)
    }

    /// Open a Draft process for signing.
    pub async fn start_process(&self, process_id: &ProcessId) -> SigningResult<ProcessStatus> {
        let (_guard, process) = self.lock_process(process_id).await?;
        ensure_not_terminal(&process)?;
        if process.status != ProcessStatus::Draft {
            return Err(SigningError::InvalidRequest(format!(
                "process {} is already {}",
                process_id, process.status
            )));
        }

        let slots = self.storage.list_slots(process_id).await?;
        if !slots.iter().any(|s| s.is_mandatory()) {
            return Err(SigningError::InvalidRequest(format!(
                "process {} needs at least one mandatory signer",
                process_id
            )));
        }

        let now = Utc::now();
        let process = self
            .storage
            .transition_process(process_id, ProcessStatus::Draft, ProcessUpdate::Start { at: now })
            .await?;
        self.audit(AuditAppend::new(
            process_id.clone(),
            AuditEventKind::ProcessStarted,
            process.initiator.clone(),
            now,
        ))
        .await?;
        self.publish(process_id, ProcessStatus::Draft, process.status, now);

        tracing::info!(process_id = %process_id, signers = slots.len(), "Signing process started");
        Ok(process.status)
    }

    // ── Signing ──────────────────────────────────────────────────────

    /// Commit an artifact to a slot.
    ///
    /// A retry carrying the idempotency key that already committed the slot
    /// yields `DuplicateCommit { replay: true }`, after any writes the
    /// first attempt left undone have been finished.
    pub async fn commit_slot(
        &self,
        process_id: &ProcessId,
        slot_id: &SlotId,
        request: CommitRequest,
    ) -> SigningResult<SlotCommitResult> {
        let (_guard, process) = self.lock_process(process_id).await?;
        let slots = self.storage.list_slots(process_id).await?;

        let replayed = request.idempotency_key.is_some()
            && slots.iter().any(|s| {
                &s.id == slot_id && s.is_committed() && s.idempotency_key == request.idempotency_key
            });
        if replayed {
            tracing::info!(process_id = %process_id, slot = %slot_id, status = %process.status, "Commit replayed");
            return Err(SigningError::DuplicateCommit {
                process_id: process_id.clone(),
                slot_id: slot_id.clone(),
                replay: true,
            });
        }

        ensure_not_terminal(&process)?;
        let slot = find_slot(process_id, &slots, slot_id)?;

        match slot.status {
            SlotStatus::Committed => {
                tracing::warn!(process_id = %process_id, slot = %slot_id, "Duplicate commit");
                return Err(SigningError::DuplicateCommit {
                    process_id: process_id.clone(),
                    slot_id: slot_id.clone(),
                    replay: false,
                });
            }
            SlotStatus::Rejected => {
                return Err(invalid_slot(process_id, slot_id, "slot was rejected"));
            }
            SlotStatus::Pending => {}
        }

        if slot.signer_id != request.actor {
            tracing::warn!(process_id = %process_id, slot = %slot_id, actor = %request.actor, "Commit by wrong signer");
            return Err(invalid_slot(
                process_id,
                slot_id,
                format!("slot belongs to {}, not {}", slot.signer_id, request.actor),
            ));
        }
        if !SlotResolver::is_eligible(process.status, process.mode, &slots, slot_id) {
            let reason = if process.status == ProcessStatus::Draft {
                "process has not started".to_string()
            } else {
                SlotResolver::blocking_reason(process.mode, &slots, slot)
            };
            tracing::warn!(process_id = %process_id, slot = %slot_id, reason = %reason, "Slot not eligible");
            return Err(invalid_slot(process_id, slot_id, reason));
        }

        let valid = self.validator.validate(request.candidate).map_err(|e| {
            tracing::warn!(process_id = %process_id, slot = %slot_id, error = %e, "Artifact rejected");
            e
        })?;
        let artifact = valid.into_inner();
        let artifact_hash = ContentHasher::artifact_hash(&artifact)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let artifact_id = ArtifactId::generate();
        self.storage
            .commit_artifact(
                ArtifactRecord {
                    id: artifact_id.clone(),
                    process_id: process_id.clone(),
                    slot_id: slot_id.clone(),
                    artifact,
                    artifact_hash,
                    committed_by: request.actor.clone(),
                    committed_at: Utc::now(),
                },
                process.commit_count,
                request.idempotency_key,
            )
            .await
            .map_err(|e| match e {
                StorageError::InvariantViolation(_) => SigningError::DuplicateCommit {
                    process_id: process_id.clone(),
                    slot_id: slot_id.clone(),
                    replay: false,
                },
                other => SigningError::Storage(other),
            })?;

        let process = self.settle(process).await?;
        let progress = Progress::from_slots(&self.storage.list_slots(process_id).await?);

        Ok(SlotCommitResult {
            process_id: process_id.clone(),
            slot_id: slot_id.clone(),
            artifact_id,
            artifact_hash,
            chain_head: process.chain_head,
            progress,
            status: process.status,
        })
    }

    /// Refuse a slot.
    ///
    /// Allowed out of turn. A mandatory refusal rejects the whole process;
    /// an optional one closes only that slot. Repeating a refusal with the
    /// same reason returns the current status.
    pub async fn reject_slot(
        &self,
        process_id: &ProcessId,
        slot_id: &SlotId,
        reason: impl Into<String>,
    ) -> SigningResult<ProcessStatus> {
        let reason = reason.into();
        let (_guard, process) = self.lock_process(process_id).await?;
        let slots = self.storage.list_slots(process_id).await?;

        if slots.iter().any(|s| {
            &s.id == slot_id
                && s.status == SlotStatus::Rejected
                && s.rejection_reason.as_deref() == Some(reason.as_str())
        }) {
            tracing::info!(process_id = %process_id, slot = %slot_id, status = %process.status, "Rejection replayed");
            return Ok(process.status);
        }

        ensure_not_terminal(&process)?;
        if process.status == ProcessStatus::Draft {
            return Err(invalid_slot(process_id, slot_id, "process has not started"));
        }

        let slot = find_slot(process_id, &slots, slot_id)?;
        if !slot.is_pending() {
            return Err(invalid_slot(
                process_id,
                slot_id,
                format!("slot is already {}", slot.status),
            ));
        }

        self.storage
            .transition_slot(
                process_id,
                slot_id,
                SlotStatus::Pending,
                SlotTransition::Reject {
                    reason,
                    at: Utc::now(),
                },
            )
            .await
            .map_err(|e| match e {
                StorageError::InvariantViolation(msg) => invalid_slot(process_id, slot_id, msg),
                other => SigningError::Storage(other),
            })?;

        let process = self.settle(process).await?;
        Ok(process.status)
    }

    // ── Expiry ───────────────────────────────────────────────────────

    /// Expire the process if it is still InProgress and `now` is past its
    /// due date. Returns the resulting status.
    pub async fn evaluate_expiry(
        &self,
        process_id: &ProcessId,
        now: DateTime<Utc>,
    ) -> SigningResult<ProcessStatus> {
        let (_guard, process) = self.lock_process(process_id).await?;
        if process.status != ProcessStatus::InProgress || !process.is_overdue(now) {
            return Ok(process.status);
        }

        let expired = self
            .close(&process, &[], ProcessUpdate::Expire { at: now })
            .await?;
        Ok(expired.status)
    }

    /// Evaluate expiry for every InProgress process. Returns the ids that
    /// expired in this sweep.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> SigningResult<Vec<ProcessId>> {
        let open = self
            .storage
            .list_processes(
                &ProcessFilter {
                    status: Some(ProcessStatus::InProgress),
                    ..Default::default()
                },
                QueryWindow::default(),
            )
            .await?;

        let mut expired = Vec::new();
        for process in open.into_iter().filter(|p| p.is_overdue(now)) {
            match self.evaluate_expiry(&process.id, now).await {
                Ok(ProcessStatus::Expired) => expired.push(process.id),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(process_id = %process.id, error = %e, "Expiry evaluation failed");
                }
            }
        }
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "Expiry sweep closed processes");
        }
        Ok(expired)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn get_process(&self, process_id: &ProcessId) -> SigningResult<SigningProcess> {
        self.load_process(process_id).await
    }

    pub async fn get_slots(&self, process_id: &ProcessId) -> SigningResult<Vec<SignerSlot>> {
        self.load_process(process_id).await?;
        Ok(self.storage.list_slots(process_id).await?)
    }

    /// Status, mandatory progress and currently eligible slots.
    pub async fn get_status(&self, process_id: &ProcessId) -> SigningResult<ProcessStatusView> {
        let process = self.load_process(process_id).await?;
        let slots = self.storage.list_slots(process_id).await?;
        Ok(ProcessStatusView {
            process_id: process.id,
            status: process.status,
            progress: Progress::from_slots(&slots),
            eligible_slots: SlotResolver::eligible_slots(process.status, process.mode, &slots),
            due_at: process.due_at,
        })
    }

    pub async fn list_processes(&self, filter: &ProcessFilter) -> SigningResult<Vec<SigningProcess>> {
        Ok(self
            .storage
            .list_processes(filter, QueryWindow::default())
            .await?)
    }

    /// Slots the signer can act on now, most urgent first.
    pub async fn tasks_for_signer(&self, signer_id: &SignerId) -> SigningResult<Vec<SignerTask>> {
        let open = self
            .list_processes(&ProcessFilter {
                status: Some(ProcessStatus::InProgress),
                ..Default::default()
            })
            .await?;

        let mut tasks = Vec::new();
        for process in open {
            let slots = self.storage.list_slots(&process.id).await?;
            for slot in SlotResolver::eligible_slots(process.status, process.mode, &slots) {
                if &slot.signer_id == signer_id {
                    tasks.push(SignerTask {
                        process_id: process.id.clone(),
                        title: process.title.clone(),
                        priority: process.priority,
                        due_at: process.due_at,
                        slot,
                    });
                }
            }
        }
        tasks.sort_by_key(|t| (priority_rank(t.priority), t.due_at));
        Ok(tasks)
    }

    /// Audit events of a process, oldest first.
    pub async fn audit_trail(&self, process_id: &ProcessId) -> SigningResult<Vec<AuditEvent>> {
        self.load_process(process_id).await?;
        Ok(self.storage.list_audit(process_id).await?)
    }

    /// Recompute the integrity chain and compare it with stored values.
    pub async fn verify(&self, process_id: &ProcessId) -> SigningResult<VerificationResult> {
        self.verifier.verify(process_id).await
    }

    pub async fn get_document(&self, document_id: &DocumentId) -> SigningResult<Document> {
        self.storage
            .get_document(document_id)
            .await?
            .ok_or_else(|| SigningError::DocumentNotFound(document_id.clone()))
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn load_process(&self, process_id: &ProcessId) -> SigningResult<SigningProcess> {
        self.storage
            .get_process(process_id)
            .await?
            .ok_or_else(|| SigningError::ProcessNotFound(process_id.clone()))
    }

    async fn resolve_document(
        &self,
        input: DocumentInput,
        now: DateTime<Utc>,
    ) -> SigningResult<Document> {
        match input {
            DocumentInput::Existing { document_id } => self.get_document(&document_id).await,
            DocumentInput::Upload {
                title,
                media_type,
                content,
            } => {
                self.validator
                    .validate_source_document(&media_type, &content)?;
                let document = Document {
                    id: DocumentId::generate(),
                    title,
                    media_type,
                    content_hash: ContentHasher::bind(&content),
                    content,
                    created_at: now,
                };
                self.storage.create_document(document.clone()).await?;
                tracing::debug!(
                    document_id = %document.id,
                    content_hash = %document.content_hash,
                    "Document fingerprint bound"
                );
                Ok(document)
            }
        }
    }

    /// Lock an existing process and return it settled. Unknown ids never
    /// reach the lock table.
    async fn lock_process(
        &self,
        process_id: &ProcessId,
    ) -> SigningResult<(OwnedMutexGuard<()>, SigningProcess)> {
        self.load_process(process_id).await?;
        let guard = self.locks.acquire(process_id).await?;
        let process = self.load_process(process_id).await?;
        let process = self.settle(process).await?;
        Ok((guard, process))
    }

    /// Finish the writes that follow a slot change: advance the chain over
    /// committed slots it has not absorbed, ledger every commit and refusal
    /// not yet recorded, then close the process if a mandatory signer
    /// refused or every mandatory slot is committed.
    ///
    /// Idempotent. Must run under the process lock.
    async fn settle(&self, process: SigningProcess) -> SigningResult<SigningProcess> {
        if process.status == ProcessStatus::Draft {
            return Ok(process);
        }
        let slots = self.storage.list_slots(&process.id).await?;
        let ledger = self.storage.list_audit(&process.id).await?;
        if process.is_terminal() {
            self.settle_closed(&process, &slots, &ledger).await?;
            self.locks.forget(&process.id);
            return Ok(process);
        }

        let now = Utc::now();
        let process_id = process.id.clone();
        let committed = self.committed_records(&slots).await?;
        let mut process = process;
        while (process.commit_count as usize) < committed.len() {
            let chain_head = chain_head_through(&process, &committed, process.commit_count);
            process = self
                .storage
                .transition_process(
                    &process_id,
                    ProcessStatus::InProgress,
                    ProcessUpdate::AdvanceChain {
                        expected_commit_count: process.commit_count,
                        chain_head,
                        at: now,
                    },
                )
                .await?;
        }

        let audited = ledgered_slots(&ledger, AuditEventKind::SlotCommitted);
        for (link, record) in committed.iter().filter(|(l, _)| !audited.contains(&l.slot_id)) {
            let kind = record.artifact.kind();
            self.audit(
                AuditAppend::new(
                    process.id.clone(),
                    AuditEventKind::SlotCommitted,
                    record.committed_by.clone(),
                    record.committed_at,
                )
                .with_slot(link.slot_id.clone())
                .with_artifact_hash(record.artifact_hash)
                .with_chain_head(chain_head_through(&process, &committed, link.commit_index))
                .with_detail(kind.to_string()),
            )
            .await?;
            tracing::info!(
                process_id = %process.id,
                slot = %link.slot_id,
                kind = %kind,
                progress = %Progress::from_slots(&slots),
                "Slot committed"
            );
        }

        let declined = ledgered_slots(&ledger, AuditEventKind::SlotRejected);
        for slot in slots
            .iter()
            .filter(|s| s.status == SlotStatus::Rejected && !declined.contains(&s.id))
        {
            self.audit(
                AuditAppend::new(
                    process.id.clone(),
                    AuditEventKind::SlotRejected,
                    slot.signer_id.clone(),
                    slot.resolved_at.unwrap_or(now),
                )
                .with_slot(slot.id.clone())
                .with_detail(slot.rejection_reason.clone().unwrap_or_default()),
            )
            .await?;
            tracing::info!(
                process_id = %process.id,
                slot = %slot.id,
                requirement = ?slot.requirement,
                "Slot rejected"
            );
        }

        if slots
            .iter()
            .any(|s| s.is_mandatory() && s.status == SlotStatus::Rejected)
        {
            return self
                .close(&process, &slots, ProcessUpdate::Reject { at: now })
                .await;
        }
        if Progress::from_slots(&slots).is_complete() {
            let composite_hash = chain_head_through(&process, &committed, u32::MAX);
            return self
                .close(
                    &process,
                    &slots,
                    ProcessUpdate::Complete {
                        composite_hash,
                        at: now,
                    },
                )
                .await;
        }
        Ok(process)
    }

    /// Record the closing event of a terminal process whose ledger lacks it.
    async fn settle_closed(
        &self,
        process: &SigningProcess,
        slots: &[SignerSlot],
        ledger: &[AuditEvent],
    ) -> SigningResult<()> {
        let Some(event) = closing_event(process, slots) else {
            return Ok(());
        };
        if ledger.iter().any(|e| e.kind == event.kind) {
            return Ok(());
        }
        self.audit(event).await?;
        self.publish(&process.id, ProcessStatus::InProgress, process.status, process.updated_at);
        tracing::info!(process_id = %process.id, status = %process.status, "Closing event recorded");
        Ok(())
    }

    /// Chain links and stored records of every committed slot, in commit
    /// order.
    async fn committed_records(
        &self,
        slots: &[SignerSlot],
    ) -> SigningResult<Vec<(ChainLink, ArtifactRecord)>> {
        let mut committed = Vec::new();
        for slot in slots.iter().filter(|s| s.is_committed()) {
            let artifact_id = slot.committed_artifact_id.as_ref().ok_or_else(|| {
                StorageError::InvariantViolation(format!(
                    "committed slot {} has no artifact",
                    slot.id
                ))
            })?;
            let record = self
                .storage
                .get_artifact(artifact_id)
                .await?
                .ok_or_else(|| {
                    StorageError::NotFound(format!("artifact {} not found", artifact_id))
                })?;
            let link = ChainLink::for_slot(slot, record.artifact_hash).ok_or_else(|| {
                StorageError::InvariantViolation(format!(
                    "committed slot {} has no commit index",
                    slot.id
                ))
            })?;
            committed.push((link, record));
        }
        committed.sort_by_key(|(link, _)| link.commit_index);
        Ok(committed)
    }

    /// Move an InProgress process to a terminal status and ledger it.
    async fn close(
        &self,
        process: &SigningProcess,
        slots: &[SignerSlot],
        update: ProcessUpdate,
    ) -> SigningResult<SigningProcess> {
        let closed = self
            .storage
            .transition_process(&process.id, ProcessStatus::InProgress, update)
            .await?;
        if let Some(event) = closing_event(&closed, slots) {
            self.audit(event).await?;
        }
        self.publish(&closed.id, process.status, closed.status, closed.updated_at);
        self.locks.forget(&closed.id);

        match closed.status {
            ProcessStatus::Completed => tracing::info!(
                process_id = %closed.id,
                composite_hash = %closed.chain_head,
                "Signing process completed"
            ),
            ProcessStatus::Rejected => {
                tracing::info!(process_id = %closed.id, "Signing process rejected")
            }
            _ => tracing::info!(
                process_id = %closed.id,
                due_at = %closed.due_at,
                "Signing process expired"
            ),
        }
        Ok(closed)
    }

    async fn audit(&self, event: AuditAppend) -> SigningResult<AuditEvent> {
        Ok(self.storage.append_audit(event).await?)
    }

    fn publish(
        &self,
        process_id: &ProcessId,
        old_status: ProcessStatus,
        new_status: ProcessStatus,
        timestamp: DateTime<Utc>,
    ) {
        self.events.publish(StatusChangeEvent {
            process_id: process_id.clone(),
            old_status,
            new_status,
            timestamp,
        });
    }
}

fn ensure_not_terminal(process: &SigningProcess) -> SigningResult<()> {
    if process.is_terminal() {
        tracing::warn!(process_id = %process.id, status = %process.status, "Process is terminal");
        return Err(SigningError::ProcessTerminal {
            process_id: process.id.clone(),
            status: process.status,
        });
    }
    Ok(())
}

/// Ledger entry that records how a terminal process closed.
fn closing_event(process: &SigningProcess, slots: &[SignerSlot]) -> Option<AuditAppend> {
    let at = process.closed_at.unwrap_or(process.updated_at);
    let event = match process.status {
        ProcessStatus::Draft | ProcessStatus::InProgress => return None,
        ProcessStatus::Completed => AuditAppend::new(
            process.id.clone(),
            AuditEventKind::ProcessCompleted,
            SignerId::system(),
            at,
        )
        .with_chain_head(process.composite_hash.unwrap_or(process.chain_head)),
        ProcessStatus::Rejected => {
            let refusal = slots
                .iter()
                .find(|s| s.is_mandatory() && s.status == SlotStatus::Rejected);
            match refusal {
                Some(slot) => AuditAppend::new(
                    process.id.clone(),
                    AuditEventKind::ProcessRejected,
                    slot.signer_id.clone(),
                    at,
                )
                .with_slot(slot.id.clone())
                .with_detail(slot.rejection_reason.clone().unwrap_or_default()),
                None => AuditAppend::new(
                    process.id.clone(),
                    AuditEventKind::ProcessRejected,
                    SignerId::system(),
                    at,
                ),
            }
        }
        ProcessStatus::Expired => AuditAppend::new(
            process.id.clone(),
            AuditEventKind::ProcessExpired,
            SignerId::system(),
            at,
        )
        .with_detail(format!("due {}", process.due_at)),
    };
    Some(event)
}

fn ledgered_slots(ledger: &[AuditEvent], kind: AuditEventKind) -> HashSet<&SlotId> {
    ledger
        .iter()
        .filter(|e| e.kind == kind)
        .filter_map(|e| e.slot_id.as_ref())
        .collect()
}

/// Chain head once every commit up to position `through` is folded in.
fn chain_head_through(
    process: &SigningProcess,
    committed: &[(ChainLink, ArtifactRecord)],
    through: u32,
) -> ContentHash {
    let links = committed
        .iter()
        .filter(|(link, _)| link.commit_index <= through)
        .map(|(link, _)| link.clone())
        .collect();
    ContentHasher::compose(process.mode, &process.content_hash, links)
}

fn find_slot<'a>(
    process_id: &ProcessId,
    slots: &'a [SignerSlot],
    slot_id: &SlotId,
) -> SigningResult<&'a SignerSlot> {
    slots
        .iter()
        .find(|s| &s.id == slot_id)
        .ok_or_else(|| SigningError::SlotNotFound {
            process_id: process_id.clone(),
            slot_id: slot_id.clone(),
        })
}

fn invalid_slot(process_id: &ProcessId, slot_id: &SlotId, reason: impl Into<String>) -> SigningError {
    SigningError::InvalidSlotState {
        process_id: process_id.clone(),
        slot_id: slot_id.clone(),
        reason: reason.into(),
    }
}

/// Reject signer lists no process could complete with.
fn check_signers(mode: SigningMode, signers: &[SignerSpec]) -> SigningResult<()> {
    if !signers
        .iter()
        .any(|s| s.requirement == Requirement::Mandatory)
    {
        return Err(SigningError::InvalidRequest(
            "at least one mandatory signer is required".to_string(),
        ));
    }
    if mode == SigningMode::Hybrid && signers.windows(2).any(|w| w[1].group < w[0].group) {
        return Err(SigningError::InvalidRequest(
            "hybrid groups must occupy contiguous sequence ranges".to_string(),
        ));
    }
    Ok(())
}

fn priority_rank(priority: Priority) -> u8 {
    match priority {
        Priority::Urgent => 0,
        Priority::Normal => 1,
        Priority::Low => 2,
    }
}
