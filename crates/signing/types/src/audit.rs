//! Append-only audit ledger records

use crate::{ContentHash, ProcessId, SignerId, SlotId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    ProcessCreated,
    SignerAdded,
    ProcessStarted,
    SlotCommitted,
    SlotRejected,
    ProcessCompleted,
    ProcessRejected,
    ProcessExpired,
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProcessCreated => "process_created",
            Self::SignerAdded => "signer_added",
            Self::ProcessStarted => "process_started",
            Self::SlotCommitted => "slot_committed",
            Self::SlotRejected => "slot_rejected",
            Self::ProcessCompleted => "process_completed",
            Self::ProcessRejected => "process_rejected",
            Self::ProcessExpired => "process_expired",
        };
        write!(f, "{}", name)
    }
}

/// Audit append payload. Sequencing and hashes are assigned by storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditAppend {
    pub process_id: ProcessId,
    pub slot_id: Option<SlotId>,
    pub kind: AuditEventKind,
    pub artifact_hash: Option<ContentHash>,
    /// Chain head after the event, for events that move it
    pub chain_head: Option<ContentHash>,
    pub actor_id: SignerId,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditAppend {
    pub fn new(
        process_id: ProcessId,
        kind: AuditEventKind,
        actor_id: SignerId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            process_id,
            slot_id: None,
            kind,
            artifact_hash: None,
            chain_head: None,
            actor_id,
            detail: String::new(),
            timestamp,
        }
    }

    pub fn with_slot(mut self, slot_id: SlotId) -> Self {
        self.slot_id = Some(slot_id);
        self
    }

    pub fn with_artifact_hash(mut self, hash: ContentHash) -> Self {
        self.artifact_hash = Some(hash);
        self
    }

    pub fn with_chain_head(mut self, hash: ContentHash) -> Self {
        self.chain_head = Some(hash);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// Persistent, write-once, hash-linked audit record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    /// Per-process, starting at 1
    pub sequence: u64,
    pub process_id: ProcessId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<SlotId>,
    pub kind: AuditEventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_hash: Option<ContentHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_head: Option<ContentHash>,
    pub actor_id: SignerId,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
    pub previous_hash: Option<ContentHash>,
    pub hash: ContentHash,
}

impl AuditEvent {
    /// Hash of the record body linked to its predecessor.
    pub fn compute_hash(
        append: &AuditAppend,
        sequence: u64,
        previous_hash: Option<&ContentHash>,
    ) -> Result<ContentHash, serde_json::Error> {
        let body = serde_json::json!({
            "previous_hash": previous_hash,
            "sequence": sequence,
            "process_id": append.process_id,
            "slot_id": append.slot_id,
            "kind": append.kind,
            "artifact_hash": append.artifact_hash,
            "chain_head": append.chain_head,
            "actor_id": append.actor_id,
            "detail": append.detail,
            "timestamp": append.timestamp,
        });
        Ok(ContentHash::hash(&serde_json::to_vec(&body)?))
    }

    /// Recompute this record's hash from its own fields.
    pub fn recompute_hash(&self) -> Result<ContentHash, serde_json::Error> {
        let append = AuditAppend {
            process_id: self.process_id.clone(),
            slot_id: self.slot_id.clone(),
            kind: self.kind,
            artifact_hash: self.artifact_hash,
            chain_head: self.chain_head,
            actor_id: self.actor_id.clone(),
            detail: self.detail.clone(),
            timestamp: self.timestamp,
        };
        Self::compute_hash(&append, self.sequence, self.previous_hash.as_ref())
    }
}
