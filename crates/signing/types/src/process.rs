//! Signing processes: the workflow instance and its read models

use crate::{ContentHash, DocumentId, ProcessId, SignerId, SignerSlot, SlotId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Mode ─────────────────────────────────────────────────────────────

/// Ordering discipline governing which slots may act
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SigningMode {
    /// One slot at a time, lowest sequence number first
    #[default]
    Sequential,
    /// Every pending slot at once
    Parallel,
    /// Ordered groups; parallel within a group
    Hybrid,
}

impl fmt::Display for SigningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
            Self::Hybrid => write!(f, "hybrid"),
        }
    }
}

// ── Status ───────────────────────────────────────────────────────────

/// Lifecycle state of a signing process
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// Being authored; signers may still be added
    #[default]
    Draft,
    /// Open for signing
    InProgress,
    /// Every mandatory slot committed; composite hash sealed
    Completed,
    /// A mandatory signer refused
    Rejected,
    /// Due date passed while still in progress
    Expired,
}

impl ProcessStatus {
    /// Completed, Rejected and Expired have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Expired)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Rejected => write!(f, "rejected"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Urgency shown to signers in their task inbox
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    #[default]
    Normal,
    Low,
}

/// Caller-supplied descriptive fields of a new process
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMetadata {
    /// Defaults to the document title when absent
    #[serde(default)]
    pub title: Option<String>,
    pub initiator: SignerId,
    #[serde(default)]
    pub priority: Priority,
}

impl ProcessMetadata {
    pub fn new(initiator: impl Into<String>) -> Self {
        Self {
            title: None,
            initiator: SignerId::new(initiator),
            priority: Priority::Normal,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

// ── Process record ───────────────────────────────────────────────────

/// A signing process record. Slots are stored as separate records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningProcess {
    pub id: ProcessId,
    pub document_id: DocumentId,
    pub title: String,
    pub initiator: SignerId,
    pub priority: Priority,
    pub mode: SigningMode,
    pub due_at: DateTime<Utc>,
    pub status: ProcessStatus,
    /// Copy of the document's bound fingerprint; the chain starts here
    pub content_hash: ContentHash,
    /// Running composite over the artifacts committed so far
    pub chain_head: ContentHash,
    /// Number of committed slots
    pub commit_count: u32,
    /// Sealed composite; present only once Completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite_hash: Option<ContentHash>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl SigningProcess {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_sealed(&self) -> bool {
        self.composite_hash.is_some()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.due_at
    }
}

/// A state change applied to a process by compare-and-swap.
///
/// Storage applies the update only when the stored status equals the
/// expected one (and, for `AdvanceChain`, the commit count matches).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ProcessUpdate {
    Start {
        at: DateTime<Utc>,
    },
    AdvanceChain {
        expected_commit_count: u32,
        chain_head: ContentHash,
        at: DateTime<Utc>,
    },
    Complete {
        composite_hash: ContentHash,
        at: DateTime<Utc>,
    },
    Reject {
        at: DateTime<Utc>,
    },
    Expire {
        at: DateTime<Utc>,
    },
}

impl ProcessUpdate {
    /// Status the process holds after the update.
    pub fn target_status(&self, current: ProcessStatus) -> ProcessStatus {
        match self {
            Self::Start { .. } => ProcessStatus::InProgress,
            Self::AdvanceChain { .. } => current,
            Self::Complete { .. } => ProcessStatus::Completed,
            Self::Reject { .. } => ProcessStatus::Rejected,
            Self::Expire { .. } => ProcessStatus::Expired,
        }
    }

    /// Apply to a process. The caller has already checked the expectations.
    pub fn apply(self, process: &mut SigningProcess) {
        process.status = self.target_status(process.status);
        match self {
            Self::Start { at } => process.updated_at = at,
            Self::AdvanceChain { chain_head, at, .. } => {
                process.chain_head = chain_head;
                process.commit_count += 1;
                process.updated_at = at;
            }
            Self::Complete { composite_hash, at } => {
                process.composite_hash = Some(composite_hash);
                process.updated_at = at;
                process.closed_at = Some(at);
            }
            Self::Reject { at } | Self::Expire { at } => {
                process.updated_at = at;
                process.closed_at = Some(at);
            }
        }
    }
}

// ── Read models ──────────────────────────────────────────────────────

/// committedMandatory / totalMandatory
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Progress {
    pub committed_mandatory: u32,
    pub total_mandatory: u32,
}

impl Progress {
    pub fn from_slots(slots: &[SignerSlot]) -> Self {
        let mandatory = slots.iter().filter(|s| s.is_mandatory());
        let (mut committed, mut total) = (0, 0);
        for slot in mandatory {
            total += 1;
            if slot.is_committed() {
                committed += 1;
            }
        }
        Self {
            committed_mandatory: committed,
            total_mandatory: total,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_mandatory > 0 && self.committed_mandatory == self.total_mandatory
    }

    /// Fraction in `[0, 1]`; an empty process reports 0.
    pub fn ratio(&self) -> f64 {
        if self.total_mandatory == 0 {
            return 0.0;
        }
        self.committed_mandatory as f64 / self.total_mandatory as f64
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.committed_mandatory, self.total_mandatory)
    }
}

/// Answer to `getStatus`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessStatusView {
    pub process_id: ProcessId,
    pub status: ProcessStatus,
    pub progress: Progress,
    pub eligible_slots: Vec<SignerSlot>,
    pub due_at: DateTime<Utc>,
}

/// Outcome of a successful `commitSlot`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCommitResult {
    pub process_id: ProcessId,
    pub slot_id: SlotId,
    pub artifact_id: crate::ArtifactId,
    pub artifact_hash: ContentHash,
    pub chain_head: ContentHash,
    pub progress: Progress,
    /// Status after the commit (Completed when this was the last mandatory slot)
    pub status: ProcessStatus,
}

/// Emitted on every process status change for the notification layer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeEvent {
    pub process_id: ProcessId,
    pub old_status: ProcessStatus,
    pub new_status: ProcessStatus,
    pub timestamp: DateTime<Utc>,
}

/// One entry of a signer's inbox: a slot that signer can act on now
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerTask {
    pub process_id: ProcessId,
    pub title: String,
    pub priority: Priority,
    pub due_at: DateTime<Utc>,
    pub slot: SignerSlot,
}

/// Listing filter for processes
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProcessFilter {
    pub status: Option<ProcessStatus>,
    pub document_id: Option<DocumentId>,
    pub limit: Option<usize>,
}

impl ProcessFilter {
    pub fn matches(&self, process: &SigningProcess) -> bool {
        if let Some(status) = self.status {
            if process.status != status {
                return false;
            }
        }
        if let Some(ref document_id) = self.document_id {
            if &process.document_id != document_id {
                return false;
            }
        }
        true
    }
}

// ── Verification ─────────────────────────────────────────────────────

/// Where a recomputed fingerprint first diverged
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum MismatchLocation {
    /// The stored document content no longer matches its bound hash
    Document { document_id: DocumentId },
    /// A committed slot's artifact, or its position in the chain, diverged
    Slot {
        slot_id: SlotId,
        sequence_number: u32,
    },
    /// Every step replayed cleanly but the sealed composite differs
    Composite,
}

/// Answer to `verify`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub process_id: ProcessId,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mismatch_at: Option<MismatchLocation>,
    /// Whether a sealed composite was compared (false before completion)
    pub sealed: bool,
    /// Composite recomputed from storage
    pub recomputed_hash: ContentHash,
    /// Value the recomputation was compared against
    pub expected_hash: ContentHash,
}

impl VerificationResult {
    pub fn is_tampered(&self) -> bool {
        !self.verified
    }
}
