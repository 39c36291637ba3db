//! Signer slots: one participant's action within a process

use crate::{ArtifactId, SignerId, SlotId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether completion waits for this slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    #[default]
    Mandatory,
    Optional,
}

/// Status of a signer slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// Waiting for the signer
    #[default]
    Pending,
    /// An artifact was committed
    Committed,
    /// The signer refused
    Rejected,
}

impl SlotStatus {
    /// Committed and Rejected are final; a slot is never reopened.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Rejected)
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Committed => write!(f, "committed"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A signer as named by the caller when building a process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerSpec {
    pub signer_id: SignerId,
    #[serde(default)]
    pub requirement: Requirement,
    /// Group number for hybrid processes; ignored by the other modes
    #[serde(default)]
    pub group: u32,
}

impl SignerSpec {
    pub fn mandatory(signer_id: impl Into<String>) -> Self {
        Self {
            signer_id: SignerId::new(signer_id),
            requirement: Requirement::Mandatory,
            group: 0,
        }
    }

    pub fn optional(signer_id: impl Into<String>) -> Self {
        Self {
            signer_id: SignerId::new(signer_id),
            requirement: Requirement::Optional,
            group: 0,
        }
    }

    pub fn in_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }
}

/// One required participant of a signing process
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerSlot {
    pub id: SlotId,
    /// Unique within the process; defines order for sequential and hybrid modes
    pub sequence_number: u32,
    /// Hybrid group; groups occupy contiguous sequence-number ranges
    pub group: u32,
    pub signer_id: SignerId,
    pub requirement: Requirement,
    pub status: SlotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed_artifact_id: Option<ArtifactId>,
    /// Position of this commit among the process's commits (0-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_index: Option<u32>,
    /// Caller-supplied key of the request that committed the slot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SignerSlot {
    pub fn new(sequence_number: u32, spec: SignerSpec) -> Self {
        Self {
            id: SlotId::for_sequence(sequence_number),
            sequence_number,
            group: spec.group,
            signer_id: spec.signer_id,
            requirement: spec.requirement,
            status: SlotStatus::Pending,
            committed_artifact_id: None,
            commit_index: None,
            idempotency_key: None,
            rejection_reason: None,
            resolved_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == SlotStatus::Pending
    }

    pub fn is_committed(&self) -> bool {
        self.status == SlotStatus::Committed
    }

    pub fn is_mandatory(&self) -> bool {
        self.requirement == Requirement::Mandatory
    }
}

/// The mutation applied by a slot compare-and-swap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "to", rename_all = "snake_case")]
pub enum SlotTransition {
    Commit {
        artifact_id: ArtifactId,
        commit_index: u32,
        idempotency_key: Option<String>,
        at: DateTime<Utc>,
    },
    Reject {
        reason: String,
        at: DateTime<Utc>,
    },
}

impl SlotTransition {
    pub fn target_status(&self) -> SlotStatus {
        match self {
            Self::Commit { .. } => SlotStatus::Committed,
            Self::Reject { .. } => SlotStatus::Rejected,
        }
    }

    /// Apply to a slot. The caller has already checked the expected status.
    pub fn apply(self, slot: &mut SignerSlot) {
        slot.status = self.target_status();
        match self {
            Self::Commit {
                artifact_id,
                commit_index,
                idempotency_key,
                at,
            } => {
                slot.committed_artifact_id = Some(artifact_id);
                slot.commit_index = Some(commit_index);
                slot.idempotency_key = idempotency_key;
                slot.resolved_at = Some(at);
            }
            Self::Reject { reason, at } => {
                slot.rejection_reason = Some(reason);
                slot.resolved_at = Some(at);
            }
        }
    }
}
