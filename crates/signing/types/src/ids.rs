//! Identifiers for signing records

use serde::{Deserialize, Serialize};
use std::fmt;

// ── Process ──────────────────────────────────────────────────────────

/// Unique identifier for a signing process
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessId(pub String);

impl ProcessId {
    pub fn generate() -> Self {
        Self(format!("proc-{}", uuid::Uuid::new_v4()))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..13.min(self.0.len())]
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Document ─────────────────────────────────────────────────────────

/// Unique identifier for a document
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn generate() -> Self {
        Self(format!("doc-{}", uuid::Uuid::new_v4()))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Slot ─────────────────────────────────────────────────────────────

/// Identifier of a signer slot, unique within its process.
///
/// Derived from the slot's sequence number so that the same position in
/// two processes carries the same identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub String);

impl SlotId {
    pub fn for_sequence(sequence_number: u32) -> Self {
        Self(format!("slot-{}", sequence_number))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Signer ───────────────────────────────────────────────────────────

/// Identity of a signing party (or any actor recorded in the audit ledger)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignerId(pub String);

impl SignerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Actor used for transitions the engine performs on its own behalf.
    pub fn system() -> Self {
        Self("system".to_string())
    }
}

impl fmt::Display for SignerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Artifact ─────────────────────────────────────────────────────────

/// Unique identifier for a committed artifact
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactId(pub String);

impl ArtifactId {
    pub fn generate() -> Self {
        Self(format!("art-{}", uuid::Uuid::new_v4()))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_prefixed_and_unique() {
        let a = ProcessId::generate();
        let b = ProcessId::generate();
        assert!(a.0.starts_with("proc-"));
        assert_ne!(a, b);
        assert!(a.short().len() <= 13);

        assert!(DocumentId::generate().0.starts_with("doc-"));
        assert!(ArtifactId::generate().0.starts_with("art-"));
    }

    #[test]
    fn test_slot_id_follows_sequence() {
        assert_eq!(SlotId::for_sequence(3), SlotId::new("slot-3"));
        assert_eq!(format!("{}", SlotId::for_sequence(1)), "slot-1");
    }
}
