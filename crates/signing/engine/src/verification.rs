//! Verification Service: has this signed document been tampered with?
//!
//! Verification replays everything from storage and never writes. It
//! checks, in order:
//!
//! 1. the document content against its bound fingerprint,
//! 2. the audit ledger's hash links,
//! 3. each commit in ledger order: the slot still points at an artifact
//!    whose recomputed hash matches what was recorded, the slot holds its
//!    recorded commit position, and the replayed chain head matches the
//!    head audited at that commit,
//! 4. the recomputed composite against the sealed value (or the running
//!    chain head of an unfinished process).
//!
//! The first divergence found is reported. A mismatch is a result, not an
//! error.

use crate::error::{SigningError, SigningResult};
use crate::hasher::{ChainLink, ContentHasher};
use signing_storage::SigningStorage;
use signing_types::{
    AuditEvent, AuditEventKind, ContentHash, MismatchLocation, ProcessId, SignerSlot,
    SigningProcess, VerificationResult,
};
use std::sync::Arc;

/// Replays a process's integrity chain from storage.
#[derive(Clone)]
pub struct VerificationService {
    storage: Arc<dyn SigningStorage>,
}

impl VerificationService {
    pub fn new(storage: Arc<dyn SigningStorage>) -> Self {
        Self { storage }
    }

    pub async fn verify(&self, process_id: &ProcessId) -> SigningResult<VerificationResult> {
        let process = self
            .storage
            .get_process(process_id)
            .await?
            .ok_or_else(|| SigningError::ProcessNotFound(process_id.clone()))?;
        let document = self
            .storage
            .get_document(&process.document_id)
            .await?
            .ok_or_else(|| SigningError::DocumentNotFound(process.document_id.clone()))?;
        let slots = self.storage.list_slots(process_id).await?;
        let ledger = self.storage.list_audit(process_id).await?;

        let mut mismatch = None;

        let content_hash = ContentHasher::bind(&document.content);
        if content_hash != process.content_hash || document.content_hash != process.content_hash {
            mismatch = Some(MismatchLocation::Document {
                document_id: document.id.clone(),
            });
        }

        if mismatch.is_none() {
            mismatch = broken_ledger_link(&ledger, &slots);
        }

        // Replay commits in ledger order, collecting recomputed links.
        let mut replayed: Vec<ChainLink> = Vec::new();
        let commits = ledger
            .iter()
            .filter(|e| e.kind == AuditEventKind::SlotCommitted);
        for (position, event) in commits.enumerate() {
            let slot = event
                .slot_id
                .as_ref()
                .and_then(|id| slots.iter().find(|s| &s.id == id));
            let Some(slot) = slot else {
                mismatch = mismatch.or(Some(MismatchLocation::Composite));
                continue;
            };

            let recomputed = self.recompute_artifact_hash(slot).await?;
            let link = recomputed.and_then(|hash| ChainLink::for_slot(slot, hash));
            let Some(link) = link else {
                mismatch = mismatch.or_else(|| Some(slot_location(slot)));
                continue;
            };

            let artifact_intact = Some(link.artifact_hash) == event.artifact_hash
                && self.stored_artifact_hash(slot).await? == Some(link.artifact_hash);
            let position_intact = link.commit_index as usize == position;
            replayed.push(link);
            let head_intact = event.chain_head
                == Some(ContentHasher::compose(
                    process.mode,
                    &process.content_hash,
                    replayed.clone(),
                ));

            if !(artifact_intact && position_intact && head_intact) {
                mismatch = mismatch.or_else(|| Some(slot_location(slot)));
            }
        }

        // Committed slots the ledger never saw
        if let Some(stray) = slots.iter().find(|s| {
            s.is_committed() && !replayed.iter().any(|l| l.slot_id == s.id)
        }) {
            mismatch = mismatch.or_else(|| Some(slot_location(stray)));
        }

        let recomputed_hash = self.recompute_composite(&process, &slots, &content_hash).await?;
        let expected_hash = process.composite_hash.unwrap_or(process.chain_head);
        if recomputed_hash != expected_hash {
            mismatch = mismatch.or(Some(MismatchLocation::Composite));
        }

        let verified = mismatch.is_none();
        if verified {
            tracing::info!(process_id = %process_id, sealed = process.is_sealed(), "Process verified");
        } else {
            tracing::warn!(process_id = %process_id, mismatch = ?mismatch, "Integrity mismatch");
        }

        Ok(VerificationResult {
            process_id: process.id.clone(),
            verified,
            mismatch_at: mismatch,
            sealed: process.is_sealed(),
            recomputed_hash,
            expected_hash,
        })
    }

    /// Hash of the slot's artifact as it is stored now.
    async fn recompute_artifact_hash(&self, slot: &SignerSlot) -> SigningResult<Option<ContentHash>> {
        let Some(artifact_id) = slot.committed_artifact_id.as_ref() else {
            return Ok(None);
        };
        let Some(record) = self.storage.get_artifact(artifact_id).await? else {
            return Ok(None);
        };
        if record.slot_id != slot.id {
            return Ok(None);
        }
        let hash = ContentHasher::artifact_hash(&record.artifact)
            .map_err(|e| signing_storage::StorageError::Serialization(e.to_string()))?;
        Ok(Some(hash))
    }

    /// Hash recorded with the artifact at commit time.
    async fn stored_artifact_hash(&self, slot: &SignerSlot) -> SigningResult<Option<ContentHash>> {
        let Some(artifact_id) = slot.committed_artifact_id.as_ref() else {
            return Ok(None);
        };
        Ok(self
            .storage
            .get_artifact(artifact_id)
            .await?
            .map(|r| r.artifact_hash))
    }

    /// Full composite from current storage contents.
    async fn recompute_composite(
        &self,
        process: &SigningProcess,
        slots: &[SignerSlot],
        content_hash: &ContentHash,
    ) -> SigningResult<ContentHash> {
        let mut links = Vec::new();
        for slot in slots.iter().filter(|s| s.is_committed()) {
            if let Some(hash) = self.recompute_artifact_hash(slot).await? {
                if let Some(link) = ChainLink::for_slot(slot, hash) {
                    links.push(link);
                }
            }
        }
        Ok(ContentHasher::compose(process.mode, content_hash, links))
    }
}

fn slot_location(slot: &SignerSlot) -> MismatchLocation {
    MismatchLocation::Slot {
        slot_id: slot.id.clone(),
        sequence_number: slot.sequence_number,
    }
}

/// First ledger event whose hash or back-link no longer checks out.
fn broken_ledger_link(ledger: &[AuditEvent], slots: &[SignerSlot]) -> Option<MismatchLocation> {
    let mut previous: Option<ContentHash> = None;
    for event in ledger {
        let intact = event.previous_hash == previous
            && event.recompute_hash().map(|h| h == event.hash).unwrap_or(false);
        if !intact {
            let slot = event
                .slot_id
                .as_ref()
                .filter(|_| event.kind == AuditEventKind::SlotCommitted)
                .and_then(|id| slots.iter().find(|s| &s.id == id));
            return Some(slot.map(slot_location).unwrap_or(MismatchLocation::Composite));
        }
        previous = Some(event.hash);
    }
    None
}
