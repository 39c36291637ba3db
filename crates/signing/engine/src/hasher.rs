//! Content Hasher: document fingerprints and the artifact integrity chain
//!
//! The chain starts at the document's content hash and folds one link per
//! committed slot:
//!
//! ```text
//! head' = BLAKE3("sign-chain/v1" ‖ head ‖ sequence_number ‖ len(slot_id) ‖ slot_id ‖ artifact_hash)
//! ```
//!
//! Sequential and hybrid processes fold links in commit order. Parallel
//! processes fold them by ascending sequence number, so the composite does
//! not depend on which signer happened to finish first.

use signing_types::{Artifact, ContentHash, SignerSlot, SigningMode, SlotId};

/// Domain separator for chain links
pub const CHAIN_DOMAIN: &[u8] = b"sign-chain/v1";

/// One committed slot's contribution to the chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainLink {
    pub sequence_number: u32,
    pub slot_id: SlotId,
    /// Position among the process's commits
    pub commit_index: u32,
    pub artifact_hash: ContentHash,
}

impl ChainLink {
    /// Link for a committed slot; `None` while the slot has no commit.
    pub fn for_slot(slot: &SignerSlot, artifact_hash: ContentHash) -> Option<Self> {
        Some(Self {
            sequence_number: slot.sequence_number,
            slot_id: slot.id.clone(),
            commit_index: slot.commit_index?,
            artifact_hash,
        })
    }
}

/// Stateless fingerprint functions.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContentHasher;

impl ContentHasher {
    /// Fingerprint of a document's content. Computed once, when the
    /// document is stored.
    pub fn bind(content: &[u8]) -> ContentHash {
        ContentHash::hash(content)
    }

    /// Fingerprint of a normalized artifact over its canonical JSON encoding.
    pub fn artifact_hash(artifact: &Artifact) -> Result<ContentHash, serde_json::Error> {
        Ok(ContentHash::hash(&serde_json::to_vec(artifact)?))
    }

    /// Fold one link into a running composite.
    pub fn chain(prior: &ContentHash, link: &ChainLink) -> ContentHash {
        let slot_id = link.slot_id.0.as_bytes();
        let mut hasher = blake3::Hasher::new();
        hasher.update(CHAIN_DOMAIN);
        hasher.update(prior.as_bytes());
        hasher.update(&link.sequence_number.to_be_bytes());
        hasher.update(&(slot_id.len() as u32).to_be_bytes());
        hasher.update(slot_id);
        hasher.update(link.artifact_hash.as_bytes());
        ContentHash::from_bytes(*hasher.finalize().as_bytes())
    }

    /// Order links the way `mode` folds them.
    pub fn canonical_order(mode: SigningMode, links: &mut [ChainLink]) {
        match mode {
            SigningMode::Parallel => links.sort_by_key(|l| l.sequence_number),
            SigningMode::Sequential | SigningMode::Hybrid => {
                links.sort_by_key(|l| (l.commit_index, l.sequence_number))
            }
        }
    }

    /// Composite over every link, starting from the content hash.
    pub fn compose(
        mode: SigningMode,
        content_hash: &ContentHash,
        mut links: Vec<ChainLink>,
    ) -> ContentHash {
        Self::canonical_order(mode, &mut links);
        links
            .iter()
            .fold(*content_hash, |head, link| Self::chain(&head, link))
    }
}
