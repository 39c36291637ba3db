//! Slot Resolver: which slots may act right now

use signing_types::{ProcessStatus, SignerSlot, SigningMode, SlotId};

/// Computes slot eligibility from the mode and the current slot states.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlotResolver;

impl SlotResolver {
    /// Pending slots whose ordering constraints are satisfied.
    ///
    /// `slots` must be in ascending sequence-number order. A process that is
    /// not InProgress has no eligible slots.
    pub fn eligible_slots(
        status: ProcessStatus,
        mode: SigningMode,
        slots: &[SignerSlot],
    ) -> Vec<SignerSlot> {
        if status != ProcessStatus::InProgress {
            return Vec::new();
        }
        match mode {
            SigningMode::Sequential => slots
                .iter()
                .find(|s| s.is_pending())
                .cloned()
                .into_iter()
                .collect(),
            SigningMode::Parallel => slots.iter().filter(|s| s.is_pending()).cloned().collect(),
            SigningMode::Hybrid => Self::open_hybrid_slots(slots),
        }
    }

    pub fn is_eligible(
        status: ProcessStatus,
        mode: SigningMode,
        slots: &[SignerSlot],
        slot_id: &SlotId,
    ) -> bool {
        Self::eligible_slots(status, mode, slots)
            .iter()
            .any(|s| &s.id == slot_id)
    }

    /// Explain why a slot is blocked, naming the slot it waits on.
    pub fn blocking_reason(mode: SigningMode, slots: &[SignerSlot], slot: &SignerSlot) -> String {
        let blocker = match mode {
            SigningMode::Sequential => slots
                .iter()
                .find(|s| s.is_pending() && s.sequence_number < slot.sequence_number),
            SigningMode::Hybrid => slots.iter().find(|s| {
                s.group < slot.group && s.is_mandatory() && !s.is_committed()
            }),
            SigningMode::Parallel => None,
        };
        match blocker {
            Some(b) => format!("waiting for {} ({})", b.id, b.signer_id),
            None => format!("slot is {}", slot.status),
        }
    }

    // Groups open in ascending order; a group opens once every mandatory
    // slot of all earlier groups is committed.
    fn open_hybrid_slots(slots: &[SignerSlot]) -> Vec<SignerSlot> {
        let mut groups: Vec<u32> = slots.iter().map(|s| s.group).collect();
        groups.sort_unstable();
        groups.dedup();

        let mut eligible = Vec::new();
        for group in groups {
            let members = slots.iter().filter(|s| s.group == group);
            let mut gate_open = true;
            for slot in members {
                if slot.is_pending() {
                    eligible.push(slot.clone());
                }
                if slot.is_mandatory() && !slot.is_committed() {
                    gate_open = false;
                }
            }
            if !gate_open {
                break;
            }
        }
        tracing::debug!(open = eligible.len(), "Hybrid eligibility resolved");
        eligible
    }
}
