//! Signing domain types
//!
//! A signing process ties one immutable [`Document`] to an ordered list of
//! [`SignerSlot`]s. Each slot is filled at most once by a committed
//! [`Artifact`] (a hand-drawn signature or a seal), and every state change
//! is written to an append-only, hash-linked [`AuditEvent`] ledger.
//!
//! # Key Concepts
//!
//! - **Document**: content blob plus the [`ContentHash`] bound when the first
//!   process for it was created. Never mutated afterwards.
//! - **SigningProcess**: the workflow instance. Its [`SigningMode`] decides
//!   which slots may act at any moment.
//! - **SignerSlot**: one participant's required (or optional) action.
//!   Transitions from Pending to a terminal status exactly once.
//! - **Artifact**: the evidence committed for a slot. Tagged variant, matched
//!   exhaustively wherever it is validated or hashed.
//! - **AuditEvent**: write-once ledger record replayed by verification.
//!
//! # Design Principles
//!
//! 1. Records are referentially linked, never embedded copies.
//! 2. Terminal states have no outgoing transitions.
//! 3. Integrity failures are results, not faults.

#![deny(unsafe_code)]

mod artifact;
mod audit;
mod document;
mod errors;
mod hash;
mod ids;
mod process;
mod slot;

pub use artifact::*;
pub use audit::*;
pub use document::*;
pub use errors::*;
pub use hash::*;
pub use ids::*;
pub use process::*;
pub use slot::*;
