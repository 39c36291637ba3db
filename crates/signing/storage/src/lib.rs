//! Signing storage abstractions.
//!
//! This crate defines the storage contract for the signing engine:
//! - documents (write-once content + bound fingerprint)
//! - signing processes (status and chain head updated by compare-and-swap)
//! - signer slots (Pending → terminal exactly once, by compare-and-swap)
//! - artifacts (write-once)
//! - append-only, hash-linked audit events per process
//!
//! The engine never assumes a particular storage technology; it talks to a
//! [`SigningStorage`] trait object. [`memory::InMemorySigningStorage`] is the
//! deterministic reference adapter.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod traits;

pub use error::{StorageError, StorageResult};
pub use traits::{
    ArtifactStore, AuditStore, DocumentStore, ProcessStore, QueryWindow, SigningStorage,
    SlotStore,
};
