//! Signing process engine
//!
//! Tracks which parties must sign a document, in what order, validates the
//! signature and seal artifacts they produce, and binds every committed
//! artifact into an integrity chain that can be re-verified later.
//!
//! # Architecture
//!
//! The [`SigningEngine`] composes specialized components:
//!
//! - [`ArtifactValidator`] - Validates and normalizes signature/seal submissions
//! - [`ContentHasher`] - Binds document fingerprints and folds artifact hashes
//! - [`SlotResolver`] - Decides which slots may act under the signing mode
//! - [`VerificationService`] - Replays the chain to detect tampering
//! - [`EventBus`] - Broadcasts status changes to the notification layer
//!
//! The engine owns no timers and no background tasks. Every state change
//! happens inside a caller's request, under a per-process lock, and is
//! persisted through a [`signing_storage::SigningStorage`] backend.
//!
//! # Example
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use signing_engine::SigningEngine;
//! use signing_types::*;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let engine = SigningEngine::in_memory();
//! let process_id = engine
//!     .create_process(
//!         DocumentInput::upload("NDA", "application/pdf", b"%PDF-1.7 ...".to_vec()),
//!         vec![SignerSpec::mandatory("alice"), SignerSpec::mandatory("bob")],
//!         SigningMode::Sequential,
//!         Utc::now() + Duration::days(2),
//!         ProcessMetadata::new("initiator"),
//!     )
//!     .await
//!     .unwrap();
//!
//! let status = engine.get_status(&process_id).await.unwrap();
//! assert_eq!(status.status, ProcessStatus::InProgress);
//! assert_eq!(status.eligible_slots.len(), 1);
//! # });
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod hasher;
pub mod resolver;
pub mod validator;
pub mod verification;

pub use config::{EngineConfig, PresetSeal, ValidationLimits};
pub use engine::{CommitRequest, SigningEngine};
pub use error::{SigningError, SigningResult};
pub use events::EventBus;
pub use hasher::{ChainLink, ContentHasher};
pub use resolver::SlotResolver;
pub use validator::{ArtifactValidator, ValidArtifact};
pub use verification::VerificationService;
