//! Signing engine error taxonomy

use signing_storage::StorageError;
use signing_types::{DocumentId, ProcessId, ProcessStatus, SlotId, ValidationError};
use thiserror::Error;

/// Errors returned by engine operations.
///
/// Every business condition is a variant here; only `Storage` is an
/// infrastructure failure.
#[derive(Debug, Clone, Error)]
pub enum SigningError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Slot {slot_id} of process {process_id} cannot act: {reason}")]
    InvalidSlotState {
        process_id: ProcessId,
        slot_id: SlotId,
        reason: String,
    },

    #[error("Slot {slot_id} of process {process_id} is already committed")]
    DuplicateCommit {
        process_id: ProcessId,
        slot_id: SlotId,
        /// The stored commit carries the caller's idempotency key
        replay: bool,
    },

    #[error("Process {process_id} is {status}")]
    ProcessTerminal {
        process_id: ProcessId,
        status: ProcessStatus,
    },

    #[error("Process not found: {0}")]
    ProcessNotFound(ProcessId),

    #[error("Slot {slot_id} not found in process {process_id}")]
    SlotNotFound {
        process_id: ProcessId,
        slot_id: SlotId,
    },

    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("Document {document_id} already has open process {process_id}")]
    DocumentBusy {
        document_id: DocumentId,
        process_id: ProcessId,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SigningError {
    /// Only infrastructure failures may be retried automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_retryable())
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::InvalidSlotState { .. } => "INVALID_SLOT_STATE",
            Self::DuplicateCommit { .. } => "DUPLICATE_COMMIT",
            Self::ProcessTerminal { .. } => "PROCESS_TERMINAL",
            Self::ProcessNotFound(_) => "PROCESS_NOT_FOUND",
            Self::SlotNotFound { .. } => "SLOT_NOT_FOUND",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::DocumentBusy { .. } => "DOCUMENT_BUSY",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

/// Result type alias for engine operations
pub type SigningResult<T> = Result<T, SigningError>;
