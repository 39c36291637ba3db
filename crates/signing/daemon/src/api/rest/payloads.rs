//! Wire payloads for the REST API
//!
//! Binary content (documents, raster images) travels as standard base64.
//! Everything else maps one-to-one onto the engine's types.

use crate::error::{ApiError, ApiResult};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signing_types::{
    ArtifactCandidate, CaptureSurface, DocumentId, DocumentInput, Priority, ProcessId,
    ProcessMetadata, ProcessStatus, ProcessStatusView, RasterImage, SealCandidate, SealSource,
    SignatureCandidate, SignerSpec, SigningMode, SlotId, StrokePoint,
};

fn decode(field: &str, encoded: &str) -> ApiResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| ApiError::BadRequest(format!("{} is not valid base64: {}", field, e)))
}

/// Raster image with base64 data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterPayload {
    pub media_type: String,
    pub data_base64: String,
}

impl RasterPayload {
    fn into_image(self, field: &str) -> ApiResult<RasterImage> {
        Ok(RasterImage::new(self.media_type, decode(field, &self.data_base64)?))
    }
}

/// Document named by a create request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentPayload {
    Upload {
        title: String,
        media_type: String,
        content_base64: String,
    },
    Existing {
        document_id: String,
    },
}

impl DocumentPayload {
    pub fn into_input(self) -> ApiResult<DocumentInput> {
        match self {
            DocumentPayload::Upload {
                title,
                media_type,
                content_base64,
            } => Ok(DocumentInput::upload(
                title,
                media_type,
                decode("document.content_base64", &content_base64)?,
            )),
            DocumentPayload::Existing { document_id } => {
                Ok(DocumentInput::existing(DocumentId::new(document_id)))
            }
        }
    }
}

/// Create process request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProcessRequest {
    pub document: DocumentPayload,
    pub signers: Vec<SignerSpec>,
    #[serde(default)]
    pub mode: SigningMode,
    pub due_at: DateTime<Utc>,
    pub initiator: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

impl CreateProcessRequest {
    pub fn metadata(&self) -> ProcessMetadata {
        let metadata = ProcessMetadata::new(self.initiator.clone()).with_priority(self.priority);
        match &self.title {
            Some(title) => metadata.with_title(title.clone()),
            None => metadata,
        }
    }
}

/// Create process response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProcessResponse {
    pub process_id: ProcessId,
    pub document_id: DocumentId,
    pub status: ProcessStatusView,
}

/// Artifact candidate with base64 rasters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CandidatePayload {
    Signature {
        points: Vec<StrokePoint>,
        surface: CaptureSurface,
        stroke_width: u32,
        stroke_color: String,
        raster_image: RasterPayload,
    },
    Seal {
        source: SealSource,
        #[serde(default)]
        raster_image: Option<RasterPayload>,
        #[serde(default)]
        label: String,
    },
}

impl CandidatePayload {
    pub fn into_candidate(self) -> ApiResult<ArtifactCandidate> {
        match self {
            CandidatePayload::Signature {
                points,
                surface,
                stroke_width,
                stroke_color,
                raster_image,
            } => Ok(ArtifactCandidate::Signature(SignatureCandidate {
                points,
                surface,
                stroke_width,
                stroke_color,
                raster_image: raster_image.into_image("candidate.raster_image")?,
            })),
            CandidatePayload::Seal {
                source,
                raster_image,
                label,
            } => Ok(ArtifactCandidate::Seal(SealCandidate {
                source,
                raster_image: raster_image
                    .map(|r| r.into_image("candidate.raster_image"))
                    .transpose()?,
                label,
            })),
        }
    }
}

/// Commit slot request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSlotRequest {
    pub actor: String,
    pub candidate: CandidatePayload,
    /// Falls back to the `Idempotency-Key` header when absent
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Reject slot request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectSlotRequest {
    #[serde(default)]
    pub reason: String,
}

/// Status after a reject or expiry evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub process_id: ProcessId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<SlotId>,
    pub status: ProcessStatus,
}
