//! Artifacts: the signature or seal evidence committed for a slot
//!
//! Two shapes exist for every artifact: the raw [`ArtifactCandidate`] a
//! signer submits, and the normalized [`Artifact`] that survives validation
//! and is committed. Only the latter is ever hashed or stored.

use crate::{ArtifactId, ContentHash, ProcessId, SignerId, SlotId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Shared pieces ────────────────────────────────────────────────────

/// One sampled point of a hand-drawn stroke.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    /// Milliseconds since the first point of the signature
    pub t_offset_ms: u32,
}

impl StrokePoint {
    pub fn new(x: f64, y: f64, t_offset_ms: u32) -> Self {
        Self { x, y, t_offset_ms }
    }
}

/// An encoded raster image (PNG, JPEG, ...)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterImage {
    pub media_type: String,
    pub data: Vec<u8>,
}

impl RasterImage {
    pub fn new(media_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("media_type", &self.media_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Where a seal image came from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SealSource {
    /// One of the registered preset seals
    Preset { preset_id: String },
    /// An image uploaded by the signer
    Uploaded,
}

/// Discriminant used in logs and audit payloads
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Signature,
    Seal,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signature => write!(f, "signature"),
            Self::Seal => write!(f, "seal"),
        }
    }
}

// ── Candidates ───────────────────────────────────────────────────────

/// Geometry of the surface a signature was drawn on.
///
/// Input devices report positions in displayed (CSS) units while the canvas
/// stores ink in intrinsic units; the two differ whenever the canvas is
/// scaled on screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureSurface {
    pub intrinsic_width: f64,
    pub intrinsic_height: f64,
    pub displayed_width: f64,
    pub displayed_height: f64,
}

impl CaptureSurface {
    /// A surface displayed at its intrinsic size
    pub fn unscaled(width: f64, height: f64) -> Self {
        Self {
            intrinsic_width: width,
            intrinsic_height: height,
            displayed_width: width,
            displayed_height: height,
        }
    }
}

/// A signature as submitted, with points in displayed coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignatureCandidate {
    pub points: Vec<StrokePoint>,
    pub surface: CaptureSurface,
    pub stroke_width: u32,
    pub stroke_color: String,
    pub raster_image: RasterImage,
}

/// A seal as submitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SealCandidate {
    pub source: SealSource,
    /// Required for uploaded seals; presets are rendered from the registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raster_image: Option<RasterImage>,
    #[serde(default)]
    pub label: String,
}

/// Unvalidated submission for a slot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactCandidate {
    Signature(SignatureCandidate),
    Seal(SealCandidate),
}

impl ArtifactCandidate {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::Signature(_) => ArtifactKind::Signature,
            Self::Seal(_) => ArtifactKind::Seal,
        }
    }
}

// ── Normalized artifacts ─────────────────────────────────────────────

/// A validated signature. Points are in canvas (intrinsic) coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignatureArtifact {
    pub points: Vec<StrokePoint>,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub stroke_width: u32,
    pub stroke_color: String,
    pub raster_image: RasterImage,
}

/// A validated seal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SealArtifact {
    pub source: SealSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raster_image: Option<RasterImage>,
    pub label: String,
}

/// The evidence committed for one slot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Artifact {
    Signature(SignatureArtifact),
    Seal(SealArtifact),
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::Signature(_) => ArtifactKind::Signature,
            Self::Seal(_) => ArtifactKind::Seal,
        }
    }
}

/// Persisted, write-once artifact record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: ArtifactId,
    pub process_id: ProcessId,
    pub slot_id: SlotId,
    pub artifact: Artifact,
    /// Fingerprint of `artifact` computed at commit time
    pub artifact_hash: ContentHash,
    pub committed_by: SignerId,
    pub committed_at: DateTime<Utc>,
}
