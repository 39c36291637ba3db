//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use signing_engine::{CommitRequest, EngineConfig, SigningEngine};
use signing_storage::memory::InMemorySigningStorage;
use signing_types::*;
use std::sync::Arc;

pub const MIB: usize = 1024 * 1024;

pub fn engine() -> (Arc<InMemorySigningStorage>, SigningEngine) {
    let storage = Arc::new(InMemorySigningStorage::new());
    let engine = SigningEngine::new(storage.clone(), EngineConfig::default());
    (storage, engine)
}

pub fn contract(body: &[u8]) -> DocumentInput {
    DocumentInput::upload("Service contract", "application/pdf", body.to_vec())
}

pub async fn start(
    engine: &SigningEngine,
    mode: SigningMode,
    signers: Vec<SignerSpec>,
) -> ProcessId {
    start_with(engine, contract(b"%PDF-1.7 service contract"), mode, signers).await
}

pub async fn start_with(
    engine: &SigningEngine,
    document: DocumentInput,
    mode: SigningMode,
    signers: Vec<SignerSpec>,
) -> ProcessId {
    engine
        .create_process(
            document,
            signers,
            mode,
            Utc::now() + Duration::days(2),
            ProcessMetadata::new("initiator").with_priority(Priority::Urgent),
        )
        .await
        .expect("process created")
}

pub fn mandatory(names: &[&str]) -> Vec<SignerSpec> {
    names.iter().map(|n| SignerSpec::mandatory(*n)).collect()
}

/// A short visible stroke; `seed` varies the ink so artifacts differ.
pub fn signature(seed: u32) -> ArtifactCandidate {
    let s = seed as f64;
    ArtifactCandidate::Signature(SignatureCandidate {
        points: vec![
            StrokePoint::new(10.0 + s, 20.0, 0),
            StrokePoint::new(40.0 + s, 35.0, 16),
            StrokePoint::new(80.0, 22.0 + s, 32),
        ],
        surface: CaptureSurface::unscaled(600.0, 200.0),
        stroke_width: 2,
        stroke_color: "#1a365d".to_string(),
        raster_image: RasterImage::new("image/png", vec![seed as u8; 128]),
    })
}

pub fn preset_seal(preset: &str) -> ArtifactCandidate {
    ArtifactCandidate::Seal(SealCandidate {
        source: SealSource::Preset {
            preset_id: preset.to_string(),
        },
        raster_image: None,
        label: String::new(),
    })
}

pub fn uploaded_seal(media_type: &str, size: usize) -> ArtifactCandidate {
    ArtifactCandidate::Seal(SealCandidate {
        source: SealSource::Uploaded,
        raster_image: Some(RasterImage::new(media_type, vec![0x89; size])),
        label: "Contract seal".to_string(),
    })
}

pub fn slot(n: u32) -> SlotId {
    SlotId::for_sequence(n)
}

pub async fn sign(
    engine: &SigningEngine,
    process_id: &ProcessId,
    n: u32,
    signer: &str,
) -> signing_engine::SigningResult<SlotCommitResult> {
    engine
        .commit_slot(process_id, &slot(n), CommitRequest::new(signer, signature(n)))
        .await
}

pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}
