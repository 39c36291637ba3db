//! Engine configuration: validation limits and the preset seal registry

use serde::{Deserialize, Serialize};

const MIB: usize = 1024 * 1024;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Artifact and source document limits
    #[serde(default)]
    pub limits: ValidationLimits,

    /// Preset seals a signer may apply without uploading an image
    #[serde(default = "default_presets")]
    pub presets: Vec<PresetSeal>,

    /// Capacity of the status-change broadcast channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: ValidationLimits::default(),
            presets: default_presets(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl EngineConfig {
    /// Look up a registered preset seal
    pub fn preset(&self, id: &str) -> Option<&PresetSeal> {
        self.presets.iter().find(|p| p.id == id)
    }
}

/// Size, media type and stroke limits applied by the validator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationLimits {
    /// Maximum raster image size for seals and signature renderings
    #[serde(default = "default_image_max_bytes")]
    pub image_max_bytes: usize,

    /// Maximum size of an uploaded source document
    #[serde(default = "default_source_max_bytes")]
    pub source_max_bytes: usize,

    /// Accepted raster image media types
    #[serde(default = "default_raster_media_types")]
    pub raster_media_types: Vec<String>,

    /// Accepted source document media types
    #[serde(default = "default_source_media_types")]
    pub source_media_types: Vec<String>,

    #[serde(default = "default_min_stroke_width")]
    pub min_stroke_width: u32,

    #[serde(default = "default_max_stroke_width")]
    pub max_stroke_width: u32,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            image_max_bytes: default_image_max_bytes(),
            source_max_bytes: default_source_max_bytes(),
            raster_media_types: default_raster_media_types(),
            source_media_types: default_source_media_types(),
            min_stroke_width: default_min_stroke_width(),
            max_stroke_width: default_max_stroke_width(),
        }
    }
}

/// A registered preset seal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetSeal {
    pub id: String,
    pub label: String,
}

impl PresetSeal {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

// Default value helpers
fn default_image_max_bytes() -> usize {
    5 * MIB
}

fn default_source_max_bytes() -> usize {
    10 * MIB
}

fn default_raster_media_types() -> Vec<String> {
    ["image/png", "image/jpeg", "image/gif", "image/webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_source_media_types() -> Vec<String> {
    [
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_min_stroke_width() -> u32 {
    1
}

fn default_max_stroke_width() -> u32 {
    10
}

fn default_presets() -> Vec<PresetSeal> {
    vec![
        PresetSeal::new("company", "Company Seal"),
        PresetSeal::new("contract", "Contract Seal"),
        PresetSeal::new("finance", "Finance Seal"),
        PresetSeal::new("personal", "Personal Seal"),
    ]
}

fn default_event_capacity() -> usize {
    1024
}
