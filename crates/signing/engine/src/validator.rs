//! Artifact Validator: checks and normalizes submissions before commit
//!
//! Validation is pure. A failed check returns a [`ValidationError`] and
//! writes nothing; a successful one yields a [`ValidArtifact`], the only
//! value the engine accepts for a commit.

use crate::config::{EngineConfig, ValidationLimits};
use signing_types::{
    Artifact, ArtifactCandidate, ArtifactKind, CaptureSurface, RasterImage, SealArtifact,
    SealCandidate, SealSource, SignatureArtifact, SignatureCandidate, StrokePoint,
    ValidationError, ValidationResult,
};

/// A normalized artifact that passed validation.
///
/// Can only be built by [`ArtifactValidator::validate`].
#[derive(Clone, Debug, PartialEq)]
pub struct ValidArtifact {
    artifact: Artifact,
}

impl ValidArtifact {
    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    pub fn kind(&self) -> ArtifactKind {
        self.artifact.kind()
    }

    pub fn into_inner(self) -> Artifact {
        self.artifact
    }
}

/// Validates signature and seal candidates and uploaded source documents.
#[derive(Clone, Debug)]
pub struct ArtifactValidator {
    config: EngineConfig,
}

impl ArtifactValidator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn limits(&self) -> &ValidationLimits {
        &self.config.limits
    }

    pub fn validate(&self, candidate: ArtifactCandidate) -> ValidationResult<ValidArtifact> {
        let artifact = match candidate {
            ArtifactCandidate::Signature(c) => Artifact::Signature(self.validate_signature(c)?),
            ArtifactCandidate::Seal(c) => Artifact::Seal(self.validate_seal(c)?),
        };
        Ok(ValidArtifact { artifact })
    }

    /// Check an uploaded source document before it is hashed.
    pub fn validate_source_document(&self, media_type: &str, content: &[u8]) -> ValidationResult<()> {
        if content.is_empty() {
            return Err(ValidationError::EmptyArtifact(
                "document content is empty".to_string(),
            ));
        }
        check_media_type(media_type, &self.limits().source_media_types)?;
        check_size(content.len(), self.limits().source_max_bytes)
    }

    fn validate_signature(&self, c: SignatureCandidate) -> ValidationResult<SignatureArtifact> {
        if c.points.is_empty() {
            return Err(ValidationError::EmptyArtifact(
                "signature has no stroke points".to_string(),
            ));
        }
        let (scale_x, scale_y) = device_scale(&c.surface)?;

        let mut points = Vec::with_capacity(c.points.len());
        let mut last_offset = 0;
        for (i, p) in c.points.iter().enumerate() {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(ValidationError::InvalidStroke(format!(
                    "point {} has a non-finite coordinate",
                    i
                )));
            }
            if p.t_offset_ms < last_offset {
                return Err(ValidationError::InvalidStroke(format!(
                    "point {} goes back in time",
                    i
                )));
            }
            last_offset = p.t_offset_ms;
            points.push(StrokePoint::new(p.x * scale_x, p.y * scale_y, p.t_offset_ms));
        }

        let first = points[0];
        if points.iter().all(|p| p.x == first.x && p.y == first.y) {
            return Err(ValidationError::EmptyArtifact(
                "all stroke points coincide".to_string(),
            ));
        }

        if c.stroke_width < self.limits().min_stroke_width
            || c.stroke_width > self.limits().max_stroke_width
        {
            return Err(ValidationError::InvalidStroke(format!(
                "stroke width {} outside {}..={}",
                c.stroke_width, self.limits().min_stroke_width, self.limits().max_stroke_width
            )));
        }
        if !is_hex_color(&c.stroke_color) {
            return Err(ValidationError::InvalidStroke(format!(
                "stroke color {:?} is not #rrggbb",
                c.stroke_color
            )));
        }

        let raster_image = self.check_raster(c.raster_image, "signature")?;

        Ok(SignatureArtifact {
            points,
            canvas_width: c.surface.intrinsic_width,
            canvas_height: c.surface.intrinsic_height,
            stroke_width: c.stroke_width,
            stroke_color: c.stroke_color.to_ascii_lowercase(),
            raster_image,
        })
    }

    fn validate_seal(&self, c: SealCandidate) -> ValidationResult<SealArtifact> {
        match c.source {
            SealSource::Preset { preset_id } => {
                // Presets are rendered from the registry; any supplied image is dropped.
                let preset = self
                    .config
                    .preset(&preset_id)
                    .ok_or_else(|| ValidationError::UnknownPreset(preset_id.clone()))?;
                let label = match c.label.trim() {
                    "" => preset.label.clone(),
                    label => label.to_string(),
                };
                Ok(SealArtifact {
                    source: SealSource::Preset { preset_id },
                    raster_image: None,
                    label,
                })
            }
            SealSource::Uploaded => {
                let image = c.raster_image.ok_or_else(|| {
                    ValidationError::EmptyArtifact("uploaded seal has no image".to_string())
                })?;
                let image = self.check_raster(image, "seal")?;
                let label = c.label.trim();
                if label.is_empty() {
                    return Err(ValidationError::MissingLabel(
                        "uploaded seal needs a label".to_string(),
                    ));
                }
                Ok(SealArtifact {
                    source: SealSource::Uploaded,
                    raster_image: Some(image),
                    label: label.to_string(),
                })
            }
        }
    }

    fn check_raster(&self, image: RasterImage, what: &str) -> ValidationResult<RasterImage> {
        if image.is_empty() {
            return Err(ValidationError::EmptyArtifact(format!(
                "{} image is empty",
                what
            )));
        }
        let media_type = check_media_type(&image.media_type, &self.limits().raster_media_types)?;
        check_size(image.len(), self.limits().image_max_bytes)?;
        Ok(RasterImage {
            media_type,
            data: image.data,
        })
    }
}

/// Per-axis factor mapping displayed coordinates onto the canvas.
fn device_scale(surface: &CaptureSurface) -> ValidationResult<(f64, f64)> {
    let dims = [
        surface.intrinsic_width,
        surface.intrinsic_height,
        surface.displayed_width,
        surface.displayed_height,
    ];
    if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
        return Err(ValidationError::InvalidCaptureSurface(format!(
            "dimensions must be positive: {:?}",
            surface
        )));
    }
    Ok((
        surface.intrinsic_width / surface.displayed_width,
        surface.intrinsic_height / surface.displayed_height,
    ))
}

/// Lowercased essence of a media type, without parameters.
fn normalize_media_type(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn check_media_type(media_type: &str, accepted: &[String]) -> ValidationResult<String> {
    let essence = normalize_media_type(media_type);
    if accepted.iter().any(|a| a.eq_ignore_ascii_case(&essence)) {
        Ok(essence)
    } else {
        Err(ValidationError::UnsupportedMediaType {
            media_type: media_type.to_string(),
        })
    }
}

fn check_size(size: usize, limit: usize) -> ValidationResult<()> {
    if size > limit {
        return Err(ValidationError::PayloadTooLarge { size, limit });
    }
    Ok(())
}

fn is_hex_color(color: &str) -> bool {
    let bytes = color.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(|b| b.is_ascii_hexdigit())
}
