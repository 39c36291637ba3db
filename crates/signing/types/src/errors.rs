//! Error types for artifact and document validation

/// Why a submission was refused. Always recoverable by resubmitting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Empty artifact: {0}")]
    EmptyArtifact(String),

    #[error("Unsupported media type: {media_type}")]
    UnsupportedMediaType { media_type: String },

    #[error("Payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Unknown preset seal: {0}")]
    UnknownPreset(String),

    #[error("Missing label: {0}")]
    MissingLabel(String),

    #[error("Invalid stroke: {0}")]
    InvalidStroke(String),

    #[error("Invalid capture surface: {0}")]
    InvalidCaptureSurface(String),
}

impl ValidationError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyArtifact(_) => "EMPTY_ARTIFACT",
            Self::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::UnknownPreset(_) => "UNKNOWN_PRESET",
            Self::MissingLabel(_) => "MISSING_LABEL",
            Self::InvalidStroke(_) => "INVALID_STROKE",
            Self::InvalidCaptureSurface(_) => "INVALID_CAPTURE_SURFACE",
        }
    }
}

/// Result type alias for validation
pub type ValidationResult<T> = Result<T, ValidationError>;
