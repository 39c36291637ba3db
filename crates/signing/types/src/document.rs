//! Documents: the immutable content a signing process is about

use crate::{ContentHash, DocumentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document submitted for signing.
///
/// `content_hash` is bound once, when the document is first stored, and is
/// never recomputed for the same document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Human-readable title (usually the uploaded file name)
    pub title: String,
    /// Media type of the source file (PDF, Word)
    pub media_type: String,
    /// Raw content bytes
    pub content: Vec<u8>,
    /// Fingerprint fixed at creation time
    pub content_hash: ContentHash,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// How a caller names the document for a new process.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentInput {
    /// Upload fresh content; a new Document is created and hashed.
    Upload {
        title: String,
        media_type: String,
        content: Vec<u8>,
    },
    /// Reuse a stored Document whose previous process has ended.
    Existing { document_id: DocumentId },
}

impl DocumentInput {
    pub fn upload(
        title: impl Into<String>,
        media_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self::Upload {
            title: title.into(),
            media_type: media_type.into(),
            content: content.into(),
        }
    }

    pub fn existing(document_id: DocumentId) -> Self {
        Self::Existing { document_id }
    }
}
