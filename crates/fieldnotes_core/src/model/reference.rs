//! Addressable record snapshot used by the cross-reference rewriter.

use crate::model::record::RecordId;
use crate::text::slugify;
use serde::{Deserialize, Serialize};

/// One record that free text may refer to.
///
/// `normalized_key` is expected to be unique per live record. The rewriter
/// still tolerates duplicates and skips keys it cannot resolve unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCandidate {
    /// Title as authored; used as the anchor label.
    pub display_title: String,
    /// Slug of `display_title`; used as the anchor target.
    pub normalized_key: String,
    pub record_id: RecordId,
}

impl ReferenceCandidate {
    /// Builds a candidate whose key is derived from `title`.
    pub fn new(record_id: RecordId, title: impl Into<String>) -> Self {
        let display_title = title.into();
        let normalized_key = slugify(&display_title);
        Self {
            display_title,
            normalized_key,
            record_id,
        }
    }

    /// Builds a candidate with a caller-supplied key.
    ///
    /// Used when the store already holds a slug, which may be stale relative
    /// to the current title.
    pub fn with_key(
        record_id: RecordId,
        title: impl Into<String>,
        normalized_key: impl Into<String>,
    ) -> Self {
        Self {
            display_title: title.into(),
            normalized_key: normalized_key.into(),
            record_id,
        }
    }

    /// Whether the candidate can produce a link at all.
    pub fn is_linkable(&self) -> bool {
        !self.display_title.trim().is_empty() && !self.normalized_key.is_empty()
    }
}
