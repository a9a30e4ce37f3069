//! On-disk store metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format marker every store's metadata must carry. Files without it are
/// never treated as stores, whatever else they contain.
pub const FORMAT_MARKER: &str = "stepstore.v1";

/// Metadata embedded in every store: the format marker, the schema version
/// tag the records are formatted under, and bookkeeping the executor uses
/// to verify a committed store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub marker: String,
    pub version_tag: String,
    pub record_count: u64,
    pub updated_at: DateTime<Utc>,
}

impl StoreMeta {
    pub fn new(version_tag: impl Into<String>, record_count: u64) -> Self {
        Self {
            marker: FORMAT_MARKER.to_string(),
            version_tag: version_tag.into(),
            record_count,
            updated_at: Utc::now(),
        }
    }

    /// Whether the marker identifies this as a store we can read.
    pub fn marker_is_valid(&self) -> bool {
        self.marker == FORMAT_MARKER
    }
}
