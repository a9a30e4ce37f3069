//! Schema version identifiers.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One schema version known to the catalog.
///
/// A version is an opaque name plus a generation ordinal. The name is what
/// stores carry in their metadata tag and what migration reports list; the
/// ordinal is what defines catalog order, so names never need to sort
/// alphanumerically.
///
/// # Example
///
/// ```
/// use stepstore::catalog::SchemaVersion;
///
/// let v1 = SchemaVersion::new("V1", 1);
/// let v2 = SchemaVersion::new("V2", 2);
/// assert!(v1 < v2);
/// assert_eq!(v1.to_string(), "V1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    name: String,
    ordinal: u32,
}

impl SchemaVersion {
    pub fn new(name: impl Into<String>, ordinal: u32) -> Self {
        Self {
            name: name.into(),
            ordinal,
        }
    }

    /// The name stores carry in their version tag.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of this version in the catalog's declared generation order.
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }
}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal
            .cmp(&other.ordinal)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
