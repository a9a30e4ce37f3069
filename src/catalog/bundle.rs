//! Schema bundle files.
//!
//! A bundle is the external, read-only source of schema definitions: a JSON
//! document declaring the ordered version list and the mapping spec for each
//! adjacent pair. The engine never writes bundles; it loads one at
//! construction and treats it as immutable for the run.
//!
//! ```json
//! {
//!   "name": "addressbook",
//!   "versions": [
//!     { "name": "V1", "ordinal": 1 },
//!     { "name": "V2", "ordinal": 2 }
//!   ],
//!   "mappings": [
//!     {
//!       "from": "V1",
//!       "to": "V2",
//!       "transforms": [
//!         { "op": "add", "field": "age", "default": 0 }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{MappingSpec, SchemaVersion};
use crate::errors::CatalogError;

/// Parsed but not yet validated schema definitions.
///
/// Validation (ordering, uniqueness, adjacency) happens when the bundle is
/// turned into a [`SchemaCatalog`](crate::catalog::SchemaCatalog).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaBundle {
    pub name: String,
    pub versions: Vec<SchemaVersion>,
    #[serde(default)]
    pub mappings: Vec<MappingSpec>,
}

impl SchemaBundle {
    /// Read a bundle from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::BundleIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| CatalogError::BundleParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
