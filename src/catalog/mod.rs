//! Schema catalog: the ordered set of known versions and their mappings.
//!
//! The catalog is loaded once per run (from a [`SchemaBundle`] file or built
//! in code), validated eagerly, and immutable afterwards. Because it never
//! mutates, a catalog can be cached across runs and shared between threads
//! freely.
//!
//! # Validation
//!
//! Construction fails with a [`CatalogError`] if the declared versions are
//! not strictly ascending, a name repeats, an adjacent pair has no mapping,
//! or a mapping names unknown or non-adjacent versions. These are
//! configuration bugs and surface before any store I/O.

mod bundle;
mod mapping;
mod version;

pub use bundle::SchemaBundle;
pub use mapping::{FieldKind, FieldTransform, MappingSpec};
pub use version::SchemaVersion;

use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::CatalogError;

/// Validated, immutable schema catalog.
///
/// # Example
///
/// ```
/// use stepstore::catalog::{MappingSpec, SchemaCatalog, SchemaVersion};
///
/// let catalog = SchemaCatalog::new(
///     "demo",
///     vec![SchemaVersion::new("V1", 1), SchemaVersion::new("V2", 2)],
///     vec![MappingSpec::new("V1", "V2")],
/// )?;
/// assert_eq!(catalog.latest().name(), "V2");
/// # Ok::<(), stepstore::errors::CatalogError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    name: String,
    versions: Vec<SchemaVersion>,
    mappings: BTreeMap<(String, String), MappingSpec>,
}

impl SchemaCatalog {
    /// Build and validate a catalog from its parts.
    pub fn new(
        name: impl Into<String>,
        versions: Vec<SchemaVersion>,
        mappings: Vec<MappingSpec>,
    ) -> Result<Self, CatalogError> {
        if versions.is_empty() {
            return Err(CatalogError::Empty);
        }

        for pair in versions.windows(2) {
            if pair[1].ordinal() <= pair[0].ordinal() {
                return Err(CatalogError::UnorderedVersions {
                    name: pair[1].name().to_string(),
                    ordinal: pair[1].ordinal(),
                });
            }
        }
        for (i, version) in versions.iter().enumerate() {
            if versions[..i].iter().any(|v| v.name() == version.name()) {
                return Err(CatalogError::DuplicateVersion {
                    name: version.name().to_string(),
                });
            }
        }

        let mut by_pair = BTreeMap::new();
        for mapping in mappings {
            let from_pos = versions.iter().position(|v| v.name() == mapping.from);
            let to_pos = versions.iter().position(|v| v.name() == mapping.to);
            let (from_pos, to_pos) = match (from_pos, to_pos) {
                (Some(f), Some(t)) => (f, t),
                (None, _) => {
                    return Err(CatalogError::UnknownVersion {
                        name: mapping.from.clone(),
                    });
                }
                (_, None) => {
                    return Err(CatalogError::UnknownVersion {
                        name: mapping.to.clone(),
                    });
                }
            };
            if to_pos != from_pos + 1 {
                return Err(CatalogError::NonAdjacentMapping {
                    from: mapping.from.clone(),
                    to: mapping.to.clone(),
                });
            }
            by_pair.insert((mapping.from.clone(), mapping.to.clone()), mapping);
        }

        for pair in versions.windows(2) {
            let key = (pair[0].name().to_string(), pair[1].name().to_string());
            if !by_pair.contains_key(&key) {
                return Err(CatalogError::MissingMapping {
                    from: key.0,
                    to: key.1,
                });
            }
        }

        Ok(Self {
            name: name.into(),
            versions,
            mappings: by_pair,
        })
    }

    /// Load and validate a catalog from a schema bundle file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let bundle = SchemaBundle::load(path)?;
        Self::from_bundle(bundle)
    }

    /// Validate an already-parsed bundle.
    pub fn from_bundle(bundle: SchemaBundle) -> Result<Self, CatalogError> {
        Self::new(bundle.name, bundle.versions, bundle.mappings)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All known versions, ascending, oldest first.
    pub fn versions(&self) -> &[SchemaVersion] {
        &self.versions
    }

    /// The newest version; the default migration target.
    pub fn latest(&self) -> &SchemaVersion {
        self.versions.last().expect("catalog is never empty")
    }

    /// Look up a version by its tag name.
    pub fn version_named(&self, name: &str) -> Option<&SchemaVersion> {
        self.versions.iter().find(|v| v.name() == name)
    }

    /// Index of a version in declaration order.
    pub fn position(&self, version: &SchemaVersion) -> Result<usize, CatalogError> {
        self.versions
            .iter()
            .position(|v| v == version)
            .ok_or_else(|| CatalogError::UnknownVersion {
                name: version.name().to_string(),
            })
    }

    /// The mapping for one adjacent pair. Validation guarantees this exists
    /// for every adjacent pair; asking for a non-adjacent pair is an error.
    pub fn mapping(
        &self,
        from: &SchemaVersion,
        to: &SchemaVersion,
    ) -> Result<&MappingSpec, CatalogError> {
        let from_pos = self.position(from)?;
        let to_pos = self.position(to)?;
        if to_pos != from_pos + 1 {
            return Err(CatalogError::NonAdjacentMapping {
                from: from.name().to_string(),
                to: to.name().to_string(),
            });
        }
        self.mappings
            .get(&(from.name().to_string(), to.name().to_string()))
            .ok_or_else(|| CatalogError::MissingMapping {
                from: from.name().to_string(),
                to: to.name().to_string(),
            })
    }
}
