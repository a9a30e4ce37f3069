//! Version detection: which known schema version is this store at?

use std::path::Path;

use crate::catalog::{SchemaCatalog, SchemaVersion};
use crate::errors::{MigrationError, MigrationResult, StorageError};
use crate::store::StoreFormat;

/// Inspects a store's metadata and maps its version tag through the catalog.
///
/// Detection never mutates the store. An absent store is `None` (fresh
/// store, nothing to migrate); an existing store whose tag matches no
/// catalog version is a hard [`UnrecognizedSchema`] failure, as is content
/// that is not a store at all. The engine never guesses a starting point.
///
/// [`UnrecognizedSchema`]: MigrationError::UnrecognizedSchema
#[derive(Debug, Clone, Copy)]
pub struct VersionDetector<'c> {
    catalog: &'c SchemaCatalog,
}

impl<'c> VersionDetector<'c> {
    pub fn new(catalog: &'c SchemaCatalog) -> Self {
        Self { catalog }
    }

    pub fn detect<F: StoreFormat>(
        &self,
        format: &F,
        location: &Path,
    ) -> MigrationResult<Option<SchemaVersion>> {
        if !format.exists(location) {
            log::debug!("no store at {}, nothing to detect", location.display());
            return Ok(None);
        }

        let meta = match format.read_meta(location) {
            Ok(meta) => meta,
            Err(StorageError::NotAStore { detail, .. }) => {
                return Err(MigrationError::UnrecognizedSchema {
                    location: location.to_path_buf(),
                    tag: detail,
                });
            }
            Err(StorageError::MetaParse { source, .. }) => {
                return Err(MigrationError::UnrecognizedSchema {
                    location: location.to_path_buf(),
                    tag: format!("unreadable metadata: {source}"),
                });
            }
            Err(e) => return Err(e.into()),
        };

        match self.catalog.version_named(&meta.version_tag) {
            Some(version) => {
                log::debug!(
                    "store at {} detected at version {version}",
                    location.display()
                );
                Ok(Some(version.clone()))
            }
            None => Err(MigrationError::UnrecognizedSchema {
                location: location.to_path_buf(),
                tag: meta.version_tag,
            }),
        }
    }
}
