//! Step executor: apply one adjacent-version hop.
//!
//! Each hop reads the source store and writes a brand-new store at a
//! staging location, formatted under the hop's destination version. The
//! source is never mutated or deleted here; the orchestrator decides when a
//! consumed intermediate goes away. A hop is all-or-nothing: the first
//! unmappable record aborts the step, the partial destination is destroyed,
//! and no half-migrated store is ever visible.

use std::path::Path;

use crate::catalog::MappingSpec;
use crate::errors::{MigrationError, MigrationResult, StorageError};
use crate::plan::Hop;
use crate::store::{StoreFormat, StoreHandle};

/// Applies single hops through a [`StoreFormat`].
#[derive(Debug, Clone, Copy)]
pub struct StepExecutor<'f, F: StoreFormat> {
    format: &'f F,
}

impl<'f, F: StoreFormat> StepExecutor<'f, F> {
    pub fn new(format: &'f F) -> Self {
        Self { format }
    }

    /// Transform every record of `source` through `mapping` into a fresh
    /// store at `staging`, and return its handle.
    ///
    /// On any failure the partially written destination is deleted before
    /// the error is returned; the source store is left exactly as it was.
    pub fn apply_hop(
        &self,
        source: &StoreHandle,
        hop: &Hop,
        mapping: &MappingSpec,
        staging: &Path,
    ) -> MigrationResult<StoreHandle> {
        debug_assert_eq!(source.version(), &hop.from);
        log::debug!(
            "applying hop {} -> {} from {} into {}",
            hop.from,
            hop.to,
            source.location().display(),
            staging.display()
        );

        // A crashed earlier run may have left a store at the staging path.
        self.format.destroy(staging)?;

        let mut writer = self.format.create(staging, hop.to.name())?;
        let result = (|| -> MigrationResult<u64> {
            let mut written = 0u64;
            for (index, record) in self.format.scan(source.location())?.enumerate() {
                let record = record?;
                let migrated =
                    mapping
                        .apply(&record)
                        .map_err(|source| MigrationError::StepMigration {
                            from: hop.from.name().to_string(),
                            to: hop.to.name().to_string(),
                            record: index,
                            source,
                        })?;
                writer.append(&migrated)?;
                written += 1;
            }
            writer.commit()?;
            Ok(written)
        })();

        let written = match result {
            Ok(written) => written,
            Err(e) => {
                if let Err(cleanup) = self.format.destroy(staging) {
                    log::warn!(
                        "failed to clean up partial store at {}: {cleanup}",
                        staging.display()
                    );
                }
                return Err(e);
            }
        };

        // Trust but verify: the committed store must read back under the
        // destination tag with every record accounted for.
        let meta = self.format.read_meta(staging).inspect_err(|_| {
            let _ = self.format.destroy(staging);
        })?;
        if meta.version_tag != hop.to.name() || meta.record_count != written {
            self.format.destroy(staging)?;
            return Err(StorageError::Verification {
                path: staging.to_path_buf(),
                detail: format!(
                    "expected {} records under {:?}, found {} under {:?}",
                    written,
                    hop.to.name(),
                    meta.record_count,
                    meta.version_tag
                ),
            }
            .into());
        }

        Ok(StoreHandle::new(staging, hop.to.clone()))
    }
}
