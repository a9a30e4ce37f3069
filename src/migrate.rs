//! Migration orchestrator.
//!
//! [`Migrator::migrate_if_needed`] drives the whole chain: take the
//! advisory lock, detect the store's version, plan the hops, apply them one
//! at a time through the step executor, then atomically promote the final
//! intermediate into the original location. Exactly one filesystem change
//! is ever visible to the application: the final swap on success. On
//! failure (or cancellation) every intermediate is destroyed and the
//! original store is untouched at its pre-migration version.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::catalog::{SchemaCatalog, SchemaVersion};
use crate::config::MigratorConfig;
use crate::detect::VersionDetector;
use crate::errors::{CatalogError, MigrationError, MigrationResult};
use crate::plan::MigrationPlan;
use crate::step::StepExecutor;
use crate::store::{JsonStore, StoreFormat, StoreHandle, StoreLock};

/// Observer hooks around a migration run.
///
/// Both methods have default implementations, so a delegate implements only
/// what it cares about. `should_migrate` runs after the engine has decided a
/// migration is necessary and before anything is written; returning `false`
/// aborts the run with [`MigrationError::DelegateDeclined`].
pub trait MigrationDelegate {
    fn should_migrate(&self, location: &Path) -> MigrationResult<bool> {
        let _ = location;
        Ok(true)
    }

    /// Notification after the final swap; the migration has already
    /// succeeded by the time this runs.
    fn did_migrate(&self, location: &Path, migrated_versions: &[String]) {
        let _ = (location, migrated_versions);
    }
}

/// Cooperative cancellation flag, checked between hops only.
///
/// Cancelling mid-run is equivalent to a failure for visibility purposes:
/// intermediates are destroyed and the original store stays at the version
/// it was detected at.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Outcome of a successful `migrate_if_needed` call.
///
/// An empty `migrated_versions` means the store was already current (or
/// absent); the engine performed zero writes in that case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    /// Destination version names traversed, in order.
    pub migrated_versions: Vec<String>,
    /// Where the pre-migration backup went, when one was configured.
    pub backup_path: Option<PathBuf>,
}

impl MigrationReport {
    fn none() -> Self {
        Self::default()
    }

    /// Whether any hop actually ran.
    pub fn migrated(&self) -> bool {
        !self.migrated_versions.is_empty()
    }
}

/// Drives progressive migrations over stores of format `F`.
///
/// # Example
///
/// ```no_run
/// use stepstore::catalog::SchemaCatalog;
/// use stepstore::migrate::Migrator;
///
/// let catalog = SchemaCatalog::load("schema-bundle.json".as_ref())?;
/// let migrator = Migrator::json();
/// let report = migrator.migrate_if_needed("users.store".as_ref(), &catalog)?;
/// if report.migrated() {
///     println!("migrated through {:?}", report.migrated_versions);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Migrator<F: StoreFormat> {
    format: F,
    config: MigratorConfig,
    delegate: Option<Box<dyn MigrationDelegate>>,
    cancel: CancelToken,
}

impl Migrator<JsonStore> {
    /// Migrator over the built-in JSON-lines store format.
    pub fn json() -> Self {
        Self::new(JsonStore::new())
    }
}

impl<F: StoreFormat> Migrator<F> {
    pub fn new(format: F) -> Self {
        Self::with_config(format, MigratorConfig::default())
    }

    pub fn with_config(format: F, config: MigratorConfig) -> Self {
        Self {
            format,
            config,
            delegate: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn delegate(mut self, delegate: impl MigrationDelegate + 'static) -> Self {
        self.delegate = Some(Box::new(delegate));
        self
    }

    /// Handle for requesting cancellation from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Upgrade the store at `location` to the target version, one adjacent
    /// hop at a time, and report the versions traversed.
    ///
    /// Absent store or already-current store: success with an empty report
    /// and zero writes. Any error: original store untouched, no temporary
    /// stores left behind.
    pub fn migrate_if_needed(
        &self,
        location: &Path,
        catalog: &SchemaCatalog,
    ) -> MigrationResult<MigrationReport> {
        let _lock = StoreLock::acquire(location)?;

        let detector = VersionDetector::new(catalog);
        let Some(current) = detector.detect(&self.format, location)? else {
            log::info!(
                "no store at {}, caller creates fresh at latest",
                location.display()
            );
            return Ok(MigrationReport::none());
        };

        let target = match &self.config.target_version {
            Some(name) => {
                catalog
                    .version_named(name)
                    .ok_or_else(|| CatalogError::UnknownVersion { name: name.clone() })?
            }
            None => catalog.latest(),
        };

        let plan = MigrationPlan::plan(&current, target, catalog)?;
        if plan.is_empty() {
            log::info!(
                "store at {} already at {current}, no migration needed",
                location.display()
            );
            return Ok(MigrationReport::none());
        }
        log::info!(
            "store at {} is at {current}, migrating to {target} in {} steps",
            location.display(),
            plan.len()
        );

        if let Some(delegate) = &self.delegate {
            if !delegate.should_migrate(location)? {
                return Err(MigrationError::DelegateDeclined {
                    location: location.to_path_buf(),
                });
            }
        }

        let backup_path = if self.config.create_backup {
            let backup = sibling_with_suffix(location, &self.config.backup_suffix);
            self.format.backup(location, &backup)?;
            Some(backup)
        } else {
            None
        };

        // Fold any sidecar state into the store before the first hop reads it.
        self.format.checkpoint(location)?;

        let executor = StepExecutor::new(&self.format);
        let mut source = StoreHandle::new(location, current);
        let mut traversed = Vec::with_capacity(plan.len());

        for (index, hop) in plan.hops().iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.discard_intermediate(&source, location);
                return Err(MigrationError::Cancelled {
                    completed: index,
                    planned: plan.len(),
                });
            }

            let mapping = match catalog.mapping(&hop.from, &hop.to) {
                Ok(mapping) => mapping,
                Err(e) => {
                    self.discard_intermediate(&source, location);
                    return Err(e.into());
                }
            };

            let staging = staging_location(location, &hop.to);
            let next = match executor.apply_hop(&source, hop, mapping, &staging) {
                Ok(handle) => handle,
                Err(e) => {
                    log::warn!(
                        "migration of {} failed at hop {} -> {}, hops completed: {traversed:?}",
                        location.display(),
                        hop.from,
                        hop.to
                    );
                    self.discard_intermediate(&source, location);
                    return Err(e);
                }
            };

            self.discard_intermediate(&source, location);
            traversed.push(hop.to.name().to_string());
            source = next;
        }

        // The one visible mutation: swap the final intermediate into place.
        if let Err(e) = self.format.replace(location, source.location()) {
            self.discard_intermediate(&source, location);
            return Err(e.into());
        }

        if let Some(delegate) = &self.delegate {
            delegate.did_migrate(location, &traversed);
        }
        log::info!(
            "migrated store at {} through {traversed:?}",
            location.display()
        );
        Ok(MigrationReport {
            migrated_versions: traversed,
            backup_path,
        })
    }

    /// Destroy a consumed or abandoned intermediate. The original store is
    /// never destroyed through this path.
    fn discard_intermediate(&self, handle: &StoreHandle, original: &Path) {
        if handle.location() == original {
            return;
        }
        if let Err(e) = self.format.destroy(handle.location()) {
            log::warn!(
                "failed to clean up intermediate store at {}: {e}",
                handle.location().display()
            );
        }
    }
}

fn staging_location(location: &Path, to: &SchemaVersion) -> PathBuf {
    sibling_with_suffix(location, &format!(".{}.migrating", to.name()))
}

fn sibling_with_suffix(location: &Path, suffix: &str) -> PathBuf {
    let mut name = location
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "store".into());
    name.push(suffix);
    location.with_file_name(name)
}
