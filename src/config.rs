//! Migrator configuration.
//!
//! Options are built with the builder pattern via `typed-builder`; every
//! field has a sensible default, so `MigratorConfig::default()` is a
//! complete, working configuration.

use typed_builder::TypedBuilder;

/// Configuration for a [`Migrator`](crate::migrate::Migrator) run.
///
/// # Examples
///
/// ```
/// use stepstore::config::MigratorConfig;
///
/// // Defaults: no backup, migrate to the catalog's latest version.
/// let config = MigratorConfig::default();
/// assert!(!config.create_backup);
///
/// // Customize options
/// let config = MigratorConfig::builder()
///     .create_backup(true)
///     .backup_suffix(".before-upgrade")
///     .build();
/// ```
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct MigratorConfig {
    /// Copy the store aside before the first hop touches anything.
    #[builder(default = false)]
    pub create_backup: bool,

    /// Suffix appended to the store's file name for the backup copy.
    #[builder(default = String::from(".pre-migration"), setter(into))]
    pub backup_suffix: String,

    /// Migrate to this catalog version instead of the latest. Must not
    /// precede the store's detected version.
    #[builder(default, setter(strip_option, into))]
    pub target_version: Option<String>,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
