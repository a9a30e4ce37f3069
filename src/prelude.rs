//! Prelude module for convenient imports.
//!
//! Re-exports the types most callers need, so one import gets a working
//! migration setup.
//!
//! # Usage
//!
//! ```rust,ignore
//! use stepstore::prelude::*;
//! ```
//!
//! # What's Included
//!
//! ## Schema Catalog
//!
//! - [`SchemaCatalog`]: validated, ordered set of known versions
//! - [`SchemaVersion`]: one version (name + generation ordinal)
//! - [`MappingSpec`] / [`FieldTransform`] / [`FieldKind`]: adjacent-pair
//!   record transforms
//! - [`SchemaBundle`]: JSON schema-definition source
//!
//! ## Engine
//!
//! - [`Migrator`]: the orchestrator; [`Migrator::migrate_if_needed`] is the
//!   single entry point
//! - [`MigratorConfig`]: backup and target options
//! - [`MigrationReport`]: versions traversed on success
//! - [`MigrationDelegate`]: preflight veto / postflight notification hooks
//! - [`CancelToken`]: between-hop cancellation
//! - [`MigrationPlan`]: the computed hop chain
//! - [`VersionDetector`]: which version is this store at?
//!
//! ## Stores
//!
//! - [`StoreFormat`] / [`StoreWriter`]: the byte-format seam
//! - [`JsonStore`]: built-in JSON-lines format
//! - [`StoreHandle`] / [`StoreMeta`] / [`Record`]
//!
//! ## Error Handling
//!
//! - [`MigrationError`]: every way a run can fail
//! - [`MigrationResult`]: result alias (`Result<T, MigrationError>`)

pub use crate::catalog::{
    FieldKind, FieldTransform, MappingSpec, SchemaBundle, SchemaCatalog, SchemaVersion,
};
pub use crate::config::MigratorConfig;
pub use crate::detect::VersionDetector;
pub use crate::errors::{
    CatalogError, MigrationError, MigrationResult, StorageError, TransformError,
};
pub use crate::migrate::{
    CancelToken, MigrationDelegate, MigrationReport, Migrator,
};
pub use crate::plan::{Hop, MigrationPlan};
pub use crate::step::StepExecutor;
pub use crate::store::{
    JsonStore, Record, StoreFormat, StoreHandle, StoreLock, StoreMeta, StoreWriter,
};
