//! # Stepstore
//!
//! A progressive schema-migration engine for on-disk record stores:
//! upgrade a store whose schema version is unknown or outdated one version
//! at a time, without ever authoring a direct old-to-new mapping.
//!
//! ## How It Works
//!
//! - **Schema Catalog**: the ordered set of known versions plus a mapping
//!   spec for every adjacent pair, loaded from a schema bundle
//! - **Version Detector**: reads the store's metadata tag; never guesses
//! - **Path Planner**: the exact chain of adjacent hops to the target
//! - **Step Executor**: one hop = one fresh temporary store, all-or-nothing
//! - **Orchestrator**: drives the chain and atomically promotes the result
//!
//! Only migrations between *adjacent* versions are ever authored; the
//! engine composes them. On success the caller gets the ordered list of
//! versions traversed; on failure the original store is untouched and no
//! temporary stores remain.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepstore::prelude::*;
//!
//! // Schema bundle: ordered versions + adjacent mappings.
//! let catalog = SchemaCatalog::load("addressbook.schema.json".as_ref())?;
//!
//! let migrator = Migrator::json();
//! let report = migrator.migrate_if_needed("addressbook.store".as_ref(), &catalog)?;
//!
//! match report.migrated_versions.as_slice() {
//!     [] => println!("already current"),
//!     versions => println!("migrated through {versions:?}"),
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod detect;
pub mod errors;
pub mod migrate;
pub mod plan;
pub mod prelude;
pub mod step;
pub mod store;
