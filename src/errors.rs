//! Error taxonomy for the migration engine.
//!
//! Every failure surfaces to the caller as a [`MigrationError`]; the engine
//! recovers locally only by cleaning up partially written intermediate
//! stores. Whenever `migrate_if_needed` returns an error, the original store
//! is still intact at its pre-migration version.

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::FieldKind;

pub type MigrationResult<T> = Result<T, MigrationError>;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The store exists but its version tag matches no catalog version.
    /// Fatal and non-retryable: the engine never guesses a starting point.
    #[error("store at {} carries unrecognized schema tag {tag:?}", location.display())]
    UnrecognizedSchema { location: PathBuf, tag: String },

    /// The requested target precedes the detected version in catalog order.
    /// Backward migration is unsupported.
    #[error("target version {target:?} precedes detected version {current:?}")]
    InvalidTarget { current: String, target: String },

    /// One hop's record transformation failed. The partially written
    /// destination store has already been deleted.
    #[error("migration step {from:?} -> {to:?} failed at record {record}: {source}")]
    StepMigration {
        from: String,
        to: String,
        record: usize,
        source: TransformError,
    },

    /// Another migration already holds the lock for this store location.
    /// The caller may retry once it completes.
    #[error("another migration is already in flight for store at {}", location.display())]
    ConcurrentMigration { location: PathBuf },

    /// The delegate's preflight check vetoed the migration.
    #[error("migration delegate declined to migrate store at {}", location.display())]
    DelegateDeclined { location: PathBuf },

    /// Cancellation was requested between hops. Treated like failure for
    /// visibility purposes: intermediates are gone, the original untouched.
    #[error("migration cancelled after {completed} of {planned} steps")]
    Cancelled { completed: usize, planned: usize },
}

/// Schema catalog problems, all surfaced before any store I/O happens.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog declares no versions")]
    Empty,

    #[error("catalog versions are not strictly ascending at {name:?} (ordinal {ordinal})")]
    UnorderedVersions { name: String, ordinal: u32 },

    #[error("catalog declares version {name:?} more than once")]
    DuplicateVersion { name: String },

    #[error("no mapping declared for adjacent versions {from:?} -> {to:?}")]
    MissingMapping { from: String, to: String },

    #[error("mapping {from:?} -> {to:?} does not connect adjacent catalog versions")]
    NonAdjacentMapping { from: String, to: String },

    #[error("version {name:?} is not declared by the catalog")]
    UnknownVersion { name: String },

    #[error("schema bundle at {} could not be read: {source}", path.display())]
    BundleIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("schema bundle at {} is malformed: {source}", path.display())]
    BundleParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Failures of the underlying store format (filesystem I/O, corrupt store
/// content). If one of these occurs before the final atomic swap, the
/// original store is guaranteed untouched.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{op} failed for {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not a recognizable store: {detail}", path.display())]
    NotAStore { path: PathBuf, detail: String },

    #[error("store metadata at {} is malformed: {source}", path.display())]
    MetaParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("record {index} in store at {} is malformed: {source}", path.display())]
    RecordParse {
        path: PathBuf,
        index: usize,
        source: serde_json::Error,
    },

    #[error("store written at {} failed verification: {detail}", path.display())]
    Verification { path: PathBuf, detail: String },
}

/// A single record's transformation failed while applying a mapping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("field {field:?} is missing and has no derivable value")]
    MissingField { field: String },

    #[error("field {field:?} cannot be coerced to {kind}")]
    Uncoercible { field: String, kind: FieldKind },
}
