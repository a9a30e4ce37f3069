//! Store handles and the store-format seam.
//!
//! The engine never interprets a store's byte format directly; everything it
//! needs goes through [`StoreFormat`]. The crate ships one implementation,
//! [`JsonStore`], and callers with their own formats implement the trait
//! themselves. Locations are opaque caller-supplied paths.

mod json_store;
mod lock;
mod meta;

pub use json_store::JsonStore;
pub use lock::StoreLock;
pub use meta::{FORMAT_MARKER, StoreMeta};

use std::path::{Path, PathBuf};

use crate::catalog::SchemaVersion;
use crate::errors::StorageError;

/// One record of a store: a flat JSON object.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A physical store at a filesystem location plus the schema version it is
/// currently formatted under.
///
/// Exactly one handle is ever "live" (visible to the application);
/// intermediate handles produced during migration are transient and owned by
/// the executor and orchestrator until promoted or destroyed.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreHandle {
    location: PathBuf,
    version: SchemaVersion,
}

impl StoreHandle {
    pub fn new(location: impl Into<PathBuf>, version: SchemaVersion) -> Self {
        Self {
            location: location.into(),
            version,
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn version(&self) -> &SchemaVersion {
        &self.version
    }
}

/// Streaming writer for a store under construction. Nothing written is
/// visible as a valid store until [`StoreWriter::commit`] succeeds.
pub trait StoreWriter {
    fn append(&mut self, record: &Record) -> Result<(), StorageError>;

    /// Durably finish the store: flush, sync, and write its metadata.
    fn commit(self: Box<Self>) -> Result<(), StorageError>;
}

/// The byte format of stores, treated as an external collaborator.
///
/// Implementations must keep two promises the orchestrator's guarantees
/// rest on: `replace` swaps by rename (no window where neither store
/// exists), and a store is only readable once its writer committed.
pub trait StoreFormat {
    /// Whether anything exists at the location. Absence means "fresh
    /// store, nothing to migrate", never an error.
    fn exists(&self, location: &Path) -> bool;

    /// Read the store's metadata without mutating it.
    fn read_meta(&self, location: &Path) -> Result<StoreMeta, StorageError>;

    /// Stream the store's records in stable order.
    fn scan(
        &self,
        location: &Path,
    ) -> Result<Box<dyn Iterator<Item = Result<Record, StorageError>>>, StorageError>;

    /// Start a fresh store at the location, formatted under the given
    /// version tag. The location must not already exist.
    fn create(
        &self,
        location: &Path,
        version_tag: &str,
    ) -> Result<Box<dyn StoreWriter>, StorageError>;

    /// Remove a store entirely. Missing stores are fine; destruction is
    /// how both failed and consumed intermediates are cleaned up.
    fn destroy(&self, location: &Path) -> Result<(), StorageError>;

    /// Atomically promote `source` into `target` by rename/swap. After
    /// success `source` no longer exists and `target` is the new store.
    fn replace(&self, target: &Path, source: &Path) -> Result<(), StorageError>;

    /// Copy the store aside, byte for byte, for a pre-migration backup.
    fn backup(&self, location: &Path, backup: &Path) -> Result<(), StorageError>;

    /// Fold any journal/sidecar state into the main store before the first
    /// hop reads it. Formats without such state keep the default no-op.
    fn checkpoint(&self, _location: &Path) -> Result<(), StorageError> {
        Ok(())
    }
}
