//! Advisory migration lock, keyed by store location.
//!
//! At most one migration may be in flight per store. The lock is a sibling
//! file created with `create_new`, so a second acquire fails fast instead of
//! racing; the guard removes the file on drop, success or failure alike.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{MigrationError, MigrationResult};

/// RAII guard for one store location's migration lock.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    /// Try to take the lock. Fails with [`MigrationError::ConcurrentMigration`]
    /// when another holder already has it.
    pub fn acquire(location: &Path) -> MigrationResult<Self> {
        let path = Self::lock_path(location);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // Best-effort breadcrumb for whoever finds a stale lock.
                let _ = writeln!(file, "{}", std::process::id());
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(MigrationError::ConcurrentMigration {
                    location: location.to_path_buf(),
                })
            }
            Err(source) => Err(crate::errors::StorageError::Io {
                op: "acquiring migration lock",
                path,
                source,
            }
            .into()),
        }
    }

    fn lock_path(location: &Path) -> PathBuf {
        let mut name = location
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "store".into());
        name.push(".migrate.lock");
        location.with_file_name(name)
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_fails_while_held() {
        let dir = TempDir::new().unwrap();
        let location = dir.path().join("users.store");

        let held = StoreLock::acquire(&location).unwrap();
        assert!(matches!(
            StoreLock::acquire(&location),
            Err(MigrationError::ConcurrentMigration { .. })
        ));
        drop(held);

        // Released on drop, so a later run can lock again.
        StoreLock::acquire(&location).unwrap();
    }
}
