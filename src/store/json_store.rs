//! JSON-lines store format.
//!
//! A store is a directory holding `store.meta.json` (format marker, version
//! tag, bookkeeping) and `records.jsonl` (one JSON object per line, in
//! stable order). Commit order makes partially written stores unreadable:
//! the metadata file is written and synced only after every record is on
//! disk, and `read_meta` refuses a directory without valid metadata.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::StorageError;
use crate::store::meta::StoreMeta;
use crate::store::{Record, StoreFormat, StoreWriter};

const META_FILE: &str = "store.meta.json";
const RECORDS_FILE: &str = "records.jsonl";

/// Directory-backed JSON-lines store format.
///
/// # Example
///
/// ```no_run
/// use stepstore::store::{JsonStore, StoreFormat, StoreWriter};
///
/// let format = JsonStore::new();
/// let mut writer = format.create("users.store".as_ref(), "V1")?;
/// let record = serde_json::json!({"name": "A"});
/// writer.append(record.as_object().unwrap())?;
/// writer.commit()?;
/// # Ok::<(), stepstore::errors::StorageError>(())
/// ```
#[derive(Debug, Clone)]
pub struct JsonStore {
    use_fsync: bool,
}

impl JsonStore {
    pub fn new() -> Self {
        Self { use_fsync: true }
    }

    /// Disable fsync on commit. Only sensible for tests and throwaway data.
    pub fn with_fsync(mut self, use_fsync: bool) -> Self {
        self.use_fsync = use_fsync;
        self
    }

    fn meta_path(location: &Path) -> PathBuf {
        location.join(META_FILE)
    }

    fn records_path(location: &Path) -> PathBuf {
        location.join(RECORDS_FILE)
    }
}

impl Default for JsonStore {
    fn default() -> Self {
        Self::new()
    }
}

fn io_error(op: &'static str, path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        op,
        path: path.to_path_buf(),
        source,
    }
}

impl StoreFormat for JsonStore {
    fn exists(&self, location: &Path) -> bool {
        location.exists()
    }

    fn read_meta(&self, location: &Path) -> Result<StoreMeta, StorageError> {
        let meta_path = Self::meta_path(location);
        let contents = match fs::read_to_string(&meta_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotAStore {
                    path: location.to_path_buf(),
                    detail: "no store metadata present".to_string(),
                });
            }
            Err(e) => return Err(io_error("reading store metadata", &meta_path, e)),
        };
        let meta: StoreMeta =
            serde_json::from_str(&contents).map_err(|source| StorageError::MetaParse {
                path: meta_path.clone(),
                source,
            })?;
        if !meta.marker_is_valid() {
            return Err(StorageError::NotAStore {
                path: location.to_path_buf(),
                detail: format!("unknown format marker {:?}", meta.marker),
            });
        }
        Ok(meta)
    }

    fn scan(
        &self,
        location: &Path,
    ) -> Result<Box<dyn Iterator<Item = Result<Record, StorageError>>>, StorageError> {
        let records_path = Self::records_path(location);
        let file = File::open(&records_path)
            .map_err(|e| io_error("opening store records", &records_path, e))?;
        let reader = BufReader::new(file);
        let iter = reader
            .lines()
            .enumerate()
            .filter(|(_, line)| !matches!(line, Ok(l) if l.trim().is_empty()))
            .map(move |(index, line)| {
                let line = line.map_err(|e| io_error("reading store records", &records_path, e))?;
                serde_json::from_str::<Record>(&line).map_err(|source| StorageError::RecordParse {
                    path: records_path.clone(),
                    index,
                    source,
                })
            });
        Ok(Box::new(iter))
    }

    fn create(
        &self,
        location: &Path,
        version_tag: &str,
    ) -> Result<Box<dyn StoreWriter>, StorageError> {
        log::debug!("creating store at {} under {version_tag}", location.display());
        fs::create_dir(location).map_err(|e| io_error("creating store directory", location, e))?;
        let records_path = Self::records_path(location);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&records_path)
            .map_err(|e| io_error("creating store records", &records_path, e))?;
        Ok(Box::new(JsonStoreWriter {
            location: location.to_path_buf(),
            version_tag: version_tag.to_string(),
            writer: BufWriter::new(file),
            record_count: 0,
            use_fsync: self.use_fsync,
        }))
    }

    fn destroy(&self, location: &Path) -> Result<(), StorageError> {
        match fs::remove_dir_all(location) {
            Ok(()) => {
                log::debug!("destroyed store at {}", location.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("destroying store", location, e)),
        }
    }

    fn replace(&self, target: &Path, source: &Path) -> Result<(), StorageError> {
        let retired = sibling_with_suffix(target, ".retired");
        if retired.exists() {
            fs::remove_dir_all(&retired)
                .map_err(|e| io_error("clearing stale retired store", &retired, e))?;
        }

        let had_target = target.exists();
        if had_target {
            fs::rename(target, &retired)
                .map_err(|e| io_error("retiring previous store", target, e))?;
        }
        match fs::rename(source, target) {
            Ok(()) => {
                if had_target {
                    fs::remove_dir_all(&retired)
                        .map_err(|e| io_error("removing retired store", &retired, e))?;
                }
                log::debug!(
                    "promoted store {} into place at {}",
                    source.display(),
                    target.display()
                );
                Ok(())
            }
            Err(e) => {
                // Put the previous store back so the location is never empty.
                if had_target {
                    let _ = fs::rename(&retired, target);
                }
                Err(io_error("promoting migrated store", source, e))
            }
        }
    }

    fn backup(&self, location: &Path, backup: &Path) -> Result<(), StorageError> {
        if backup.exists() {
            fs::remove_dir_all(backup)
                .map_err(|e| io_error("clearing stale backup", backup, e))?;
        }
        fs::create_dir(backup).map_err(|e| io_error("creating backup directory", backup, e))?;
        let entries =
            fs::read_dir(location).map_err(|e| io_error("reading store directory", location, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_error("reading store directory", location, e))?;
            let from = entry.path();
            if from.is_file() {
                let to = backup.join(entry.file_name());
                fs::copy(&from, &to).map_err(|e| io_error("copying store file", &from, e))?;
            }
        }
        log::debug!(
            "backed up store {} to {}",
            location.display(),
            backup.display()
        );
        Ok(())
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

struct JsonStoreWriter {
    location: PathBuf,
    version_tag: String,
    writer: BufWriter<File>,
    record_count: u64,
    use_fsync: bool,
}

impl StoreWriter for JsonStoreWriter {
    fn append(&mut self, record: &Record) -> Result<(), StorageError> {
        let records_path = JsonStore::records_path(&self.location);
        let line = serde_json::to_string(record)
            .map_err(|e| io_error("encoding record", &records_path, e.into()))?;
        self.writer
            .write_all(line.as_bytes())
            .and_then(|()| self.writer.write_all(b"\n"))
            .map_err(|e| io_error("writing record", &records_path, e))?;
        self.record_count += 1;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<(), StorageError> {
        let records_path = JsonStore::records_path(&self.location);
        self.writer
            .flush()
            .map_err(|e| io_error("flushing records", &records_path, e))?;
        if self.use_fsync {
            self.writer
                .get_ref()
                .sync_all()
                .map_err(|e| io_error("syncing records", &records_path, e))?;
        }

        // Metadata last: its presence is what makes the store readable.
        let meta = StoreMeta::new(&self.version_tag, self.record_count);
        let meta_path = JsonStore::meta_path(&self.location);
        let contents = serde_json::to_string_pretty(&meta)
            .map_err(|e| io_error("encoding store metadata", &meta_path, e.into()))?;
        let mut meta_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&meta_path)
            .map_err(|e| io_error("creating store metadata", &meta_path, e))?;
        meta_file
            .write_all(contents.as_bytes())
            .map_err(|e| io_error("writing store metadata", &meta_path, e))?;
        if self.use_fsync {
            meta_file
                .sync_all()
                .map_err(|e| io_error("syncing store metadata", &meta_path, e))?;
        }
        log::debug!(
            "committed store at {} with {} records under {}",
            self.location.display(),
            self.record_count,
            self.version_tag
        );
        Ok(())
    }
}
