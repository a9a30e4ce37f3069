// Common test utilities and helpers

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use stepstore::catalog::{FieldTransform, MappingSpec, SchemaCatalog, SchemaVersion};
use stepstore::store::{JsonStore, Record, StoreFormat};

/// Opt-in engine logging for debugging test failures (`RUST_LOG=debug`).
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Catalog with versions [V1, V2, V3]: V1 -> V2 adds `age` (default 0),
/// V2 -> V3 renames `name` -> `fullName`.
pub fn three_version_catalog() -> SchemaCatalog {
    SchemaCatalog::new(
        "addressbook",
        vec![
            SchemaVersion::new("V1", 1),
            SchemaVersion::new("V2", 2),
            SchemaVersion::new("V3", 3),
        ],
        vec![
            MappingSpec::new("V1", "V2").with_transform(FieldTransform::Add {
                field: "age".into(),
                default: json!(0),
            }),
            MappingSpec::new("V2", "V3").with_transform(FieldTransform::Rename {
                from: "name".into(),
                to: "fullName".into(),
            }),
        ],
    )
    .expect("test catalog is valid")
}

pub fn record(value: Value) -> Record {
    value.as_object().expect("test record is an object").clone()
}

/// Create a committed store at `location` under `version_tag`.
pub fn write_store(location: &Path, version_tag: &str, records: &[Record]) {
    let format = JsonStore::new();
    let mut writer = format
        .create(location, version_tag)
        .expect("create test store");
    for r in records {
        writer.append(r).expect("append test record");
    }
    writer.commit().expect("commit test store");
}

pub fn read_records(location: &Path) -> Vec<Record> {
    JsonStore::new()
        .scan(location)
        .expect("scan store")
        .collect::<Result<_, _>>()
        .expect("read store records")
}

pub fn version_tag(location: &Path) -> String {
    JsonStore::new()
        .read_meta(location)
        .expect("read store meta")
        .version_tag
}

/// Byte-for-byte snapshot of every file in a store directory.
pub fn store_bytes(location: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut snapshot = BTreeMap::new();
    for entry in fs::read_dir(location).expect("read store directory") {
        let path = entry.expect("store directory entry").path();
        if path.is_file() {
            let bytes = fs::read(&path).expect("read store file");
            snapshot.insert(path.file_name().unwrap().into(), bytes);
        }
    }
    snapshot
}

/// Names of sibling artifacts (staging stores, locks, retired copies) the
/// engine may have left next to the store. Empty after any completed call.
pub fn sibling_artifacts(location: &Path) -> Vec<String> {
    let parent = location.parent().expect("store has a parent directory");
    let store_name = location
        .file_name()
        .expect("store has a name")
        .to_string_lossy()
        .into_owned();
    let mut leftovers = Vec::new();
    for entry in fs::read_dir(parent).expect("read parent directory") {
        let name = entry
            .expect("parent directory entry")
            .file_name()
            .to_string_lossy()
            .into_owned();
        if name != store_name && name.starts_with(&store_name) {
            leftovers.push(name);
        }
    }
    leftovers.sort();
    leftovers
}
