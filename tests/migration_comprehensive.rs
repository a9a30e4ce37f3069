/// Comprehensive migration system tests
///
/// This test suite validates:
/// - Full chain migration with the reported version list
/// - No-op behavior for current, absent, and unrecognized stores
/// - Failure atomicity: original bytes untouched, no leftover temporaries
/// - Locking, delegate hooks, backups, and cancellation
mod common;

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;
use tempfile::TempDir;

use common::{
    read_records, record, sibling_artifacts, store_bytes, three_version_catalog, version_tag,
    write_store,
};
use stepstore::config::MigratorConfig;
use stepstore::errors::{MigrationError, MigrationResult};
use stepstore::migrate::{MigrationDelegate, Migrator};
use stepstore::store::{JsonStore, StoreLock};

#[test]
fn migrates_v1_store_through_the_whole_chain() {
    common::init_logging();
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(&location, "V1", &[record(json!({"name": "A"}))]);

    let report = Migrator::json()
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap();

    assert_eq!(report.migrated_versions, ["V2", "V3"]);
    assert!(report.migrated());
    assert_eq!(version_tag(&location), "V3");
    assert!(sibling_artifacts(&location).is_empty());
}

#[test]
fn migrated_record_has_the_expected_shape() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(&location, "V1", &[record(json!({"name": "A"}))]);

    Migrator::json()
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap();

    let records = read_records(&location);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("fullName"), Some(&json!("A")));
    assert_eq!(records[0].get("age"), Some(&json!(0)));
    assert!(!records[0].contains_key("name"));
}

#[test]
fn current_store_is_reported_current_and_untouched() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(
        &location,
        "V3",
        &[record(json!({"fullName": "A", "age": 41}))],
    );
    let before = store_bytes(&location);

    let report = Migrator::json()
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap();

    assert!(report.migrated_versions.is_empty());
    assert!(!report.migrated());
    assert_eq!(store_bytes(&location), before);
    assert!(sibling_artifacts(&location).is_empty());
}

#[test]
fn absent_store_needs_no_migration() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("never-created.store");

    let report = Migrator::json()
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap();

    assert!(report.migrated_versions.is_empty());
    assert!(!location.exists());
}

#[test]
fn unrecognized_tag_fails_without_touching_the_store() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(&location, "V0", &[record(json!({"name": "A"}))]);
    let before = store_bytes(&location);

    let err = Migrator::json()
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap_err();

    match err {
        MigrationError::UnrecognizedSchema { tag, .. } => assert_eq!(tag, "V0"),
        other => panic!("expected UnrecognizedSchema, got {other}"),
    }
    assert_eq!(store_bytes(&location), before);
    assert!(sibling_artifacts(&location).is_empty());
}

#[test]
fn failing_hop_is_named_and_everything_is_cleaned_up() {
    common::init_logging();
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    // Second record has no `name`, so the V2 -> V3 rename cannot map it.
    write_store(
        &location,
        "V1",
        &[record(json!({"name": "A"})), record(json!({"extra": true}))],
    );
    let before = store_bytes(&location);

    let err = Migrator::json()
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap_err();

    match err {
        MigrationError::StepMigration {
            from, to, record, ..
        } => {
            assert_eq!((from.as_str(), to.as_str()), ("V2", "V3"));
            assert_eq!(record, 1);
        }
        other => panic!("expected StepMigration, got {other}"),
    }
    assert_eq!(store_bytes(&location), before);
    assert!(sibling_artifacts(&location).is_empty());
}

#[test]
fn second_run_after_success_is_a_noop() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(&location, "V1", &[record(json!({"name": "A"}))]);
    let catalog = three_version_catalog();
    let migrator = Migrator::json();

    let first = migrator.migrate_if_needed(&location, &catalog).unwrap();
    assert_eq!(first.migrated_versions, ["V2", "V3"]);

    let after_first = store_bytes(&location);
    let second = migrator.migrate_if_needed(&location, &catalog).unwrap();
    assert!(second.migrated_versions.is_empty());
    assert_eq!(store_bytes(&location), after_first);
}

#[test]
fn held_lock_fails_a_second_run_fast() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(&location, "V1", &[record(json!({"name": "A"}))]);
    let before = store_bytes(&location);

    let _held = StoreLock::acquire(&location).unwrap();
    let err = Migrator::json()
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap_err();

    assert!(matches!(err, MigrationError::ConcurrentMigration { .. }));
    assert_eq!(store_bytes(&location), before);
    assert_eq!(version_tag(&location), "V1");
}

struct Declining;

impl MigrationDelegate for Declining {
    fn should_migrate(&self, _location: &Path) -> MigrationResult<bool> {
        Ok(false)
    }
}

#[test]
fn declining_delegate_aborts_before_any_write() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(&location, "V1", &[record(json!({"name": "A"}))]);
    let before = store_bytes(&location);

    let err = Migrator::json()
        .delegate(Declining)
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap_err();

    assert!(matches!(err, MigrationError::DelegateDeclined { .. }));
    assert_eq!(store_bytes(&location), before);
    assert!(sibling_artifacts(&location).is_empty());
}

#[derive(Default)]
struct Recording {
    asked: AtomicBool,
    migrated: Mutex<Vec<String>>,
}

impl MigrationDelegate for &'static Recording {
    fn should_migrate(&self, _location: &Path) -> MigrationResult<bool> {
        self.asked.store(true, Ordering::SeqCst);
        Ok(true)
    }

    fn did_migrate(&self, _location: &Path, migrated_versions: &[String]) {
        *self.migrated.lock().unwrap() = migrated_versions.to_vec();
    }
}

#[test]
fn delegate_sees_preflight_and_postflight() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(&location, "V1", &[record(json!({"name": "A"}))]);

    let recording: &'static Recording = Box::leak(Box::new(Recording::default()));
    Migrator::json()
        .delegate(recording)
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap();

    assert!(recording.asked.load(Ordering::SeqCst));
    assert_eq!(*recording.migrated.lock().unwrap(), ["V2", "V3"]);
}

#[test]
fn delegate_is_not_consulted_when_current() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(&location, "V3", &[record(json!({"fullName": "A"}))]);

    // A declining delegate would fail the run if it were asked.
    Migrator::json()
        .delegate(Declining)
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap();
}

#[test]
fn backup_preserves_the_pre_migration_bytes() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(&location, "V1", &[record(json!({"name": "A"}))]);
    let before = store_bytes(&location);

    let config = MigratorConfig::builder().create_backup(true).build();
    let report = Migrator::with_config(JsonStore::new(), config)
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap();

    let backup = report.backup_path.expect("backup path reported");
    assert_eq!(store_bytes(&backup), before);
    assert_eq!(version_tag(&location), "V3");
}

#[test]
fn pre_cancelled_run_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(&location, "V1", &[record(json!({"name": "A"}))]);
    let before = store_bytes(&location);

    let migrator = Migrator::json();
    migrator.cancel_token().cancel();
    let err = migrator
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap_err();

    match err {
        MigrationError::Cancelled { completed, planned } => {
            assert_eq!(completed, 0);
            assert_eq!(planned, 2);
        }
        other => panic!("expected Cancelled, got {other}"),
    }
    assert_eq!(store_bytes(&location), before);
    assert!(sibling_artifacts(&location).is_empty());
}

#[test]
fn target_override_stops_the_chain_early() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(&location, "V1", &[record(json!({"name": "A"}))]);

    let config = MigratorConfig::builder().target_version("V2").build();
    let report = Migrator::with_config(JsonStore::new(), config)
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap();

    assert_eq!(report.migrated_versions, ["V2"]);
    assert_eq!(version_tag(&location), "V2");
    assert_eq!(
        read_records(&location),
        vec![record(json!({"name": "A", "age": 0}))]
    );
}

#[test]
fn backward_target_override_is_invalid() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(&location, "V3", &[record(json!({"fullName": "A"}))]);
    let before = store_bytes(&location);

    let config = MigratorConfig::builder().target_version("V1").build();
    let err = Migrator::with_config(JsonStore::new(), config)
        .migrate_if_needed(&location, &three_version_catalog())
        .unwrap_err();

    assert!(matches!(err, MigrationError::InvalidTarget { .. }));
    assert_eq!(store_bytes(&location), before);
}

#[test]
fn lock_is_released_after_a_failed_run() {
    let dir = TempDir::new().unwrap();
    let location = dir.path().join("addressbook.store");
    write_store(&location, "V0", &[record(json!({"name": "A"}))]);

    let migrator = Migrator::json();
    let catalog = three_version_catalog();
    migrator.migrate_if_needed(&location, &catalog).unwrap_err();

    // The lock from the failed run must not linger.
    StoreLock::acquire(&location).unwrap();
}
