//! Configuration store error-message and atomic-write-safety tests.

use std::fs;

use assert_fs::prelude::*;
use minisync_core::{
    config::{config_dir_at, config_path_at, default_config_at},
    ConfigError, ConfigStore, Configuration, LogicalClock,
};
use predicates::prelude::predicate;

fn sample() -> Configuration {
    Configuration::new(
        "10.1.1.1",
        "carol",
        "/srv/carol",
        "/home/carol/sync",
        LogicalClock::from_ymd_hms(2024, 4, 1, 9, 15, 0).expect("date"),
    )
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn read_missing_config_returns_not_found() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = ConfigStore::at(home.path()).read().unwrap_err();
    assert!(matches!(err, ConfigError::ConfigNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("configuration not found"));
    assert!(err.to_string().contains("config.jsonc"));
}

#[test]
fn read_corrupt_json_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    fs::create_dir_all(config_dir_at(home.path())).expect("mkdir");
    fs::write(config_path_at(home.path()), b"{ \"ip\": \"10.0.0.1\", ").expect("write");

    let err = ConfigStore::at(home.path()).read().unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("config.jsonc"), "must contain file path, got: {msg}");
}

#[test]
fn read_missing_field_returns_parse_error_naming_field() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    fs::create_dir_all(config_dir_at(home.path())).expect("mkdir");
    let mut value = serde_json::to_value(sample()).expect("to value");
    value.as_object_mut().expect("object").remove("serverDirectory");
    fs::write(config_path_at(home.path()), value.to_string()).expect("write");

    let err = ConfigStore::at(home.path()).read().unwrap_err();
    let source_msg = match &err {
        ConfigError::Parse { source, .. } => source.to_string(),
        other => panic!("expected parse error, got {other:?}"),
    };
    assert!(source_msg.contains("serverDirectory"), "got: {source_msg}");
}

#[test]
fn read_wrong_typed_clock_returns_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    fs::create_dir_all(config_dir_at(home.path())).expect("mkdir");
    let mut value = serde_json::to_value(sample()).expect("to value");
    value["time"]["year"] = serde_json::json!("2024");
    fs::write(config_path_at(home.path()), value.to_string()).expect("write");

    let err = ConfigStore::at(home.path()).read().unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn interrupted_write_leaves_original_intact() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let store = ConfigStore::at(home.path());
    store.write(&sample()).expect("write");
    let original_bytes = fs::read(store.path()).expect("read original");

    // Simulate a crash: temporary written but process died before rename.
    let tmp = store.path().with_file_name("config.jsonc.a1b2c3.tmp");
    fs::write(&tmp, b"CRASH - INCOMPLETE WRITE").expect("write crash tmp");

    let current_bytes = fs::read(store.path()).expect("read after crash");
    assert_eq!(original_bytes, current_bytes, "original must be unchanged after crash");
    assert_eq!(store.read().expect("read").ip, "10.1.1.1");
}

#[test]
fn stale_tmp_does_not_block_next_write() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let store = ConfigStore::at(home.path());
    store.write(&sample()).expect("write");
    let tmp = store.path().with_file_name("config.jsonc.a1b2c3.tmp");
    fs::write(&tmp, b"stale").expect("stale tmp");

    let mut updated = sample();
    updated.ip = "10.1.1.2".into();
    store.write(&updated).expect("rewrite");
    assert_eq!(fs::read(&tmp).expect("stale tmp untouched"), b"stale");
    assert_eq!(store.read().expect("read").ip, "10.1.1.2");
}

#[test]
fn concurrent_writers_never_expose_a_torn_document() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let store = ConfigStore::at(home.path());
    store.write(&sample()).expect("seed");

    std::thread::scope(|scope| {
        for writer in 0..4 {
            let store = &store;
            scope.spawn(move || {
                for round in 0..25 {
                    let mut config = sample();
                    config.ip = format!("10.{writer}.{round}.1");
                    store.write(&config).expect("write");
                }
            });
        }
        let store = &store;
        scope.spawn(move || {
            for _ in 0..100 {
                let config = store.read().expect("reader sees a complete document");
                assert!(config.ip.starts_with("10."));
            }
        });
    });

    let names: Vec<String> = fs::read_dir(config_dir_at(home.path()))
        .expect("list")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["config.jsonc".to_string()]);
    assert!(store.read().expect("final read").ip.ends_with(".24.1"));
}

// ---------------------------------------------------------------------------
// 3. Bootstrap
// ---------------------------------------------------------------------------

#[test]
fn bootstrap_writes_defaults_file() {
    let home = assert_fs::TempDir::new().expect("home tempdir");
    let store = ConfigStore::at(home.path());
    assert!(store.bootstrap(&default_config_at(home.path())).expect("bootstrap"));

    home.child(".config/minisync/config.jsonc")
        .assert(predicate::path::exists());
    home.child(".config/minisync/config.jsonc")
        .assert(predicate::str::contains("\"ip\": \"127.0.0.1\""));
}

#[test]
fn from_path_store_reads_arbitrary_file() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("custom.json");
    let store = ConfigStore::from_path(file.path());
    store.write(&sample()).expect("write");
    file.assert(predicate::str::contains("\"hostName\": \"carol\""));
    assert_eq!(store.read().expect("read"), sample());
}
