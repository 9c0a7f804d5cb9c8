//! Tests for the file-backed state store.

#![allow(clippy::expect_used)]

use std::sync::Arc;

use bbl_cli::application::ports::StateStore;
use bbl_cli::domain::StateError;
use bbl_cli::domain::state::{EnvironmentState, STATE_FILE_NAME, STATE_VERSION};
use bbl_cli::infra::state::{FileStateStore, StoreOptions};
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> FileStateStore {
    FileStateStore::with_options(
        dir.path(),
        StoreOptions {
            id_generator: Arc::new(|| "fixed-id".to_string()),
            ..StoreOptions::default()
        },
    )
}

fn write_raw(dir: &TempDir, json: &str) {
    std::fs::write(dir.path().join(STATE_FILE_NAME), json).expect("write");
}

fn sample_state() -> EnvironmentState {
    let mut state = EnvironmentState::default();
    state.iaas = "gcp".to_string();
    state.env_id = "bbl-env-lake-fox-abc1234".to_string();
    state.gcp.region = "us-east1".to_string();
    state.gcp.project_id = "some-project".to_string();
    state.gcp.service_account_key = r#"{"private_key": "SECRET"}"#.to_string();
    state.aws.secret_access_key = "AWS-SECRET".to_string();
    state.azure.client_secret = "AZURE-SECRET".to_string();
    state
}

#[tokio::test]
async fn test_missing_file_loads_empty_state() {
    let dir = tempfile::tempdir().expect("tempdir");

    let state = store_in(&dir).load().await.expect("load");

    assert!(state.is_empty());
}

#[tokio::test]
async fn test_missing_directory_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStateStore::new(dir.path().join("does-not-exist"));

    let err = store.load().await.expect_err("should fail");

    assert!(matches!(
        err.downcast_ref::<StateError>(),
        Some(StateError::DirectoryMissing(_))
    ));
    let err = store
        .save(&sample_state())
        .await
        .expect_err("should fail");
    assert!(matches!(
        err.downcast_ref::<StateError>(),
        Some(StateError::DirectoryMissing(_))
    ));
}

#[tokio::test]
async fn test_old_schema_is_incompatible() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_raw(&dir, r#"{"version": 2, "envID": "old-env"}"#);

    let err = store_in(&dir).load().await.expect_err("should fail");

    assert!(matches!(
        err.downcast_ref::<StateError>(),
        Some(StateError::IncompatibleSchema)
    ));
}

#[tokio::test]
async fn test_newer_schema_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_raw(
        &dir,
        &format!(r#"{{"version": {}, "envID": "future-env"}}"#, STATE_VERSION + 1),
    );

    let err = store_in(&dir).load().await.expect_err("should fail");

    assert!(matches!(
        err.downcast_ref::<StateError>(),
        Some(StateError::NewerSchema { version }) if *version == STATE_VERSION + 1
    ));
}

#[tokio::test]
async fn test_current_schema_loads() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_raw(
        &dir,
        &format!(r#"{{"version": {STATE_VERSION}, "envID": "current-env"}}"#),
    );

    let state = store_in(&dir).load().await.expect("load");

    assert_eq!(state.env_id, "current-env");
}

#[tokio::test]
async fn test_empty_document_normalizes_to_current_version() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_raw(&dir, "{}");

    let state = store_in(&dir).load().await.expect("load");

    assert_eq!(state.version, STATE_VERSION);
}

#[tokio::test]
async fn test_saved_file_never_contains_secrets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);

    store.save(&sample_state()).await.expect("save");

    let raw = std::fs::read_to_string(store.path()).expect("read");
    assert!(!raw.contains("SECRET"), "{raw}");
    assert!(!raw.contains("some-project"), "{raw}");
    let loaded = store.load().await.expect("load");
    assert!(loaded.gcp.service_account_key.is_empty());
    assert_eq!(loaded.gcp.region, "us-east1");
    assert_eq!(loaded.env_id, "bbl-env-lake-fox-abc1234");
}

#[tokio::test]
async fn test_save_stamps_version_and_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    let mut state = sample_state();
    state.version = 3;

    store.save(&state).await.expect("save");

    let loaded = store.load().await.expect("load");
    assert_eq!(loaded.version, STATE_VERSION);
    assert_eq!(loaded.id, "fixed-id");
}

#[tokio::test]
async fn test_saved_document_uses_wire_names_and_tabs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);

    store.save(&sample_state()).await.expect("save");

    let raw = std::fs::read_to_string(store.path()).expect("read");
    assert!(raw.contains("\t\"envID\": \"bbl-env-lake-fox-abc1234\""), "{raw}");
    let doc: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(doc["gcp"]["region"], "us-east1");
}

#[tokio::test]
async fn test_saving_empty_state_removes_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    store.save(&sample_state()).await.expect("save");
    assert!(store.path().exists());

    store.save(&EnvironmentState::default()).await.expect("clear");

    assert!(!store.path().exists());
    store
        .save(&EnvironmentState::default())
        .await
        .expect("clearing twice is fine");
}
