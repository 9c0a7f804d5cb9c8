//! Tests for environment name resolution.

#![allow(clippy::expect_used)]

use bbl_cli::application::services::env_id::EnvIdManager;
use bbl_cli::domain::EnvIdError;
use bbl_cli::domain::state::EnvironmentState;

use crate::mocks::{FakeNames, FakeProvider};

#[tokio::test]
async fn test_existing_name_is_kept_without_lookups() {
    let provider = FakeProvider::default();
    let names = FakeNames::default();
    let mut state = EnvironmentState::default();
    state.env_id = "existing".to_string();

    let state = EnvIdManager::new(&provider, &names)
        .sync(state, Some("ignored-name"))
        .await
        .expect("sync");

    assert_eq!(state.env_id, "existing");
    assert!(provider.lookups().is_empty());
}

#[tokio::test]
async fn test_requested_name_is_claimed() {
    let provider = FakeProvider::default();
    let names = FakeNames::default();

    let state = EnvIdManager::new(&provider, &names)
        .sync(EnvironmentState::default(), Some("my-env"))
        .await
        .expect("sync");

    assert_eq!(state.env_id, "my-env");
}

#[tokio::test]
async fn test_requested_name_already_taken() {
    let provider = FakeProvider {
        taken: vec!["my-env".to_string()],
        ..FakeProvider::default()
    };
    let names = FakeNames::default();

    let err = EnvIdManager::new(&provider, &names)
        .sync(EnvironmentState::default(), Some("my-env"))
        .await
        .expect_err("should fail");

    assert!(matches!(
        err.downcast_ref::<EnvIdError>(),
        Some(EnvIdError::NameAlreadyExists(name)) if name == "my-env"
    ));
}

#[tokio::test]
async fn test_invalid_requested_name_is_rejected_before_lookup() {
    let provider = FakeProvider::default();
    let names = FakeNames::default();

    let err = EnvIdManager::new(&provider, &names)
        .sync(EnvironmentState::default(), Some("Not_Valid"))
        .await
        .expect_err("should fail");

    assert!(matches!(
        err.downcast_ref::<EnvIdError>(),
        Some(EnvIdError::InvalidName { .. })
    ));
    assert!(provider.lookups().is_empty());
}

#[tokio::test]
async fn test_generation_skips_taken_candidates() {
    let provider = FakeProvider {
        taken: vec!["bbl-env-a-b-0000001".to_string()],
        ..FakeProvider::default()
    };
    let names = FakeNames::new(&["bbl-env-a-b-0000001", "bbl-env-a-b-0000002"]);

    let state = EnvIdManager::new(&provider, &names)
        .sync(EnvironmentState::default(), None)
        .await
        .expect("sync");

    assert_eq!(state.env_id, "bbl-env-a-b-0000002");
    assert_eq!(provider.lookups().len(), 2);
}

#[tokio::test]
async fn test_generation_gives_up_after_five_taken_candidates() {
    let candidates = [
        "bbl-env-a-b-0000001",
        "bbl-env-a-b-0000002",
        "bbl-env-a-b-0000003",
        "bbl-env-a-b-0000004",
        "bbl-env-a-b-0000005",
    ];
    let provider = FakeProvider {
        taken: candidates.iter().map(ToString::to_string).collect(),
        ..FakeProvider::default()
    };
    let names = FakeNames::new(&candidates);

    let err = EnvIdManager::new(&provider, &names)
        .sync(EnvironmentState::default(), None)
        .await
        .expect_err("should fail");

    assert!(matches!(
        err.downcast_ref::<EnvIdError>(),
        Some(EnvIdError::GenerationExhausted(5))
    ));
    assert_eq!(provider.lookups().len(), 5);
}
