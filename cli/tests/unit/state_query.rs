//! Tests for the single-property state queries.

#![allow(clippy::expect_used)]

use bbl_cli::application::services::state_query::query;
use bbl_cli::domain::state::EnvironmentState;
use bbl_cli::domain::{QueryError, StateProperty};

use crate::mocks::FakeApplier;

fn managed_environment() -> EnvironmentState {
    let mut state = EnvironmentState::default();
    state.env_id = "bbl-env-lake-fox-abc1234".to_string();
    state.jumpbox.url = "35.1.2.4:22".to_string();
    state.bosh.director_username = "admin".to_string();
    state.bosh.director_password = "secret".to_string();
    state.bosh.director_address = "https://35.1.2.3:25555".to_string();
    state.bosh.director_ssl_ca = "-----BEGIN CERTIFICATE-----".to_string();
    state
}

#[tokio::test]
async fn test_every_property_reads_from_state() {
    let state = managed_environment();
    let applier = FakeApplier::default();
    let expected = [
        (StateProperty::EnvId, "bbl-env-lake-fox-abc1234"),
        (StateProperty::JumpboxAddress, "35.1.2.4:22"),
        (StateProperty::DirectorUsername, "admin"),
        (StateProperty::DirectorPassword, "secret"),
        (StateProperty::DirectorAddress, "https://35.1.2.3:25555"),
        (StateProperty::DirectorCaCert, "-----BEGIN CERTIFICATE-----"),
    ];

    for (property, value) in expected {
        assert_eq!(
            query(property, &state, &applier).await.expect("query"),
            value,
            "{property:?}"
        );
    }
}

#[tokio::test]
async fn test_unset_property_names_it() {
    let applier = FakeApplier::default();

    let err = query(
        StateProperty::DirectorPassword,
        &EnvironmentState::default(),
        &applier,
    )
    .await
    .expect_err("should fail");

    assert!(matches!(
        err.downcast_ref::<QueryError>(),
        Some(QueryError::PropertyUnset("director password"))
    ));
    assert_eq!(
        err.to_string(),
        "Could not retrieve director password, please make sure you are targeting the proper state dir."
    );
}

#[tokio::test]
async fn test_no_director_rejects_director_properties() {
    let mut state = managed_environment();
    state.no_director = true;
    let applier = FakeApplier::default();

    for property in [
        StateProperty::JumpboxAddress,
        StateProperty::DirectorUsername,
        StateProperty::DirectorPassword,
        StateProperty::DirectorCaCert,
    ] {
        let err = query(property, &state, &applier)
            .await
            .expect_err("should fail");
        assert_eq!(err.to_string(), "Error BBL does not manage this director.");
    }
    assert_eq!(
        query(StateProperty::EnvId, &state, &applier)
            .await
            .expect("env id"),
        "bbl-env-lake-fox-abc1234"
    );
}

#[tokio::test]
async fn test_no_director_address_comes_from_external_ip() {
    let mut state = EnvironmentState::default();
    state.no_director = true;
    let applier = FakeApplier::default();

    let address = query(StateProperty::DirectorAddress, &state, &applier)
        .await
        .expect("address");

    assert_eq!(address, "https://35.1.2.3:25555");
}

#[tokio::test]
async fn test_no_director_address_without_external_ip_is_unset() {
    let mut state = EnvironmentState::default();
    state.no_director = true;
    let applier = FakeApplier {
        outputs: bbl_cli::domain::Outputs::default(),
        ..FakeApplier::default()
    };

    let err = query(StateProperty::DirectorAddress, &state, &applier)
        .await
        .expect_err("should fail");

    assert!(matches!(
        err.downcast_ref::<QueryError>(),
        Some(QueryError::PropertyUnset(_))
    ));
}

#[tokio::test]
async fn test_no_director_address_propagates_output_errors() {
    let mut state = EnvironmentState::default();
    state.no_director = true;
    let applier = FakeApplier {
        outputs_error: Some("terraform output failed".to_string()),
        ..FakeApplier::default()
    };

    let err = query(StateProperty::DirectorAddress, &state, &applier)
        .await
        .expect_err("should fail");

    assert_eq!(err.to_string(), "terraform output failed");
}
