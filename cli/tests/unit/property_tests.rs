//! Property-based tests for naming, redaction, error merging and retries.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use proptest::prelude::*;

use bbl_cli::application::ports::Attempt;
use bbl_cli::application::services::retry::Retrier;
use bbl_cli::domain::combine;
use bbl_cli::domain::env_id::{ADJECTIVES, MAX_NAME_LEN, NOUNS, compose_name, validate_name};
use bbl_cli::domain::state::EnvironmentState;
use bbl_cli::infra::state::to_tab_indented_json;

// ============================================================================
// Environment names
// ============================================================================

proptest! {
    /// Every generated name is a valid user-supplied name too.
    #[test]
    fn prop_composed_names_are_valid(
        adjective in proptest::sample::select(ADJECTIVES),
        noun in proptest::sample::select(NOUNS),
        suffix in "[a-z0-9]{7}",
    ) {
        let name = compose_name(adjective, noun, &suffix);
        prop_assert!(validate_name(&name).is_ok(), "{}", name);
    }

    /// Upper-case letters and underscores are always rejected.
    #[test]
    fn prop_names_with_forbidden_chars_are_rejected(
        prefix in "[a-z]{1,10}",
        bad in "[A-Z_ .]",
        rest in "[a-z0-9]{0,10}",
    ) {
        let name = format!("{prefix}{bad}{rest}");
        prop_assert!(validate_name(&name).is_err(), "{}", name);
    }

    /// Length above the cap is rejected whatever the characters.
    #[test]
    fn prop_overlong_names_are_rejected(extra in 1usize..20) {
        let name = "a".repeat(MAX_NAME_LEN + extra);
        prop_assert!(validate_name(&name).is_err());
    }
}

// ============================================================================
// Secret redaction
// ============================================================================

proptest! {
    /// Whatever the secrets are, the serialized document never carries them.
    #[test]
    fn prop_serialized_state_never_contains_secrets(
        key in "SECRET[a-z0-9]{8,16}",
        aws in "SECRET[a-z0-9]{8,16}",
        azure in "SECRET[a-z0-9]{8,16}",
        region in "[a-z]{2}-[a-z]{4,8}[0-9]",
    ) {
        let mut state = EnvironmentState::default();
        state.iaas = "gcp".to_string();
        state.gcp.region = region.clone();
        state.gcp.service_account_key = key;
        state.aws.secret_access_key = aws;
        state.azure.client_secret = azure;

        let redacted = state.without_secrets();
        let text = String::from_utf8(to_tab_indented_json(&redacted).expect("json")).expect("utf8");
        prop_assert!(!text.contains("SECRET"), "{}", text);
        prop_assert!(text.contains(&region));
        prop_assert_eq!(redacted.without_secrets(), redacted);
    }

    /// Secrets inherited back from the working copy restore it exactly.
    #[test]
    fn prop_inherit_secrets_undoes_redaction(key in "[a-zA-Z0-9{}:\"]{1,40}") {
        let mut working = EnvironmentState::default();
        working.gcp.service_account_key = key;
        working.gcp.project_id = "p".to_string();

        let mut restored = working.without_secrets();
        restored.inherit_secrets(&working);
        prop_assert_eq!(restored, working);
    }
}

// ============================================================================
// Compound errors
// ============================================================================

proptest! {
    /// The step error always comes first.
    #[test]
    fn prop_combine_orders_primary_first(
        primary in "[a-z ]{1,30}",
        secondary in "[a-z ]{1,30}",
    ) {
        let err = combine(anyhow::anyhow!("{primary}"), Some(anyhow::anyhow!("{secondary}")));
        prop_assert_eq!(
            err.to_string(),
            format!("the following errors occurred:\n{primary},\n{secondary}")
        );
    }

    /// Without a secondary error the primary passes through untouched.
    #[test]
    fn prop_combine_without_secondary_is_identity(primary in "[a-z ]{1,30}") {
        let err = combine(anyhow::anyhow!("{primary}"), None);
        prop_assert_eq!(err.to_string(), primary);
    }
}

// ============================================================================
// Retrier
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Succeeding on attempt k makes exactly k calls.
    #[test]
    fn prop_retrier_stops_at_first_success(attempts in 1u32..6, succeed_on in 1u32..6) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        let calls = AtomicU32::new(0);
        let retrier = Retrier::new(attempts, Duration::ZERO);

        let result = runtime.block_on(retrier.run("op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n >= succeed_on {
                    Ok(n)
                } else {
                    Err(Attempt::Transient(anyhow::anyhow!("try {n}")))
                }
            }
        }));

        if succeed_on <= attempts {
            prop_assert_eq!(result.expect("success"), succeed_on);
            prop_assert_eq!(calls.load(Ordering::SeqCst), succeed_on);
        } else {
            let err = result.expect_err("exhausted");
            prop_assert_eq!(calls.load(Ordering::SeqCst), attempts);
            let expected = format!("made {attempts} attempts, last error: try {attempts}");
            prop_assert_eq!(err.to_string(), expected);
        }
    }
}
