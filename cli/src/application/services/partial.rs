//! Shared handling of failed state-producing steps.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use crate::application::ports::{StateStore, StepFailure};
use crate::domain::combine;
use crate::domain::state::EnvironmentState;

/// Save whatever a failed step left behind and build the error to surface.
///
/// - no partial capability: the step error, nothing saved
/// - recovery fails: step error combined with the recovery error, nothing saved
/// - recovery succeeds: the partial state is saved; the step error is combined
///   with the save error, if any
pub async fn save_partial_state(
    store: &impl StateStore,
    failure: StepFailure,
    working: &EnvironmentState,
) -> anyhow::Error {
    let recovered = match failure.partial() {
        None => return failure.into_error(),
        Some(partial) => partial.recover_state(),
    };

    match recovered {
        Err(recovery_err) => {
            tracing::warn!(error = %recovery_err, "could not recover partial state");
            combine(failure.into_error(), Some(recovery_err))
        }
        Ok(mut partial_state) => {
            partial_state.inherit_secrets(working);
            let save_err = store.save(&partial_state).await.err();
            if save_err.is_none() {
                tracing::info!("partial state saved after step failure");
            }
            combine(failure.into_error(), save_err)
        }
    }
}
