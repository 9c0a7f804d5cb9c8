//! Application service: environment teardown (`bbl destroy`).
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;

use crate::application::ports::{
    DirectorDeployer, InfrastructureApplier, ProgressReporter, StateStore, StepResult,
};
use crate::application::services::partial::save_partial_state;
use crate::domain::DestroyError;
use crate::domain::state::{BoshDirector, EnvironmentState, Jumpbox};

/// Options of one `bbl destroy` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DestroyConfig {
    /// Succeed quietly when there is no environment to destroy.
    pub skip_if_missing: bool,
}

/// What a destroy run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    Destroyed,
    NothingToDestroy,
}

/// `true` when no step of `bbl up` has left anything behind.
#[must_use]
pub fn nothing_to_destroy(state: &EnvironmentState) -> bool {
    state.env_id.is_empty()
        && state.tf_state.is_empty()
        && state.jumpbox.is_empty()
        && state.bosh.is_empty()
}

/// The teardown orchestrator. Runs the provisioning steps backwards.
pub struct Destroy<'a, S, A, D, R> {
    pub store: &'a S,
    pub applier: &'a A,
    pub deployer: &'a D,
    pub reporter: &'a R,
}

impl<S, A, D, R> Destroy<'_, S, A, D, R>
where
    S: StateStore,
    A: InfrastructureApplier,
    D: DirectorDeployer,
    R: ProgressReporter,
{
    /// Tear the environment down, skipping steps already undone.
    ///
    /// # Errors
    ///
    /// Returns [`DestroyError::NothingToDestroy`] for an empty state unless
    /// `skip_if_missing` is set, or the first failing step's error (combined
    /// with any failure to save its partial state).
    pub async fn execute(
        &self,
        config: DestroyConfig,
        mut state: EnvironmentState,
    ) -> Result<DestroyOutcome> {
        if nothing_to_destroy(&state) {
            if config.skip_if_missing {
                tracing::info!("no environment found, skipping destroy");
                return Ok(DestroyOutcome::NothingToDestroy);
            }
            return Err(DestroyError::NothingToDestroy.into());
        }

        if !state.bosh.is_empty() {
            self.enter("director", "deleting bosh director...");
            let result = self.deployer.delete_director(&state).await;
            state = self.converge(&state, result, |s| s.bosh = BoshDirector::default()).await?;
        }

        if !state.jumpbox.is_empty() {
            self.enter("jumpbox", "deleting jumpbox...");
            let result = self.deployer.delete_jumpbox(&state).await;
            state = self.converge(&state, result, |s| s.jumpbox = Jumpbox::default()).await?;
        }

        if !state.tf_state.is_empty() {
            self.enter("infrastructure", "destroying infrastructure...");
            let result = self.applier.destroy(&state).await;
            state = self.converge(&state, result, |s| s.tf_state.clear()).await?;
        }

        self.enter("identity", "releasing environment...");
        tracing::debug!(env_id = %state.env_id, "clearing state");
        self.store.save(&EnvironmentState::default()).await?;

        self.reporter.success("environment destroyed");
        Ok(DestroyOutcome::Destroyed)
    }

    fn enter(&self, step: &'static str, message: &str) {
        tracing::info!(step, "destroy");
        self.reporter.step(message);
    }

    async fn converge(
        &self,
        working: &EnvironmentState,
        result: StepResult,
        clear: impl FnOnce(&mut EnvironmentState),
    ) -> Result<EnvironmentState> {
        match result {
            Ok(mut next) => {
                next.inherit_secrets(working);
                clear(&mut next);
                self.store.save(&next).await?;
                Ok(next)
            }
            Err(failure) => Err(save_partial_state(self.store, failure, working).await),
        }
    }
}
