//! Application service: environment provisioning (`bbl up`).
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::{
    CloudProvider, DirectorClient, DirectorClientFactory, DirectorDeployer,
    InfrastructureApplier, KeyPairUpdater, NameGenerator, ProgressReporter, StateStore,
    StepResult,
};
use crate::application::services::env_id::EnvIdManager;
use crate::application::services::partial::save_partial_state;
use crate::application::services::retry::Retrier;
use crate::domain::state::EnvironmentState;
use crate::domain::{Outputs, UpError, cloud_config};

/// Options of one `bbl up` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpConfig {
    /// Requested environment name; ignored once a name is recorded.
    pub name: Option<String>,
    /// Stop after the infrastructure; never deploy a director.
    pub no_director: bool,
    /// Extra ops file applied to the director deployment.
    pub ops_file: Option<PathBuf>,
}

/// Steps of the provisioning workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpStep {
    SyncIdentity,
    DiscoverZones,
    ApplyInfrastructure,
    RetrieveOutputs,
    CreateJumpbox,
    CreateDirector,
    UpdateCloudConfig,
}

impl UpStep {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SyncIdentity => "identity",
            Self::DiscoverZones => "zones",
            Self::ApplyInfrastructure => "infrastructure",
            Self::RetrieveOutputs => "outputs",
            Self::CreateJumpbox => "jumpbox",
            Self::CreateDirector => "director",
            Self::UpdateCloudConfig => "cloud-config",
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::SyncIdentity => "resolving environment name...",
            Self::DiscoverZones => "retrieving availability zones...",
            Self::ApplyInfrastructure => "applying infrastructure...",
            Self::RetrieveOutputs => "reading infrastructure outputs...",
            Self::CreateJumpbox => "creating jumpbox...",
            Self::CreateDirector => "creating bosh director...",
            Self::UpdateCloudConfig => "updating cloud config...",
        }
    }
}

/// The provisioning orchestrator.
///
/// Every step that changes the state saves it before the next step starts,
/// so a re-run resumes from the last completed step.
pub struct Up<'a, S, P, G, K, A, D, F, R>
where
    P: CloudProvider,
    G: NameGenerator,
{
    pub store: &'a S,
    pub env_ids: EnvIdManager<'a, P, G>,
    pub provider: &'a P,
    pub key_pairs: &'a K,
    pub applier: &'a A,
    pub deployer: &'a D,
    pub clients: &'a F,
    pub reporter: &'a R,
    pub retrier: Retrier,
}

impl<S, P, G, K, A, D, F, R> Up<'_, S, P, G, K, A, D, F, R>
where
    S: StateStore,
    P: CloudProvider,
    G: NameGenerator,
    K: KeyPairUpdater,
    A: InfrastructureApplier,
    D: DirectorDeployer,
    F: DirectorClientFactory,
    R: ProgressReporter,
{
    /// Bring the environment up to date, starting from `state`.
    ///
    /// `state` is the in-memory working copy: loaded from the store with the
    /// credentials of this run merged in.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error. When that step left partial
    /// state behind, the partial state is saved first and any failure to do
    /// so is combined into the returned error.
    pub async fn execute(
        &self,
        config: &UpConfig,
        mut state: EnvironmentState,
    ) -> Result<EnvironmentState> {
        if config.no_director && state.has_director() {
            return Err(UpError::DirectorAlreadyExists.into());
        }
        if config.no_director {
            state.no_director = true;
        }

        self.enter(UpStep::SyncIdentity);
        state = self.env_ids.sync(state, config.name.as_deref()).await?;
        self.save(&state).await?;

        self.enter(UpStep::DiscoverZones);
        let region = state.region().to_string();
        let zones = self.provider.zones_for(&region).await?;
        state.set_zones(zones);
        // Saved with the zones: a failed apply must not orphan a registered key.
        if state.key_pair.is_empty() {
            state.key_pair = self.key_pairs.update(&state.env_id).await?;
        }
        self.save(&state).await?;

        self.enter(UpStep::ApplyInfrastructure);
        state = self.converge(&state, self.applier.apply(&state).await).await?;

        self.enter(UpStep::RetrieveOutputs);
        let outputs = self.applier.outputs(&state).await?;

        if state.no_director {
            tracing::info!(env_id = %state.env_id, "skipping director deployment");
            self.reporter.success("infrastructure is up (no director)");
            return Ok(state);
        }

        self.enter(UpStep::CreateJumpbox);
        if let Some(path) = &config.ops_file {
            state.bosh.user_ops_file = tokio::fs::read_to_string(path)
                .await
                .map_err(UpError::OpsFileRead)?;
        }
        state = self
            .converge(&state, self.deployer.create_jumpbox(&state, &outputs).await)
            .await?;

        self.enter(UpStep::CreateDirector);
        state = self
            .converge(&state, self.deployer.create_director(&state, &outputs).await)
            .await?;

        self.enter(UpStep::UpdateCloudConfig);
        self.update_cloud_config(&state, &outputs).await?;

        self.reporter.success("bosh director is up");
        Ok(state)
    }

    fn enter(&self, step: UpStep) {
        tracing::info!(step = step.name(), "up");
        self.reporter.step(step.message());
    }

    async fn save(&self, state: &EnvironmentState) -> Result<()> {
        self.store.save(state).await
    }

    /// Adopt a step's resulting state and save it, or save its partial state
    /// and fail.
    async fn converge(
        &self,
        working: &EnvironmentState,
        result: StepResult,
    ) -> Result<EnvironmentState> {
        match result {
            Ok(mut next) => {
                next.inherit_secrets(working);
                self.save(&next).await?;
                Ok(next)
            }
            Err(failure) => Err(save_partial_state(self.store, failure, working).await),
        }
    }

    async fn update_cloud_config(&self, state: &EnvironmentState, outputs: &Outputs) -> Result<()> {
        let client = self.clients.client_for(state)?;
        let yaml = cloud_config::render(state, outputs)?;

        self.retrier
            .run("update cloud config", || client.update_cloud_config(&yaml))
            .await?;

        match self.retrier.run("director info", || client.info()).await {
            Ok(info) => tracing::info!(
                director = %info.name,
                uuid = %info.uuid,
                version = %info.version,
                "director is reachable"
            ),
            Err(err) => self
                .reporter
                .warn(&format!("could not read director info: {err}")),
        }
        Ok(())
    }
}
