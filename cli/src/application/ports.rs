//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`; never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;

use anyhow::Result;

use crate::domain::Outputs;
use crate::domain::state::{EnvironmentState, KeyPair};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Outcome of one attempt of a retried call.
#[derive(Debug)]
pub enum Attempt {
    /// Worth trying again (connection refused, reset, timeout).
    Transient(anyhow::Error),
    /// Retrying cannot help (bad status, bad payload).
    Terminal(anyhow::Error),
}

impl Attempt {
    #[must_use]
    pub fn into_error(self) -> anyhow::Error {
        match self {
            Self::Transient(e) | Self::Terminal(e) => e,
        }
    }
}

/// Identity reported by a running director.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorInfo {
    pub name: String,
    pub uuid: String,
    pub version: String,
}

/// Freshly generated SSH key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKey {
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// Public key in `authorized_keys` format, without trailing newline.
    pub public_key: String,
}

// ── Partial State ─────────────────────────────────────────────────────────────

/// Capability of a failed step to report the state it left behind.
pub trait PartialStateProvider {
    /// Reconstruct the state as it stood when the step failed.
    ///
    /// # Errors
    ///
    /// Returns an error when the partial state cannot be read back.
    fn recover_state(&self) -> Result<EnvironmentState>;
}

/// Failure of a state-producing step.
///
/// Carries the step error and, when the step got far enough to change real
/// resources, a way to recover the state it produced.
pub struct StepFailure {
    error: anyhow::Error,
    partial: Option<Box<dyn PartialStateProvider + Send + Sync>>,
}

impl StepFailure {
    #[must_use]
    pub fn new(error: anyhow::Error) -> Self {
        Self {
            error,
            partial: None,
        }
    }

    #[must_use]
    pub fn with_partial(
        error: anyhow::Error,
        partial: impl PartialStateProvider + Send + Sync + 'static,
    ) -> Self {
        Self {
            error,
            partial: Some(Box::new(partial)),
        }
    }

    /// The partial state capability, if the step offered one.
    #[must_use]
    pub fn partial(&self) -> Option<&(dyn PartialStateProvider + Send + Sync)> {
        self.partial.as_deref()
    }

    #[must_use]
    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    #[must_use]
    pub fn into_error(self) -> anyhow::Error {
        self.error
    }
}

impl From<anyhow::Error> for StepFailure {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error)
    }
}

impl std::fmt::Debug for StepFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepFailure")
            .field("error", &self.error)
            .field("partial", &self.partial.is_some())
            .finish()
    }
}

/// Result of a state-producing step.
pub type StepResult = std::result::Result<EnvironmentState, StepFailure>;

// ── State Port ────────────────────────────────────────────────────────────────

/// Abstracts environment state persistence (load/save).
#[allow(async_fn_in_trait)]
pub trait StateStore {
    /// Load the state, returning the zero value when none was saved yet.
    async fn load(&self) -> Result<EnvironmentState>;
    /// Persist the given state. An all-zero state removes the document.
    async fn save(&self, state: &EnvironmentState) -> Result<()>;
}

// ── Cloud Ports ───────────────────────────────────────────────────────────────

/// Read-only queries against the cloud provider.
#[allow(async_fn_in_trait)]
pub trait CloudProvider {
    /// Availability zones of a region, in provider order.
    async fn zones_for(&self, region: &str) -> Result<Vec<String>>;
    /// Whether resources already exist for an environment name.
    async fn name_exists(&self, name: &str) -> Result<bool>;
}

/// Produces candidate environment names.
pub trait NameGenerator {
    /// A fresh `bbl-env-{adjective}-{noun}-{suffix}` candidate.
    fn candidate(&self) -> String;
}

/// Produces the infrastructure template for an environment.
pub trait TemplateGenerator {
    fn generate(&self, state: &EnvironmentState) -> String;
}

/// Creates, destroys and inspects the network-level infrastructure.
#[allow(async_fn_in_trait)]
pub trait InfrastructureApplier {
    /// Converge the infrastructure, returning the state with the new snapshot.
    async fn apply(&self, state: &EnvironmentState) -> StepResult;
    /// Tear the infrastructure down, returning the state with the snapshot cleared.
    async fn destroy(&self, state: &EnvironmentState) -> StepResult;
    /// Outputs of the applied infrastructure.
    async fn outputs(&self, state: &EnvironmentState) -> Result<Outputs>;
}

// ── Director Ports ────────────────────────────────────────────────────────────

/// Deploys and deletes the jumpbox and the director.
#[allow(async_fn_in_trait)]
pub trait DirectorDeployer {
    async fn create_jumpbox(&self, state: &EnvironmentState, outputs: &Outputs) -> StepResult;
    async fn create_director(&self, state: &EnvironmentState, outputs: &Outputs) -> StepResult;
    async fn delete_jumpbox(&self, state: &EnvironmentState) -> StepResult;
    async fn delete_director(&self, state: &EnvironmentState) -> StepResult;
}

/// API of a running director.
///
/// Each call is a single attempt; the caller decides whether to retry.
#[allow(async_fn_in_trait)]
pub trait DirectorClient {
    async fn update_cloud_config(&self, yaml: &str) -> std::result::Result<(), Attempt>;
    async fn info(&self) -> std::result::Result<DirectorInfo, Attempt>;
}

/// Builds a [`DirectorClient`] for the director recorded in a state.
pub trait DirectorClientFactory {
    type Client: DirectorClient;

    /// # Errors
    ///
    /// Returns an error when the state lacks the director address or credentials.
    fn client_for(&self, state: &EnvironmentState) -> Result<Self::Client>;
}

// ── Key Pair Ports ────────────────────────────────────────────────────────────

/// Provisions the SSH key pair used to reach the environment.
#[allow(async_fn_in_trait)]
pub trait KeyPairUpdater {
    async fn update(&self, env_id: &str) -> Result<KeyPair>;
}

/// Generates RSA key pairs.
#[allow(async_fn_in_trait)]
pub trait KeyGenerator {
    async fn generate(&self) -> Result<GeneratedKey>;
}

/// Project-wide SSH key metadata.
#[allow(async_fn_in_trait)]
pub trait ProjectMetadata {
    /// Current `sshKeys` value, or `None` when the project has none.
    async fn ssh_keys(&self) -> Result<Option<String>>;
    /// Replace the `sshKeys` value.
    async fn set_ssh_keys(&self, value: &str) -> Result<()>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program from `dir` and capture its output.
    async fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait; no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
