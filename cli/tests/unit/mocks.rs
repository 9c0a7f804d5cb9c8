//! Shared recording fakes for the application ports.
//!
//! Every fake records what it was asked to do so scenario tests can assert on
//! call order and on the state snapshots the orchestrators passed in.

#![allow(clippy::expect_used, dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use bbl_cli::application::ports::{
    Attempt, CloudProvider, DirectorClient, DirectorClientFactory, DirectorDeployer, DirectorInfo,
    InfrastructureApplier, KeyPairUpdater, NameGenerator, PartialStateProvider, ProgressReporter,
    StateStore, StepFailure, StepResult,
};
use bbl_cli::domain::Outputs;
use bbl_cli::domain::state::{EnvironmentState, KeyPair};

// ── State store ───────────────────────────────────────────────────────────────

/// In-memory store recording every saved snapshot.
#[derive(Default)]
pub struct MemoryStateStore {
    pub current: Mutex<EnvironmentState>,
    pub saves: Mutex<Vec<EnvironmentState>>,
    /// Number of saves that succeed before every further save fails.
    pub fail_after: Mutex<Option<(usize, String)>>,
}

impl MemoryStateStore {
    pub fn with_state(state: EnvironmentState) -> Self {
        Self {
            current: Mutex::new(state),
            ..Self::default()
        }
    }

    /// Let `ok` saves through, then fail with `message`.
    pub fn fail_saves_after(&self, ok: usize, message: &str) {
        *self.fail_after.lock().expect("lock") = Some((ok, message.to_string()));
    }

    pub fn saves(&self) -> Vec<EnvironmentState> {
        self.saves.lock().expect("lock").clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().expect("lock").len()
    }

    pub fn current(&self) -> EnvironmentState {
        self.current.lock().expect("lock").clone()
    }
}

impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<EnvironmentState> {
        Ok(self.current())
    }

    async fn save(&self, state: &EnvironmentState) -> Result<()> {
        if let Some((ok, message)) = self.fail_after.lock().expect("lock").as_ref() {
            if self.save_count() >= *ok {
                return Err(anyhow!("{message}"));
            }
        }
        self.saves.lock().expect("lock").push(state.clone());
        *self.current.lock().expect("lock") = state.clone();
        Ok(())
    }
}

// ── Cloud provider and names ──────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeProvider {
    pub zones: Vec<String>,
    pub taken: Vec<String>,
    pub zone_error: Option<String>,
    pub zone_calls: Mutex<u32>,
    pub lookups: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn with_zones(zones: &[&str]) -> Self {
        Self {
            zones: zones.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn zone_calls(&self) -> u32 {
        *self.zone_calls.lock().expect("lock")
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().expect("lock").clone()
    }
}

impl CloudProvider for FakeProvider {
    async fn zones_for(&self, _region: &str) -> Result<Vec<String>> {
        *self.zone_calls.lock().expect("lock") += 1;
        match &self.zone_error {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(self.zones.clone()),
        }
    }

    async fn name_exists(&self, name: &str) -> Result<bool> {
        self.lookups.lock().expect("lock").push(name.to_string());
        Ok(self.taken.iter().any(|t| t == name))
    }
}

/// Hands out queued candidates, then a fixed fallback.
#[derive(Default)]
pub struct FakeNames {
    pub queue: Mutex<VecDeque<String>>,
}

impl FakeNames {
    pub fn new(candidates: &[&str]) -> Self {
        Self {
            queue: Mutex::new(candidates.iter().map(ToString::to_string).collect()),
        }
    }
}

impl NameGenerator for FakeNames {
    fn candidate(&self) -> String {
        self.queue
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| "bbl-env-calm-otter-2024abc".to_string())
    }
}

// ── Key pairs ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeKeyPairs {
    pub calls: Mutex<Vec<String>>,
}

impl FakeKeyPairs {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }
}

impl KeyPairUpdater for FakeKeyPairs {
    async fn update(&self, env_id: &str) -> Result<KeyPair> {
        self.calls.lock().expect("lock").push(env_id.to_string());
        Ok(KeyPair {
            name: format!("keypair-{env_id}"),
            private_key: "private-key".to_string(),
            public_key: "public-key".to_string(),
        })
    }
}

// ── Partial state ─────────────────────────────────────────────────────────────

/// Partial state capability with a canned answer.
pub struct CannedPartial(pub std::result::Result<EnvironmentState, String>);

impl PartialStateProvider for CannedPartial {
    fn recover_state(&self) -> Result<EnvironmentState> {
        self.0.clone().map_err(|message| anyhow!("{message}"))
    }
}

/// How a faked step should fail.
#[derive(Clone)]
pub struct Failure {
    pub message: String,
    pub partial: Option<std::result::Result<EnvironmentState, String>>,
}

impl Failure {
    pub fn plain(message: &str) -> Self {
        Self {
            message: message.to_string(),
            partial: None,
        }
    }

    pub fn with_partial(message: &str, partial: EnvironmentState) -> Self {
        Self {
            message: message.to_string(),
            partial: Some(Ok(partial)),
        }
    }

    pub fn with_broken_partial(message: &str, recovery_error: &str) -> Self {
        Self {
            message: message.to_string(),
            partial: Some(Err(recovery_error.to_string())),
        }
    }

    fn into_step_failure(self) -> StepFailure {
        let error = anyhow!("{}", self.message);
        match self.partial {
            None => StepFailure::new(error),
            Some(partial) => StepFailure::with_partial(error, CannedPartial(partial)),
        }
    }
}

// ── Infrastructure applier ────────────────────────────────────────────────────

pub struct FakeApplier {
    pub tf_state: String,
    pub apply_failure: Option<Failure>,
    pub destroy_failure: Option<Failure>,
    pub outputs_error: Option<String>,
    pub outputs: Outputs,
    pub applied: Mutex<Vec<EnvironmentState>>,
    pub destroyed: Mutex<Vec<EnvironmentState>>,
}

impl Default for FakeApplier {
    fn default() -> Self {
        Self {
            tf_state: "tf1".to_string(),
            apply_failure: None,
            destroy_failure: None,
            outputs_error: None,
            outputs: infrastructure_outputs(),
            applied: Mutex::new(Vec::new()),
            destroyed: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApplier {
    pub fn applied(&self) -> Vec<EnvironmentState> {
        self.applied.lock().expect("lock").clone()
    }

    pub fn destroyed(&self) -> Vec<EnvironmentState> {
        self.destroyed.lock().expect("lock").clone()
    }
}

impl InfrastructureApplier for FakeApplier {
    async fn apply(&self, state: &EnvironmentState) -> StepResult {
        self.applied.lock().expect("lock").push(state.clone());
        if let Some(failure) = &self.apply_failure {
            return Err(failure.clone().into_step_failure());
        }
        let mut next = state.clone();
        next.tf_state.clone_from(&self.tf_state);
        Ok(next)
    }

    async fn destroy(&self, state: &EnvironmentState) -> StepResult {
        self.destroyed.lock().expect("lock").push(state.clone());
        if let Some(failure) = &self.destroy_failure {
            return Err(failure.clone().into_step_failure());
        }
        let mut next = state.clone();
        next.tf_state.clear();
        Ok(next)
    }

    async fn outputs(&self, _state: &EnvironmentState) -> Result<Outputs> {
        match &self.outputs_error {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(self.outputs.clone()),
        }
    }
}

pub fn infrastructure_outputs() -> Outputs {
    [
        ("network_name", "bbl-env-network"),
        ("subnetwork_name", "bbl-env-subnet"),
        ("internal_cidr", "10.0.0.0/16"),
        ("internal_gw", "10.0.0.1"),
        ("internal_tag_name", "bbl-env-internal"),
        ("external_ip", "35.1.2.3"),
    ]
    .into_iter()
    .collect()
}

// ── Director deployer ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeDeployer {
    /// Operation name (`create_jumpbox`, `delete_director`, ...) to fail.
    pub fail_on: Option<(&'static str, Failure)>,
    pub calls: Mutex<Vec<&'static str>>,
    pub user_ops_files: Mutex<Vec<String>>,
}

impl FakeDeployer {
    pub fn failing(operation: &'static str, failure: Failure) -> Self {
        Self {
            fail_on: Some((operation, failure)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn user_ops_files(&self) -> Vec<String> {
        self.user_ops_files.lock().expect("lock").clone()
    }

    fn record(&self, operation: &'static str) -> Result<(), StepFailure> {
        self.calls.lock().expect("lock").push(operation);
        match &self.fail_on {
            Some((op, failure)) if *op == operation => Err(failure.clone().into_step_failure()),
            _ => Ok(()),
        }
    }
}

impl DirectorDeployer for FakeDeployer {
    async fn create_jumpbox(&self, state: &EnvironmentState, _outputs: &Outputs) -> StepResult {
        self.record("create_jumpbox")?;
        let mut next = state.clone();
        next.jumpbox.url = "35.1.2.4:22".to_string();
        next.jumpbox.manifest = "name: jumpbox".to_string();
        Ok(next)
    }

    async fn create_director(&self, state: &EnvironmentState, _outputs: &Outputs) -> StepResult {
        self.record("create_director")?;
        self.user_ops_files
            .lock()
            .expect("lock")
            .push(state.bosh.user_ops_file.clone());
        let mut next = state.clone();
        next.bosh.director_name = format!("bosh-{}", state.env_id);
        next.bosh.director_username = "admin".to_string();
        next.bosh.director_password = "secret".to_string();
        next.bosh.director_address = "https://35.1.2.3:25555".to_string();
        next.bosh.director_ssl_ca = "-----BEGIN CERTIFICATE-----".to_string();
        Ok(next)
    }

    async fn delete_jumpbox(&self, state: &EnvironmentState) -> StepResult {
        self.record("delete_jumpbox")?;
        Ok(state.clone())
    }

    async fn delete_director(&self, state: &EnvironmentState) -> StepResult {
        self.record("delete_director")?;
        Ok(state.clone())
    }
}

// ── Director client ───────────────────────────────────────────────────────────

/// Scripted outcome of one director call.
#[derive(Clone, Copy)]
pub enum Scripted {
    Transient(&'static str),
    Terminal(&'static str),
}

impl Scripted {
    fn into_attempt(self) -> Attempt {
        match self {
            Self::Transient(m) => Attempt::Transient(anyhow!(m)),
            Self::Terminal(m) => Attempt::Terminal(anyhow!(m)),
        }
    }
}

#[derive(Default)]
pub struct DirectorScript {
    pub updates: Mutex<VecDeque<Scripted>>,
    pub infos: Mutex<VecDeque<Scripted>>,
    pub cloud_configs: Mutex<Vec<String>>,
    pub update_calls: Mutex<u32>,
    pub info_calls: Mutex<u32>,
}

/// Director client and its factory in one. Clones share the script.
#[derive(Clone, Default)]
pub struct FakeDirector {
    pub script: Arc<DirectorScript>,
}

impl FakeDirector {
    pub fn script_updates(&self, outcomes: &[Scripted]) {
        self.script
            .updates
            .lock()
            .expect("lock")
            .extend(outcomes.iter().copied());
    }

    pub fn script_infos(&self, outcomes: &[Scripted]) {
        self.script
            .infos
            .lock()
            .expect("lock")
            .extend(outcomes.iter().copied());
    }

    pub fn cloud_configs(&self) -> Vec<String> {
        self.script.cloud_configs.lock().expect("lock").clone()
    }

    pub fn update_calls(&self) -> u32 {
        *self.script.update_calls.lock().expect("lock")
    }

    pub fn info_calls(&self) -> u32 {
        *self.script.info_calls.lock().expect("lock")
    }
}

impl DirectorClient for FakeDirector {
    async fn update_cloud_config(&self, yaml: &str) -> Result<(), Attempt> {
        *self.script.update_calls.lock().expect("lock") += 1;
        if let Some(outcome) = self.script.updates.lock().expect("lock").pop_front() {
            return Err(outcome.into_attempt());
        }
        self.script
            .cloud_configs
            .lock()
            .expect("lock")
            .push(yaml.to_string());
        Ok(())
    }

    async fn info(&self) -> Result<DirectorInfo, Attempt> {
        *self.script.info_calls.lock().expect("lock") += 1;
        if let Some(outcome) = self.script.infos.lock().expect("lock").pop_front() {
            return Err(outcome.into_attempt());
        }
        Ok(DirectorInfo {
            name: "bosh-director".to_string(),
            uuid: "0000-1111".to_string(),
            version: "280.0.0".to_string(),
        })
    }
}

impl DirectorClientFactory for FakeDirector {
    type Client = FakeDirector;

    fn client_for(&self, _state: &EnvironmentState) -> Result<Self::Client> {
        Ok(self.clone())
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("lock").clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("warn: ").map(String::from))
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("step: {message}"));
    }

    fn success(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("success: {message}"));
    }

    fn warn(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("warn: {message}"));
    }
}
