//! Infrastructure implementation of the `DirectorDeployer` port on top of the
//! `bosh` CLI (`create-env` / `delete-env`).

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::{Map, Value};
use serde_yaml::Mapping;
use tempfile::TempDir;

use crate::application::ports::{
    CommandRunner, DirectorDeployer, PartialStateProvider, StepFailure, StepResult,
};
use crate::domain::Outputs;
use crate::domain::query::external_director_address;
use crate::domain::state::{BoshDirector, EnvironmentState, Jumpbox};
use crate::infra::command_runner::stdout_if_success;
use crate::infra::workdir::{Workdir, read_optional_sync};

const STATE_FILE: &str = "state.json";
const VARS_STORE_FILE: &str = "variables.yml";
const VARS_FILE: &str = "deployment-vars.yml";
const MANIFEST_FILE: &str = "manifest.yml";
const CREDENTIALS_FILE: &str = "gcp_credentials.json";
const USER_OPS_FILE: &str = "user-ops-file.yml";

const JUMPBOX_INTERNAL_IP: &str = "10.0.0.5";
const DIRECTOR_INTERNAL_IP: &str = "10.0.0.6";
const DIRECTOR_USERNAME: &str = "admin";

/// Checkouts of the deployment manifests used by `create-env`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSources {
    /// `cloudfoundry/jumpbox-deployment` checkout.
    pub jumpbox_dir: PathBuf,
    /// `cloudfoundry/bosh-deployment` checkout.
    pub bosh_dir: PathBuf,
}

/// Which deployment a call is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Jumpbox,
    Director,
}

impl Target {
    fn label(self) -> &'static str {
        match self {
            Self::Jumpbox => "jumpbox",
            Self::Director => "director",
        }
    }
}

/// Credentials the director vars store generated.
#[derive(Debug, Default, Deserialize)]
struct DirectorVars {
    #[serde(default)]
    admin_password: String,
    #[serde(default)]
    director_ssl: CertificateVars,
}

#[derive(Debug, Default, Deserialize)]
struct CertificateVars {
    #[serde(default)]
    ca: String,
    #[serde(default)]
    certificate: String,
    #[serde(default)]
    private_key: String,
}

/// Deploys the jumpbox and the director with `bosh create-env`.
pub struct BoshCliDeployer<'a, R: CommandRunner> {
    runner: &'a R,
    sources: DeploymentSources,
}

impl<'a, R: CommandRunner> BoshCliDeployer<'a, R> {
    pub fn new(runner: &'a R, sources: DeploymentSources) -> Self {
        Self { runner, sources }
    }

    async fn bosh(&self, dir: &Workdir, args: &[String]) -> Result<String> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.runner.run_in(dir.path(), "bosh", &args).await?;
        stdout_if_success(&format!("bosh {}", args.first().copied().unwrap_or("")), &output)
    }

    fn ops_files(&self, target: Target, state: &EnvironmentState) -> (PathBuf, Vec<PathBuf>) {
        match target {
            Target::Jumpbox => {
                let dir = &self.sources.jumpbox_dir;
                (dir.join("jumpbox.yml"), vec![dir.join("gcp").join("cpi.yml")])
            }
            Target::Director => {
                let dir = &self.sources.bosh_dir;
                let mut ops = vec![
                    dir.join("gcp").join("cpi.yml"),
                    dir.join("external-ip-not-recommended.yml"),
                    dir.join("uaa.yml"),
                    dir.join("credhub.yml"),
                    dir.join("jumpbox-user.yml"),
                ];
                if !state.bosh.user_ops_file.is_empty() {
                    ops.push(PathBuf::from(USER_OPS_FILE));
                }
                (dir.join("bosh.yml"), ops)
            }
        }
    }

    /// Interpolate the manifest and run `create-env` against it.
    async fn create(
        &self,
        target: Target,
        state: &EnvironmentState,
        outputs: &Outputs,
    ) -> StepResult {
        let dir = Workdir::create("bbl-bosh").await?;
        let (previous_state, previous_vars) = section(target, state);
        if !previous_state.is_empty() {
            dir.write(STATE_FILE, serde_json::to_vec(previous_state).context("encoding bosh state")?)
                .await?;
        }
        if !previous_vars.is_empty() {
            dir.write(VARS_STORE_FILE, previous_vars).await?;
        }
        if target == Target::Director && !state.bosh.user_ops_file.is_empty() {
            dir.write(USER_OPS_FILE, state.bosh.user_ops_file.as_str())
                .await?;
        }
        let vars = deployment_vars(target, state, outputs)?;
        dir.write(VARS_FILE, serde_yaml::to_string(&vars).context("encoding deployment vars")?)
            .await?;
        let credentials = dir
            .write(CREDENTIALS_FILE, state.gcp.service_account_key.as_str())
            .await?;

        let (manifest_path, ops) = self.ops_files(target, state);
        let mut interpolate = vec!["interpolate".to_string(), manifest_path.display().to_string()];
        for op in ops {
            interpolate.push("-o".to_string());
            interpolate.push(op.display().to_string());
        }
        interpolate.extend(
            ["--vars-store", VARS_STORE_FILE, "-l", VARS_FILE]
                .iter()
                .map(ToString::to_string),
        );
        let manifest = self.bosh(&dir, &interpolate).await?;
        dir.write(MANIFEST_FILE, manifest.as_str()).await?;

        let mut next = state.clone();
        set_manifest(target, &mut next, manifest);

        tracing::info!(deployment = target.label(), env_id = %state.env_id, "running bosh create-env");
        let create = vec![
            "create-env".to_string(),
            MANIFEST_FILE.to_string(),
            "--state".to_string(),
            STATE_FILE.to_string(),
            "--var-file".to_string(),
            format!("gcp_credentials_json={}", credentials.display()),
        ];
        if let Err(err) = self.bosh(&dir, &create).await {
            return Err(StepFailure::with_partial(
                anyhow!("failed to create {}: {err:#}", target.label()),
                BoshPartialState {
                    dir: dir.into_inner(),
                    target,
                    state: next,
                },
            ));
        }

        let deployment_state = dir.read_optional(STATE_FILE).await?.unwrap_or_default();
        let variables = dir.read_optional(VARS_STORE_FILE).await?.unwrap_or_default();
        apply_files(target, &mut next, &deployment_state, variables)?;
        if target == Target::Director {
            apply_director_credentials(&mut next, outputs)?;
        } else {
            next.jumpbox.url = outputs.get_str("jumpbox_url").unwrap_or_default().to_string();
        }
        Ok(next)
    }

    /// Run `delete-env` against the recorded manifest and state.
    async fn delete(&self, target: Target, state: &EnvironmentState) -> StepResult {
        let dir = Workdir::create("bbl-bosh").await?;
        let (manifest, deployment_state, variables) = match target {
            Target::Jumpbox => (&state.jumpbox.manifest, &state.jumpbox.state, &state.jumpbox.variables),
            Target::Director => (&state.bosh.manifest, &state.bosh.state, &state.bosh.variables),
        };
        if manifest.is_empty() {
            tracing::warn!(deployment = target.label(), "no manifest recorded, nothing to delete");
            return Ok(state.clone());
        }
        dir.write(MANIFEST_FILE, manifest.as_str()).await?;
        dir.write(STATE_FILE, serde_json::to_vec(deployment_state).context("encoding bosh state")?)
            .await?;
        dir.write(VARS_STORE_FILE, variables.as_str()).await?;
        let credentials = dir
            .write(CREDENTIALS_FILE, state.gcp.service_account_key.as_str())
            .await?;

        tracing::info!(deployment = target.label(), env_id = %state.env_id, "running bosh delete-env");
        let args = vec![
            "delete-env".to_string(),
            MANIFEST_FILE.to_string(),
            "--state".to_string(),
            STATE_FILE.to_string(),
            "--vars-store".to_string(),
            VARS_STORE_FILE.to_string(),
            "--var-file".to_string(),
            format!("gcp_credentials_json={}", credentials.display()),
        ];
        if let Err(err) = self.bosh(&dir, &args).await {
            return Err(StepFailure::with_partial(
                anyhow!("failed to delete {}: {err:#}", target.label()),
                BoshPartialState {
                    dir: dir.into_inner(),
                    target,
                    state: state.clone(),
                },
            ));
        }

        let mut next = state.clone();
        match target {
            Target::Jumpbox => next.jumpbox = Jumpbox::default(),
            Target::Director => next.bosh = BoshDirector::default(),
        }
        Ok(next)
    }
}

impl<R: CommandRunner> DirectorDeployer for BoshCliDeployer<'_, R> {
    async fn create_jumpbox(&self, state: &EnvironmentState, outputs: &Outputs) -> StepResult {
        self.create(Target::Jumpbox, state, outputs).await
    }

    async fn create_director(&self, state: &EnvironmentState, outputs: &Outputs) -> StepResult {
        self.create(Target::Director, state, outputs).await
    }

    async fn delete_jumpbox(&self, state: &EnvironmentState) -> StepResult {
        self.delete(Target::Jumpbox, state).await
    }

    async fn delete_director(&self, state: &EnvironmentState) -> StepResult {
        self.delete(Target::Director, state).await
    }
}

// ── State mapping ─────────────────────────────────────────────────────────────

fn section(target: Target, state: &EnvironmentState) -> (&Map<String, Value>, &str) {
    match target {
        Target::Jumpbox => (&state.jumpbox.state, &state.jumpbox.variables),
        Target::Director => (&state.bosh.state, &state.bosh.variables),
    }
}

fn set_manifest(target: Target, state: &mut EnvironmentState, manifest: String) {
    match target {
        Target::Jumpbox => state.jumpbox.manifest = manifest,
        Target::Director => state.bosh.manifest = manifest,
    }
}

/// Fold the `create-env` state file and vars store into the state.
fn apply_files(
    target: Target,
    state: &mut EnvironmentState,
    deployment_state: &str,
    variables: String,
) -> Result<()> {
    let parsed: Map<String, Value> = if deployment_state.trim().is_empty() {
        Map::new()
    } else {
        serde_json::from_str(deployment_state).context("parsing bosh state file")?
    };
    match target {
        Target::Jumpbox => {
            state.jumpbox.state = parsed;
            state.jumpbox.variables = variables;
        }
        Target::Director => {
            state.bosh.state = parsed;
            state.bosh.variables = variables;
        }
    }
    Ok(())
}

/// Read director credentials out of the vars store.
fn apply_director_credentials(state: &mut EnvironmentState, outputs: &Outputs) -> Result<()> {
    let vars: DirectorVars =
        serde_yaml::from_str(&state.bosh.variables).context("parsing director vars store")?;
    let external_ip = outputs
        .get_str("external_ip")
        .ok_or_else(|| anyhow!("missing infrastructure output 'external_ip'"))?;

    state.bosh.director_name = director_name(&state.env_id);
    state.bosh.director_username = DIRECTOR_USERNAME.to_string();
    state.bosh.director_password = vars.admin_password;
    state.bosh.director_address = external_director_address(external_ip);
    state.bosh.director_ssl_ca = vars.director_ssl.ca;
    state.bosh.director_ssl_certificate = vars.director_ssl.certificate;
    state.bosh.director_ssl_private_key = vars.director_ssl.private_key;
    Ok(())
}

fn director_name(env_id: &str) -> String {
    format!("bosh-{env_id}")
}

/// Variables handed to `bosh interpolate -l`.
fn deployment_vars(target: Target, state: &EnvironmentState, outputs: &Outputs) -> Result<Mapping> {
    let output = |key: &str| -> Result<String> {
        outputs
            .get_str(key)
            .map(String::from)
            .ok_or_else(|| anyhow!("missing infrastructure output '{key}'"))
    };

    let mut vars = Mapping::new();
    let mut put = |key: &str, value: serde_yaml::Value| {
        vars.insert(serde_yaml::Value::from(key), value);
    };

    put("internal_cidr", output("internal_cidr")?.into());
    put("internal_gw", output("internal_gw")?.into());
    put("zone", state.gcp.zone.clone().into());
    put("network", output("network_name")?.into());
    put("subnetwork", output("subnetwork_name")?.into());
    put("project_id", state.gcp.project_id.clone().into());
    put(
        "tags",
        serde_yaml::Value::Sequence(vec![
            output("bosh_open_tag_name")?.into(),
            output("internal_tag_name")?.into(),
        ]),
    );

    match target {
        Target::Jumpbox => {
            let url = output("jumpbox_url")?;
            let external_ip = url.split(':').next().unwrap_or_default().to_string();
            put("internal_ip", JUMPBOX_INTERNAL_IP.into());
            put("external_ip", external_ip.into());
        }
        Target::Director => {
            put("director_name", director_name(&state.env_id).into());
            put("internal_ip", DIRECTOR_INTERNAL_IP.into());
            put("external_ip", output("external_ip")?.into());
        }
    }
    Ok(vars)
}

// ── Partial state ─────────────────────────────────────────────────────────────

/// What `create-env` / `delete-env` left behind after failing.
struct BoshPartialState {
    dir: TempDir,
    target: Target,
    state: EnvironmentState,
}

impl PartialStateProvider for BoshPartialState {
    fn recover_state(&self) -> Result<EnvironmentState> {
        let deployment_state = read_optional_sync(&self.dir.path().join(STATE_FILE))?
            .ok_or_else(|| anyhow!("bosh left no {} state behind", self.target.label()))?;
        let variables = read_optional_sync(&self.dir.path().join(VARS_STORE_FILE))?
            .unwrap_or_else(|| section(self.target, &self.state).1.to_string());
        let mut state = self.state.clone();
        apply_files(self.target, &mut state, &deployment_state, variables)?;
        Ok(state)
    }
}
