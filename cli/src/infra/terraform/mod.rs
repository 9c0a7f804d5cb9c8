//! Infrastructure implementation of the `InfrastructureApplier` port on top
//! of the `terraform` CLI.

mod template;

pub use template::GcpTemplateGenerator;

use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value};
use tempfile::TempDir;

use crate::application::ports::{
    CommandRunner, InfrastructureApplier, PartialStateProvider, StepFailure, StepResult,
    TemplateGenerator,
};
use crate::domain::Outputs;
use crate::domain::state::EnvironmentState;
use crate::infra::command_runner::{output_tail, stdout_if_success};
use crate::infra::workdir::{Workdir, read_optional_sync};

const TEMPLATE_FILE: &str = "template.tf";
const TFSTATE_FILE: &str = "terraform.tfstate";
const CREDENTIALS_FILE: &str = "credentials.json";
const OUTPUT_TAIL_LINES: usize = 40;

/// Runs terraform in a scratch directory seeded from the state snapshot.
pub struct TerraformApplier<'a, R: CommandRunner, T: TemplateGenerator> {
    runner: &'a R,
    templates: &'a T,
    binary: String,
}

impl<'a, R: CommandRunner, T: TemplateGenerator> TerraformApplier<'a, R, T> {
    pub fn new(runner: &'a R, templates: &'a T) -> Self {
        Self {
            runner,
            templates,
            binary: "terraform".to_string(),
        }
    }

    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Lay out template, credentials and prior snapshot, then `terraform init`.
    async fn prepare(&self, state: &EnvironmentState) -> Result<Workdir> {
        let dir = Workdir::create("bbl-terraform").await?;
        dir.write(TEMPLATE_FILE, self.templates.generate(state)).await?;
        dir.write(CREDENTIALS_FILE, state.gcp.service_account_key.as_str())
            .await?;
        if !state.tf_state.is_empty() {
            dir.write(TFSTATE_FILE, state.tf_state.as_str()).await?;
        }

        let output = self
            .runner
            .run_in(dir.path(), &self.binary, &["init", "-input=false", "-no-color"])
            .await?;
        stdout_if_success("terraform init", &output)?;
        Ok(dir)
    }

    fn var_args(state: &EnvironmentState) -> Vec<String> {
        [
            ("project_id", state.gcp.project_id.as_str()),
            ("region", state.gcp.region.as_str()),
            ("zone", state.gcp.zone.as_str()),
            ("env_id", state.env_id.as_str()),
            ("credentials", CREDENTIALS_FILE),
        ]
        .iter()
        .flat_map(|(k, v)| ["-var".to_string(), format!("{k}={v}")])
        .collect()
    }

    /// Run `terraform {verb}` and fold the resulting snapshot into the state.
    async fn converge(&self, verb: &str, state: &EnvironmentState) -> StepResult {
        let dir = self.prepare(state).await?;

        let mut args = vec![
            verb.to_string(),
            "-auto-approve".to_string(),
            "-input=false".to_string(),
            "-no-color".to_string(),
        ];
        args.extend(Self::var_args(state));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        tracing::info!(verb, env_id = %state.env_id, "running terraform");
        let output = self.runner.run_in(dir.path(), &self.binary, &args).await;

        let mut next = state.clone();
        let failure = match output {
            Ok(output) => {
                next.latest_tf_output = output_tail(&output, OUTPUT_TAIL_LINES);
                stdout_if_success(&format!("terraform {verb}"), &output).err()
            }
            Err(e) => Some(e),
        };

        if let Some(err) = failure {
            let partial = TerraformPartialState {
                dir: dir.into_inner(),
                state: next,
            };
            return Err(StepFailure::with_partial(
                anyhow!("terraform {verb} failed: {err:#}"),
                partial,
            ));
        }

        next.tf_state = dir.read_optional(TFSTATE_FILE).await?.unwrap_or_default();
        Ok(next)
    }
}

impl<R: CommandRunner, T: TemplateGenerator> InfrastructureApplier for TerraformApplier<'_, R, T> {
    async fn apply(&self, state: &EnvironmentState) -> StepResult {
        self.converge("apply", state).await
    }

    async fn destroy(&self, state: &EnvironmentState) -> StepResult {
        let mut next = self.converge("destroy", state).await?;
        next.tf_state.clear();
        Ok(next)
    }

    async fn outputs(&self, state: &EnvironmentState) -> Result<Outputs> {
        if state.tf_state.is_empty() {
            return Ok(Outputs::default());
        }
        // Reading outputs only needs the snapshot, not the providers.
        let dir = Workdir::create("bbl-terraform").await?;
        dir.write(TFSTATE_FILE, state.tf_state.as_str()).await?;
        let output = self
            .runner
            .run_in(dir.path(), &self.binary, &["output", "-json", "-no-color"])
            .await?;
        let stdout = stdout_if_success("terraform output", &output)?;
        parse_outputs(&stdout)
    }
}

/// Convert `terraform output -json` (`{name: {value, type, sensitive}}`)
/// into plain name/value pairs.
///
/// # Errors
///
/// Returns an error if the document is not a JSON object.
pub fn parse_outputs(json: &str) -> Result<Outputs> {
    let raw: Map<String, Value> =
        serde_json::from_str(json).context("parsing terraform outputs")?;
    Ok(raw
        .into_iter()
        .map(|(name, entry)| {
            let value = match entry {
                Value::Object(mut fields) => fields.remove("value").unwrap_or(Value::Null),
                other => other,
            };
            (name, value)
        })
        .collect())
}

/// Snapshot terraform left behind after a failed run.
struct TerraformPartialState {
    dir: TempDir,
    state: EnvironmentState,
}

impl PartialStateProvider for TerraformPartialState {
    fn recover_state(&self) -> Result<EnvironmentState> {
        let path = self.dir.path().join(TFSTATE_FILE);
        let tf_state = read_optional_sync(&path)?
            .ok_or_else(|| anyhow!("terraform left no state behind at {}", path.display()))?;
        let mut state = self.state.clone();
        state.tf_state = tf_state;
        Ok(state)
    }
}
