//! `bbl env-id`, `bbl director-address` and the other single-value queries.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::StateStore;
use crate::application::services::state_query;
use crate::domain::query::StateProperty;
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, TokioCommandRunner};
use crate::infra::terraform::{GcpTemplateGenerator, TerraformApplier};

/// Arguments shared by the query commands.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Terraform executable, used to read outputs of director-less environments
    #[arg(long, env = "BBL_TERRAFORM_BINARY", default_value = "terraform")]
    pub terraform_binary: String,
}

/// Print one property of the environment in the state directory.
///
/// # Errors
///
/// Returns an error if the state cannot be loaded or the property is not
/// available for this environment.
pub async fn run(property: StateProperty, args: &QueryArgs, app: &AppContext) -> Result<()> {
    let state = app.store().load().await?;
    let runner = TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT);
    let applier = TerraformApplier::new(&runner, &GcpTemplateGenerator)
        .with_binary(args.terraform_binary.as_str());

    let value = state_query::query(property, &state, &applier).await?;
    tracing::debug!(property = property.command(), "query");
    app.output.value(&value);
    Ok(())
}
