//! `bbl up`: create or converge the environment in the state directory.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::StateStore;
use crate::application::services::env_id::EnvIdManager;
use crate::application::services::key_pair::{MetadataKeyPairUpdater, MetadataRetryPolicy};
use crate::application::services::retry::Retrier;
use crate::application::services::up::{Up, UpConfig};
use crate::commands::{IaasArgs, ToolArgs, Toolchain};
use crate::infra::director::HttpDirectorClientFactory;
use crate::infra::gcp::{GcloudProvider, SshKeygen};
use crate::infra::names::RandomNameGenerator;
use crate::output::TerminalReporter;

/// Arguments for the up command.
#[derive(Args, Debug)]
pub struct UpArgs {
    #[command(flatten)]
    pub iaas: IaasArgs,

    #[command(flatten)]
    pub tools: ToolArgs,

    /// Name to assign to the environment (generated when omitted)
    #[arg(long)]
    pub name: Option<String>,

    /// Create infrastructure only, without a jumpbox or director
    #[arg(long)]
    pub no_director: bool,

    /// Extra ops file applied to the director manifest
    #[arg(long)]
    pub ops_file: Option<PathBuf>,
}

/// Run `bbl up`.
///
/// # Errors
///
/// Returns an error if the credentials are invalid or any lifecycle step
/// fails. Completed steps stay recorded in the state file.
pub async fn run(args: &UpArgs, app: &AppContext) -> Result<()> {
    let store = app.store();
    let credentials = args.iaas.credentials().await?;
    let state = credentials.merge_into(store.load().await?)?;

    let tools = Toolchain::new(&args.tools);
    let gcloud = GcloudProvider::new(
        &tools.runner,
        &state.gcp.project_id,
        &state.gcp.service_account_key,
    )?;
    gcloud.activate(&state.gcp.service_account_key).await?;

    let reporter = TerminalReporter::new(&app.output);
    let names = RandomNameGenerator;
    let keygen = SshKeygen::new(&tools.runner);
    let key_pairs = MetadataKeyPairUpdater {
        generator: &keygen,
        metadata: &gcloud,
        reporter: &reporter,
        policy: MetadataRetryPolicy::default(),
    };
    let applier = tools.applier();
    let deployer = tools.deployer();

    let up = Up {
        store: &store,
        env_ids: EnvIdManager::new(&gcloud, &names),
        provider: &gcloud,
        key_pairs: &key_pairs,
        applier: &applier,
        deployer: &deployer,
        clients: &HttpDirectorClientFactory,
        reporter: &reporter,
        retrier: Retrier::default(),
    };
    let config = UpConfig {
        name: args.name.clone(),
        no_director: args.no_director,
        ops_file: args.ops_file.clone(),
    };
    let state = up.execute(&config, state).await?;
    tracing::info!(env_id = %state.env_id, "up complete");
    Ok(())
}
