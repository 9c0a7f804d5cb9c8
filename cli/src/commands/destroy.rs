//! `bbl destroy`: tear down everything `bbl up` created.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::StateStore;
use crate::application::services::destroy::{
    Destroy, DestroyConfig, DestroyOutcome, nothing_to_destroy,
};
use crate::commands::{IaasArgs, ToolArgs, Toolchain};
use crate::output::TerminalReporter;

/// Arguments for the destroy command.
#[derive(Args, Debug)]
pub struct DestroyArgs {
    #[command(flatten)]
    pub iaas: IaasArgs,

    #[command(flatten)]
    pub tools: ToolArgs,

    /// Do not ask for confirmation
    #[arg(long)]
    pub no_confirm: bool,

    /// Exit successfully when there is no environment to destroy
    #[arg(long)]
    pub skip_if_missing: bool,
}

/// Run `bbl destroy`.
///
/// # Errors
///
/// Returns an error if there is nothing to destroy (without
/// `--skip-if-missing`) or a teardown step fails.
pub async fn run(args: &DestroyArgs, app: &AppContext) -> Result<()> {
    let store = app.store();
    let mut state = store.load().await?;

    if !nothing_to_destroy(&state) {
        let prompt = format!(
            "Are you sure you want to delete infrastructure for {}? This operation cannot be undone!",
            state.env_id
        );
        if !app.confirm(&prompt, args.no_confirm)? {
            app.output.warn("Cancelled.");
            return Ok(());
        }
        state = args.iaas.credentials().await?.merge_into(state)?;
    }

    let tools = Toolchain::new(&args.tools);
    let reporter = TerminalReporter::new(&app.output);
    let applier = tools.applier();
    let deployer = tools.deployer();
    let destroy = Destroy {
        store: &store,
        applier: &applier,
        deployer: &deployer,
        reporter: &reporter,
    };
    let config = DestroyConfig {
        skip_if_missing: args.skip_if_missing,
    };

    if destroy.execute(config, state).await? == DestroyOutcome::NothingToDestroy {
        app.output.warn(
            "state file not found, and --skip-if-missing flag provided, exiting",
        );
    }
    Ok(())
}
