//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::app::{AppContext, AppFlags};
use crate::commands;
use crate::commands::query::QueryArgs;
use crate::domain::query::StateProperty;

/// Stand up and tear down BOSH environments
#[derive(Parser)]
#[command(
    name = "bbl",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Directory containing bbl-state.json
    #[arg(long, global = true, env = "BBL_STATE_DIRECTORY", default_value = ".")]
    pub state_dir: PathBuf,

    /// Print debug logs to stderr
    #[arg(long, global = true, env = "BBL_DEBUG")]
    pub debug: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create or update the environment
    Up(commands::up::UpArgs),

    /// Tear down the environment
    Destroy(commands::destroy::DestroyArgs),

    /// Print the environment id
    EnvId(QueryArgs),

    /// Print the jumpbox address
    JumpboxAddress(QueryArgs),

    /// Print the director username
    DirectorUsername(QueryArgs),

    /// Print the director password
    DirectorPassword(QueryArgs),

    /// Print the director address
    DirectorAddress(QueryArgs),

    /// Print the director CA certificate
    DirectorCaCert(QueryArgs),

    /// Show version
    Version,
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins; otherwise `debug` with `--debug` and `warn` without.
pub fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            state_dir,
            debug: _,
            quiet,
            no_color,
            command,
        } = self;
        let app = AppContext::new(AppFlags {
            state_dir,
            no_color,
            quiet,
        });

        let (property, args) = match command {
            Command::Up(args) => return commands::up::run(&args, &app).await,
            Command::Destroy(args) => return commands::destroy::run(&args, &app).await,
            Command::Version => {
                commands::version::run(&app.output);
                return Ok(());
            }
            Command::EnvId(args) => (StateProperty::EnvId, args),
            Command::JumpboxAddress(args) => (StateProperty::JumpboxAddress, args),
            Command::DirectorUsername(args) => (StateProperty::DirectorUsername, args),
            Command::DirectorPassword(args) => (StateProperty::DirectorPassword, args),
            Command::DirectorAddress(args) => (StateProperty::DirectorAddress, args),
            Command::DirectorCaCert(args) => (StateProperty::DirectorCaCert, args),
        };
        commands::query::run(property, &args, &app).await
    }
}
