//! bbl - stand up and tear down BOSH environments

use bbl_cli::cli::{Cli, init_tracing};
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    if let Err(e) = cli.run().await {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
