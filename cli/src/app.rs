//! Application context: unified state passed to every command handler.
//!
//! Built once in `Cli::run()` from the global flags.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::infra::state::FileStateStore;
use crate::output::OutputContext;

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Directory holding `bbl-state.json`.
    pub state_dir: PathBuf,
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    state_dir: PathBuf,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: AppFlags) -> Self {
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            state_dir: flags.state_dir,
        }
    }

    /// The state directory this invocation operates on.
    #[must_use]
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Store for the environment in the state directory.
    #[must_use]
    pub fn store(&self) -> FileStateStore {
        FileStateStore::new(&self.state_dir)
    }

    /// Ask the user for confirmation.
    ///
    /// `skip` answers yes without prompting (e.g. `--no-confirm`).
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, skip: bool) -> Result<bool> {
        if skip {
            return Ok(true);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}
