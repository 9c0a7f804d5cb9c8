//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::fmt;

use thiserror::Error;

// ── State errors ──────────────────────────────────────────────────────────────

/// Errors raised while loading or saving the state document.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state directory does not exist: {0}")]
    DirectoryMissing(String),

    #[error(
        "Existing bbl environment is incompatible with bbl v3. Create a new environment with v3 to continue."
    )]
    IncompatibleSchema,

    #[error(
        "Existing bbl environment was created with a newer version of bbl. Please upgrade to a version of bbl compatible with schema version {version}."
    )]
    NewerSchema { version: u32 },
}

// ── Up errors ─────────────────────────────────────────────────────────────────

/// Errors raised by the provisioning workflow itself.
#[derive(Debug, Error)]
pub enum UpError {
    #[error("Director already exists, you must re-create your environment to use \"--no-director\"")]
    DirectorAlreadyExists,

    #[error("error reading ops-file contents: {0}")]
    OpsFileRead(std::io::Error),

    #[error("IAAS '{0}' is not supported. Use --iaas gcp")]
    UnsupportedIaas(String),

    #[error("--iaas [gcp] must be provided")]
    IaasMissing,

    #[error("GCP service account key must be provided (--gcp-service-account-key)")]
    ServiceAccountKeyMissing,

    #[error("GCP region must be provided (--gcp-region)")]
    RegionMissing,

    #[error("error parsing service account key: {0}")]
    ServiceAccountKeyInvalid(String),

    #[error("The {flag} cannot be changed for existing environments. The current value is '{current}'.")]
    ImmutableField { flag: &'static str, current: String },
}

// ── Environment identity errors ───────────────────────────────────────────────

/// Errors raised while resolving the environment name.
#[derive(Debug, Error)]
pub enum EnvIdError {
    #[error(
        "Names must start with a lowercase letter, contain only lowercase letters, digits and hyphens, end with a letter or digit and be at most {max} characters: '{name}'"
    )]
    InvalidName { name: String, max: usize },

    #[error(
        "It looks like a bbl environment already exists with the name '{0}'. Please provide a different name."
    )]
    NameAlreadyExists(String),

    #[error("could not generate an unused environment name after {0} attempts")]
    GenerationExhausted(u32),
}

// ── Query errors ──────────────────────────────────────────────────────────────

/// Errors raised when reading a single property from the state.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Error BBL does not manage this director.")]
    DirectorNotManaged,

    #[error("Could not retrieve {0}, please make sure you are targeting the proper state dir.")]
    PropertyUnset(&'static str),
}

// ── Retry errors ──────────────────────────────────────────────────────────────

/// Raised when every attempt of a retried call failed transiently.
#[derive(Debug, Error)]
pub enum RetryError {
    #[error("made {attempts} attempts, last error: {last_error:#}")]
    Exhausted {
        attempts: u32,
        last_error: anyhow::Error,
    },
}

// ── Destroy errors ────────────────────────────────────────────────────────────

/// Errors raised by the teardown workflow.
#[derive(Debug, Error)]
pub enum DestroyError {
    #[error("bbl-state.json not found, ensure you're running this command in the proper state directory or create a new environment with bbl up")]
    NothingToDestroy,
}

// ── Compound errors ───────────────────────────────────────────────────────────

/// A step failure paired with the failure that happened while saving what
/// the step left behind.
///
/// The primary error always comes first in the rendered message. Both sides
/// render with their full context chain.
#[derive(Debug)]
pub struct CompoundError {
    primary: anyhow::Error,
    secondary: anyhow::Error,
}

impl CompoundError {
    /// The error of the step that failed.
    #[must_use]
    pub fn primary(&self) -> &anyhow::Error {
        &self.primary
    }

    /// The error raised while recovering or persisting partial state.
    #[must_use]
    pub fn secondary(&self) -> &anyhow::Error {
        &self.secondary
    }
}

impl fmt::Display for CompoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the following errors occurred:\n{:#},\n{:#}",
            self.primary, self.secondary
        )
    }
}

impl std::error::Error for CompoundError {}

/// Merge a step failure with an optional follow-up failure.
///
/// With no secondary error the primary is returned untouched, so callers can
/// still downcast it to its concrete type.
#[must_use]
pub fn combine(primary: anyhow::Error, secondary: Option<anyhow::Error>) -> anyhow::Error {
    match secondary {
        None => primary,
        Some(secondary) => anyhow::Error::new(CompoundError { primary, secondary }),
    }
}
