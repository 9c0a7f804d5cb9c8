//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod cloud_config;
pub mod config;
pub mod env_id;
pub mod error;
pub mod outputs;
pub mod query;
pub mod state;

pub use error::{
    CompoundError, DestroyError, EnvIdError, QueryError, RetryError, StateError, UpError, combine,
};
pub use outputs::Outputs;
pub use query::StateProperty;
pub use state::EnvironmentState;
