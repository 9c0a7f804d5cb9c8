//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, filesystem
//! access, the `gcloud`/`terraform`/`bosh` CLIs and the director HTTP API.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod bosh;
pub mod command_runner;
pub mod director;
pub mod gcp;
pub mod names;
pub mod state;
pub mod terraform;
pub mod workdir;
