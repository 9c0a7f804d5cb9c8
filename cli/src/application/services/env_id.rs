//! Application service: environment name resolution.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;

use crate::application::ports::{CloudProvider, NameGenerator};
use crate::domain::EnvIdError;
use crate::domain::env_id::{MAX_GENERATION_ATTEMPTS, validate_name};
use crate::domain::state::EnvironmentState;

/// Assigns a stable, unused name to an environment.
pub struct EnvIdManager<'a, P: CloudProvider, G: NameGenerator> {
    provider: &'a P,
    names: &'a G,
}

impl<'a, P: CloudProvider, G: NameGenerator> EnvIdManager<'a, P, G> {
    pub fn new(provider: &'a P, names: &'a G) -> Self {
        Self { provider, names }
    }

    /// Make sure `state` carries an environment name.
    ///
    /// A name already in the state is kept, whatever `requested` says: it may
    /// already be tagged on real resources.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvIdError`] when the requested name is invalid or taken,
    /// or when no free generated name was found.
    pub async fn sync(
        &self,
        mut state: EnvironmentState,
        requested: Option<&str>,
    ) -> Result<EnvironmentState> {
        if !state.env_id.is_empty() {
            tracing::debug!(env_id = %state.env_id, "reusing environment name");
            return Ok(state);
        }

        state.env_id = match requested {
            Some(name) => self.claim(name).await?,
            None => self.generate().await?,
        };
        tracing::info!(env_id = %state.env_id, "environment name assigned");
        Ok(state)
    }

    async fn claim(&self, name: &str) -> Result<String> {
        validate_name(name)?;
        if self.exists(name).await? {
            return Err(EnvIdError::NameAlreadyExists(name.to_string()).into());
        }
        Ok(name.to_string())
    }

    async fn generate(&self) -> Result<String> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let candidate = self.names.candidate();
            if !self.exists(&candidate).await? {
                return Ok(candidate);
            }
            tracing::debug!(%candidate, attempt, "generated name already in use");
        }
        Err(EnvIdError::GenerationExhausted(MAX_GENERATION_ATTEMPTS).into())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        self.provider.name_exists(name).await
    }
}
