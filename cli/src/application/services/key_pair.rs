//! Application service: SSH key pair provisioning.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::time::Duration;

use anyhow::{Result, anyhow};
use rand::Rng;

use crate::application::ports::{KeyGenerator, KeyPairUpdater, ProgressReporter, ProjectMetadata};
use crate::domain::state::KeyPair;

/// Retry policy for the project metadata write.
///
/// Concurrent writers race on the project fingerprint, so retries are spread
/// with a random delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataRetryPolicy {
    pub attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for MetadataRetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(2000),
        }
    }
}

impl MetadataRetryPolicy {
    fn jitter(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        rand::thread_rng().gen_range(self.min_delay..self.max_delay)
    }
}

/// Format of the project `sshKeys` entry for a public key.
#[must_use]
pub fn ssh_key_entry(public_key: &str) -> String {
    format!("vcap:{} vcap", public_key.trim())
}

/// Generate a key pair and register its public half on the project.
///
/// # Errors
///
/// Returns an error if key generation or metadata read fails, or
/// `set common instance metadata: {err}` when every write attempt failed.
pub async fn update_key_pair(
    generator: &impl KeyGenerator,
    metadata: &impl ProjectMetadata,
    reporter: &impl ProgressReporter,
    policy: MetadataRetryPolicy,
) -> Result<KeyPair> {
    let key = generator
        .generate()
        .await
        .map_err(|err| anyhow!("create key pair: {err:#}"))?;
    let entry = ssh_key_entry(&key.public_key);

    let mut attempt = 1;
    loop {
        let existing = metadata
            .ssh_keys()
            .await
            .map_err(|err| anyhow!("get project: {err:#}"))?;
        let value = match existing.as_deref() {
            Some(keys) if !keys.is_empty() => {
                reporter.step("appending new ssh-keys for the project");
                format!("{keys}\n{entry}")
            }
            _ => {
                reporter.step("creating new ssh-keys for the project");
                entry.clone()
            }
        };

        match metadata.set_ssh_keys(&value).await {
            Ok(()) => break,
            Err(err) if attempt < policy.attempts => {
                tracing::warn!(attempt, error = %err, "setting project ssh-keys failed, retrying");
                tokio::time::sleep(policy.jitter()).await;
                attempt += 1;
            }
            Err(err) => return Err(anyhow!("set common instance metadata: {err:#}")),
        }
    }

    Ok(KeyPair {
        name: String::new(),
        private_key: key.private_key,
        public_key: key.public_key,
    })
}

/// [`KeyPairUpdater`] registering keys in project-wide SSH metadata.
pub struct MetadataKeyPairUpdater<'a, K, M, R> {
    pub generator: &'a K,
    pub metadata: &'a M,
    pub reporter: &'a R,
    pub policy: MetadataRetryPolicy,
}

impl<K, M, R> KeyPairUpdater for MetadataKeyPairUpdater<'_, K, M, R>
where
    K: KeyGenerator,
    M: ProjectMetadata,
    R: ProgressReporter,
{
    async fn update(&self, env_id: &str) -> Result<KeyPair> {
        let mut key_pair =
            update_key_pair(self.generator, self.metadata, self.reporter, self.policy).await?;
        key_pair.name = format!("keypair-{env_id}");
        Ok(key_pair)
    }
}
