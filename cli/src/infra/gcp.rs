//! GCP adapters on top of the `gcloud` and `ssh-keygen` CLIs.
//!
//! Implements `CloudProvider`, `ProjectMetadata` and `KeyGenerator`.

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

use crate::application::ports::{
    CloudProvider, CommandRunner, GeneratedKey, KeyGenerator, ProjectMetadata,
};
use crate::infra::command_runner::stdout_if_success;
use crate::infra::workdir::Workdir;

const SSH_KEYS_METADATA: &str = "sshKeys";

#[derive(Deserialize)]
struct ServiceAccountIdentity {
    #[serde(default)]
    client_email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectInfo {
    #[serde(default)]
    common_instance_metadata: InstanceMetadata,
}

#[derive(Default, Deserialize)]
struct InstanceMetadata {
    #[serde(default)]
    items: Vec<MetadataItem>,
}

#[derive(Deserialize)]
struct MetadataItem {
    key: String,
    #[serde(default)]
    value: String,
}

/// `gcloud` bound to one project and service account.
pub struct GcloudProvider<'a, R: CommandRunner> {
    runner: &'a R,
    project_id: String,
    account: String,
}

impl<'a, R: CommandRunner> GcloudProvider<'a, R> {
    /// Build a provider for the project, acting as the key's service account.
    ///
    /// # Errors
    ///
    /// Returns an error if the key has no `client_email`.
    pub fn new(runner: &'a R, project_id: &str, service_account_key: &str) -> Result<Self> {
        let identity: ServiceAccountIdentity = serde_json::from_str(service_account_key)
            .context("parsing service account key")?;
        if identity.client_email.is_empty() {
            bail!("service account key has no client_email");
        }
        Ok(Self {
            runner,
            project_id: project_id.to_string(),
            account: identity.client_email,
        })
    }

    /// Register the service account key with `gcloud`.
    ///
    /// # Errors
    ///
    /// Returns an error if `gcloud auth activate-service-account` fails.
    pub async fn activate(&self, service_account_key: &str) -> Result<()> {
        let dir = Workdir::create("bbl-gcloud").await?;
        let key_file = dir.write("key.json", service_account_key).await?;
        let key_arg = format!("--key-file={}", key_file.display());
        let output = self
            .runner
            .run(
                "gcloud",
                &["auth", "activate-service-account", &self.account, &key_arg, "--quiet"],
            )
            .await?;
        stdout_if_success("gcloud auth activate-service-account", &output)?;
        tracing::debug!(account = %self.account, "service account activated");
        Ok(())
    }

    async fn gcloud(&self, args: &[&str]) -> Result<String> {
        let project = format!("--project={}", self.project_id);
        let account = format!("--account={}", self.account);
        let mut full: Vec<&str> = args.to_vec();
        full.extend([project.as_str(), account.as_str(), "--quiet"]);
        let output = self.runner.run("gcloud", &full).await?;
        stdout_if_success(&format!("gcloud {}", args.join(" ")), &output)
    }
}

impl<R: CommandRunner> CloudProvider for GcloudProvider<'_, R> {
    async fn zones_for(&self, region: &str) -> Result<Vec<String>> {
        let filter = format!("--filter=region~/regions/{region}$");
        let stdout = self
            .gcloud(&["compute", "zones", "list", &filter, "--format=value(name)"])
            .await?;
        let mut zones = lines(&stdout);
        zones.sort();
        if zones.is_empty() {
            bail!("no availability zones found in region '{region}'");
        }
        Ok(zones)
    }

    async fn name_exists(&self, name: &str) -> Result<bool> {
        let filter = format!("--filter=name={name}-network");
        let stdout = self
            .gcloud(&["compute", "networks", "list", &filter, "--format=value(name)"])
            .await?;
        Ok(!lines(&stdout).is_empty())
    }
}

impl<R: CommandRunner> ProjectMetadata for GcloudProvider<'_, R> {
    async fn ssh_keys(&self) -> Result<Option<String>> {
        let stdout = self
            .gcloud(&["compute", "project-info", "describe", "--format=json"])
            .await?;
        let info: ProjectInfo =
            serde_json::from_str(&stdout).context("parsing project metadata")?;
        Ok(info
            .common_instance_metadata
            .items
            .into_iter()
            .find(|item| item.key == SSH_KEYS_METADATA)
            .map(|item| item.value))
    }

    async fn set_ssh_keys(&self, value: &str) -> Result<()> {
        let dir = Workdir::create("bbl-gcloud").await?;
        let file = dir.write("ssh-keys", value).await?;
        let arg = format!("--metadata-from-file={SSH_KEYS_METADATA}={}", file.display());
        self.gcloud(&["compute", "project-info", "add-metadata", &arg])
            .await?;
        Ok(())
    }
}

fn lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// RSA key generation through `ssh-keygen`.
pub struct SshKeygen<'a, R: CommandRunner> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> SshKeygen<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> KeyGenerator for SshKeygen<'_, R> {
    async fn generate(&self) -> Result<GeneratedKey> {
        let dir = Workdir::create("bbl-keygen").await?;
        let key_path = dir.join("vcap");
        let key_arg = key_path.display().to_string();
        let output = self
            .runner
            .run(
                "ssh-keygen",
                &["-t", "rsa", "-b", "2048", "-m", "PEM", "-N", "", "-C", "vcap", "-q", "-f", &key_arg],
            )
            .await?;
        stdout_if_success("ssh-keygen", &output)
            .map_err(|err| anyhow!("rsa key generator: {err:#}"))?;

        let private_key = dir
            .read_optional("vcap")
            .await?
            .context("ssh-keygen wrote no private key")?;
        let public_key = dir
            .read_optional("vcap.pub")
            .await?
            .context("ssh-keygen wrote no public key")?;
        Ok(GeneratedKey {
            private_key,
            public_key: public_key.trim_end().to_string(),
        })
    }
}
