//! Command implementations

pub mod destroy;
pub mod query;
pub mod up;
pub mod version;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::domain::config::{GcpCredentials, IaasCredentials};
use crate::infra::bosh::{BoshCliDeployer, DeploymentSources};
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, DEPLOY_TIMEOUT, TokioCommandRunner};
use crate::infra::terraform::{GcpTemplateGenerator, TerraformApplier};

/// IaaS credential flags shared by `up` and `destroy`.
#[derive(Args, Debug, Default)]
pub struct IaasArgs {
    /// IaaS to deploy to (only `gcp` is supported)
    #[arg(long, env = "BBL_IAAS")]
    pub iaas: Option<String>,

    /// GCP service account key, as a file path or inline JSON
    #[arg(long, env = "BBL_GCP_SERVICE_ACCOUNT_KEY", hide_env_values = true)]
    pub gcp_service_account_key: Option<String>,

    /// GCP region
    #[arg(long, env = "BBL_GCP_REGION")]
    pub gcp_region: Option<String>,
}

impl IaasArgs {
    /// Resolve the flags into credentials, reading the key file if one was
    /// named.
    ///
    /// # Errors
    ///
    /// Returns an error if the key names a file that cannot be read.
    pub async fn credentials(&self) -> Result<IaasCredentials> {
        let service_account_key = match self.gcp_service_account_key.as_deref() {
            None => String::new(),
            Some(key) if key.trim_start().starts_with('{') => key.to_string(),
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading service account key '{path}'"))?,
        };
        Ok(IaasCredentials {
            iaas: self.iaas.clone(),
            gcp: GcpCredentials {
                service_account_key,
                region: self.gcp_region.clone(),
            },
        })
    }
}

/// Locations of the external tools and deployment manifests.
#[derive(Args, Debug)]
pub struct ToolArgs {
    /// `jumpbox-deployment` checkout
    #[arg(long, env = "BBL_JUMPBOX_DEPLOYMENT_DIR", default_value = "jumpbox-deployment")]
    pub jumpbox_deployment_dir: PathBuf,

    /// `bosh-deployment` checkout
    #[arg(long, env = "BBL_BOSH_DEPLOYMENT_DIR", default_value = "bosh-deployment")]
    pub bosh_deployment_dir: PathBuf,

    /// Terraform executable
    #[arg(long, env = "BBL_TERRAFORM_BINARY", default_value = "terraform")]
    pub terraform_binary: String,
}

/// Process runners and generators the lifecycle adapters borrow.
pub struct Toolchain {
    /// Runner for short `gcloud`/`ssh-keygen` calls.
    pub runner: TokioCommandRunner,
    deploy_runner: TokioCommandRunner,
    templates: GcpTemplateGenerator,
    sources: DeploymentSources,
    terraform_binary: String,
}

impl Toolchain {
    #[must_use]
    pub fn new(args: &ToolArgs) -> Self {
        Self {
            runner: TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT),
            deploy_runner: TokioCommandRunner::new(DEPLOY_TIMEOUT),
            templates: GcpTemplateGenerator,
            sources: DeploymentSources {
                jumpbox_dir: args.jumpbox_deployment_dir.clone(),
                bosh_dir: args.bosh_deployment_dir.clone(),
            },
            terraform_binary: args.terraform_binary.clone(),
        }
    }

    #[must_use]
    pub fn applier(&self) -> TerraformApplier<'_, TokioCommandRunner, GcpTemplateGenerator> {
        TerraformApplier::new(&self.deploy_runner, &self.templates)
            .with_binary(self.terraform_binary.as_str())
    }

    #[must_use]
    pub fn deployer(&self) -> BoshCliDeployer<'_, TokioCommandRunner> {
        BoshCliDeployer::new(&self.deploy_runner, self.sources.clone())
    }
}
