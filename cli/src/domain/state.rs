//! Environment state document and pure helpers over it.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! Persistence lives in `crate::infra::state`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current schema version stamped on every persisted document.
pub const STATE_VERSION: u32 = 10;

/// Oldest schema version this build can still read.
pub const MIN_STATE_VERSION: u32 = 3;

/// File name of the state document inside a state directory.
pub const STATE_FILE_NAME: &str = "bbl-state.json";

/// Supported IaaS identifiers.
pub const IAAS_GCP: &str = "gcp";
pub const IAAS_AWS: &str = "aws";

/// AWS credentials and topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AwsConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub access_key_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub secret_access_key: String,
    pub region: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<String>,
}

/// Azure credentials and topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AzureConfig {
    pub subscription_id: String,
    pub tenant_id: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
}

/// GCP credentials and topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GcpConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub service_account_key: String,
    #[serde(rename = "projectID", skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    pub zone: String,
    pub region: String,
    pub zones: Vec<String>,
}

/// SSH key material used to reach the jumpbox.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyPair {
    pub name: String,
    pub private_key: String,
    pub public_key: String,
}

impl KeyPair {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Jumpbox deployment state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Jumpbox {
    pub url: String,
    pub variables: String,
    pub manifest: String,
    pub state: Map<String, Value>,
}

impl Jumpbox {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// BOSH director deployment state and credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoshDirector {
    pub director_name: String,
    pub director_username: String,
    pub director_password: String,
    pub director_address: String,
    #[serde(rename = "directorSSLCA")]
    pub director_ssl_ca: String,
    #[serde(rename = "directorSSLCertificate")]
    pub director_ssl_certificate: String,
    #[serde(rename = "directorSSLPrivateKey")]
    pub director_ssl_private_key: String,
    pub state: Map<String, Value>,
    pub variables: String,
    pub manifest: String,
    pub user_ops_file: String,
}

impl BoshDirector {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Load balancer settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancer {
    #[serde(rename = "type")]
    pub lb_type: String,
    pub cert: String,
    pub key: String,
    pub chain: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub domain: String,
}

/// The single persisted document describing one environment.
///
/// Every group stays at its zero value until the step that owns it runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvironmentState {
    pub version: u32,
    pub iaas: String,
    pub id: String,
    pub no_director: bool,
    pub aws: AwsConfig,
    pub azure: AzureConfig,
    pub gcp: GcpConfig,
    pub key_pair: KeyPair,
    pub jumpbox: Jumpbox,
    pub bosh: BoshDirector,
    #[serde(rename = "envID")]
    pub env_id: String,
    pub tf_state: String,
    pub lb: LoadBalancer,
    #[serde(rename = "latestTFOutput")]
    pub latest_tf_output: String,
}

impl EnvironmentState {
    /// `true` when every field holds its zero value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `true` once a director has been deployed into the environment.
    #[must_use]
    pub fn has_director(&self) -> bool {
        !self.bosh.director_name.is_empty()
    }

    /// Region of the configured IaaS, or `""` when the IaaS has none.
    #[must_use]
    pub fn region(&self) -> &str {
        match self.iaas.as_str() {
            IAAS_AWS => &self.aws.region,
            IAAS_GCP => &self.gcp.region,
            _ => "",
        }
    }

    /// Availability zones recorded for the configured IaaS.
    #[must_use]
    pub fn zones(&self) -> &[String] {
        match self.iaas.as_str() {
            IAAS_AWS => &self.aws.zones,
            IAAS_GCP => &self.gcp.zones,
            _ => &[],
        }
    }

    /// Record availability zones for the configured IaaS.
    pub fn set_zones(&mut self, zones: Vec<String>) {
        match self.iaas.as_str() {
            IAAS_AWS => self.aws.zones = zones,
            IAAS_GCP => {
                if self.gcp.zone.is_empty() {
                    if let Some(first) = zones.first() {
                        self.gcp.zone.clone_from(first);
                    }
                }
                self.gcp.zones = zones;
            }
            _ => {}
        }
    }

    /// Copy of the state with every secret field blanked.
    ///
    /// Secrets exist only in the in-memory working copy; this is applied
    /// before every write.
    #[must_use]
    pub fn without_secrets(&self) -> Self {
        let mut state = self.clone();
        state.aws.access_key_id.clear();
        state.aws.secret_access_key.clear();
        state.azure.client_secret.clear();
        state.gcp.service_account_key.clear();
        state.gcp.project_id.clear();
        state
    }

    /// Copy the in-memory secrets of `other` onto `self`.
    ///
    /// Collaborators hand back states loaded from or derived from disk; this
    /// keeps credentials available for the following steps.
    pub fn inherit_secrets(&mut self, other: &Self) {
        if self.aws.access_key_id.is_empty() {
            self.aws.access_key_id.clone_from(&other.aws.access_key_id);
        }
        if self.aws.secret_access_key.is_empty() {
            self.aws
                .secret_access_key
                .clone_from(&other.aws.secret_access_key);
        }
        if self.azure.client_secret.is_empty() {
            self.azure.client_secret.clone_from(&other.azure.client_secret);
        }
        if self.gcp.service_account_key.is_empty() {
            self.gcp
                .service_account_key
                .clone_from(&other.gcp.service_account_key);
        }
        if self.gcp.project_id.is_empty() {
            self.gcp.project_id.clone_from(&other.gcp.project_id);
        }
    }
}
