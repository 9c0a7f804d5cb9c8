//! IaaS credentials supplied on the command line and their merge into state.
//!
//! Pure functions only: the service account key arrives as file contents.

use serde::Deserialize;

use crate::domain::error::UpError;
use crate::domain::state::{EnvironmentState, IAAS_GCP};

/// GCP credentials and placement for one `bbl up`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcpCredentials {
    /// Raw service account key JSON.
    pub service_account_key: String,
    pub region: Option<String>,
}

/// Everything the user passed about the target IaaS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IaasCredentials {
    pub iaas: Option<String>,
    pub gcp: GcpCredentials,
}

#[derive(Deserialize)]
struct ServiceAccountKey {
    #[serde(default)]
    project_id: String,
}

/// Extract the project id from a service account key document.
///
/// # Errors
///
/// Returns [`UpError::ServiceAccountKeyInvalid`] when the document is not
/// JSON or carries no `project_id`.
pub fn parse_project_id(service_account_key: &str) -> Result<String, UpError> {
    let key: ServiceAccountKey = serde_json::from_str(service_account_key)
        .map_err(|e| UpError::ServiceAccountKeyInvalid(e.to_string()))?;
    if key.project_id.is_empty() {
        return Err(UpError::ServiceAccountKeyInvalid(
            "project_id is missing".to_string(),
        ));
    }
    Ok(key.project_id)
}

impl IaasCredentials {
    /// Merge the credentials into the in-memory working copy of the state.
    ///
    /// The IaaS and region are fixed once recorded. Secrets are never
    /// persisted, so the service account key is required on every run.
    ///
    /// # Errors
    ///
    /// Returns an [`UpError`] when a required value is missing, the IaaS is
    /// not supported, or a fixed value would change.
    pub fn merge_into(&self, mut state: EnvironmentState) -> Result<EnvironmentState, UpError> {
        match (self.iaas.as_deref(), state.iaas.is_empty()) {
            (None, true) => return Err(UpError::IaasMissing),
            (Some(iaas), true) => state.iaas = iaas.to_string(),
            (Some(iaas), false) if iaas != state.iaas => {
                return Err(UpError::ImmutableField {
                    flag: "iaas",
                    current: state.iaas,
                });
            }
            _ => {}
        }
        if state.iaas != IAAS_GCP {
            return Err(UpError::UnsupportedIaas(state.iaas));
        }

        if self.gcp.service_account_key.is_empty() {
            return Err(UpError::ServiceAccountKeyMissing);
        }
        state.gcp.project_id = parse_project_id(&self.gcp.service_account_key)?;
        state
            .gcp
            .service_account_key
            .clone_from(&self.gcp.service_account_key);

        match (self.gcp.region.as_deref(), state.gcp.region.is_empty()) {
            (None, true) => return Err(UpError::RegionMissing),
            (Some(region), true) => state.gcp.region = region.to_string(),
            (Some(region), false) if region != state.gcp.region => {
                return Err(UpError::ImmutableField {
                    flag: "region",
                    current: state.gcp.region,
                });
            }
            _ => {}
        }

        Ok(state)
    }
}
