//! BOSH cloud config rendering for GCP environments.

use serde::Serialize;
use thiserror::Error;

use super::outputs::Outputs;
use super::state::EnvironmentState;

/// Outputs the cloud config is built from.
pub const REQUIRED_OUTPUTS: [&str; 5] = [
    "network_name",
    "subnetwork_name",
    "internal_cidr",
    "internal_gw",
    "internal_tag_name",
];

#[derive(Debug, Error)]
pub enum CloudConfigError {
    #[error("missing infrastructure output '{0}' required for the cloud config")]
    MissingOutput(&'static str),

    #[error("no availability zones recorded for this environment")]
    NoZones,

    #[error("failed to render cloud config: {0}")]
    Render(String),
}

// ── Document shape ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CloudConfig {
    azs: Vec<Az>,
    vm_types: Vec<VmType>,
    disk_types: Vec<DiskType>,
    compilation: Compilation,
    networks: Vec<Network>,
}

#[derive(Serialize)]
struct Az {
    name: String,
    cloud_properties: AzProperties,
}

#[derive(Serialize)]
struct AzProperties {
    zone: String,
}

#[derive(Serialize)]
struct VmType {
    name: &'static str,
    cloud_properties: VmProperties,
}

#[derive(Serialize)]
struct VmProperties {
    machine_type: &'static str,
    root_disk_size_gb: u32,
    root_disk_type: &'static str,
}

#[derive(Serialize)]
struct DiskType {
    name: &'static str,
    disk_size: u32,
    cloud_properties: DiskProperties,
}

#[derive(Serialize)]
struct DiskProperties {
    #[serde(rename = "type")]
    disk_type: &'static str,
}

#[derive(Serialize)]
struct Compilation {
    workers: u32,
    reuse_compilation_vms: bool,
    az: String,
    vm_type: &'static str,
    network: &'static str,
}

#[derive(Serialize)]
struct Network {
    name: &'static str,
    #[serde(rename = "type")]
    network_type: &'static str,
    subnets: Vec<Subnet>,
}

#[derive(Serialize)]
struct Subnet {
    range: String,
    gateway: String,
    azs: Vec<String>,
    cloud_properties: SubnetProperties,
}

#[derive(Serialize)]
struct SubnetProperties {
    ephemeral_external_ip: bool,
    network_name: String,
    subnetwork_name: String,
    tags: Vec<String>,
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn required<'a>(outputs: &'a Outputs, key: &'static str) -> Result<&'a str, CloudConfigError> {
    outputs
        .get_str(key)
        .filter(|v| !v.is_empty())
        .ok_or(CloudConfigError::MissingOutput(key))
}

fn vm_type(name: &'static str, machine_type: &'static str, root_disk_size_gb: u32) -> VmType {
    VmType {
        name,
        cloud_properties: VmProperties {
            machine_type,
            root_disk_size_gb,
            root_disk_type: "pd-ssd",
        },
    }
}

/// Render the cloud config YAML for the environment's zones and network.
///
/// Zones are exposed to BOSH as `z1..zN` in the order they were discovered.
///
/// # Errors
///
/// Returns [`CloudConfigError`] when no zones are recorded, a required output
/// is missing, or serialization fails.
pub fn render(state: &EnvironmentState, outputs: &Outputs) -> Result<String, CloudConfigError> {
    let zones = state.zones();
    if zones.is_empty() {
        return Err(CloudConfigError::NoZones);
    }

    let network_name = required(outputs, "network_name")?;
    let subnetwork_name = required(outputs, "subnetwork_name")?;
    let internal_cidr = required(outputs, "internal_cidr")?;
    let internal_gw = required(outputs, "internal_gw")?;
    let internal_tag_name = required(outputs, "internal_tag_name")?;

    let azs: Vec<Az> = zones
        .iter()
        .enumerate()
        .map(|(i, zone)| Az {
            name: format!("z{}", i + 1),
            cloud_properties: AzProperties { zone: zone.clone() },
        })
        .collect();
    let az_names: Vec<String> = azs.iter().map(|az| az.name.clone()).collect();

    let doc = CloudConfig {
        vm_types: vec![
            vm_type("default", "n1-standard-1", 10),
            vm_type("minimal", "g1-small", 10),
            vm_type("large", "n1-standard-4", 50),
        ],
        disk_types: vec![
            DiskType {
                name: "default",
                disk_size: 1024,
                cloud_properties: DiskProperties {
                    disk_type: "pd-standard",
                },
            },
            DiskType {
                name: "large",
                disk_size: 51_200,
                cloud_properties: DiskProperties {
                    disk_type: "pd-standard",
                },
            },
        ],
        compilation: Compilation {
            workers: 5,
            reuse_compilation_vms: true,
            az: az_names[0].clone(),
            vm_type: "default",
            network: "default",
        },
        networks: vec![Network {
            name: "default",
            network_type: "manual",
            subnets: vec![Subnet {
                range: internal_cidr.to_string(),
                gateway: internal_gw.to_string(),
                azs: az_names,
                cloud_properties: SubnetProperties {
                    ephemeral_external_ip: true,
                    network_name: network_name.to_string(),
                    subnetwork_name: subnetwork_name.to_string(),
                    tags: vec![internal_tag_name.to_string()],
                },
            }],
        }],
        azs,
    };

    serde_yaml::to_string(&doc).map_err(|e| CloudConfigError::Render(e.to_string()))
}
