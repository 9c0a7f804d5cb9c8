//! Terraform template for GCP environments.

use crate::application::ports::TemplateGenerator;
use crate::domain::state::EnvironmentState;

const VARS_TEMPLATE: &str = r#"variable "project_id" {
  type = "string"
}

variable "region" {
  type = "string"
}

variable "zone" {
  type = "string"
}

variable "env_id" {
  type = "string"
}

variable "credentials" {
  type = "string"
}

provider "google" {
  credentials = "${file("${var.credentials}")}"
  project     = "${var.project_id}"
  region      = "${var.region}"
}
"#;

const NETWORK_TEMPLATE: &str = r#"resource "google_compute_network" "bbl-network" {
  name                    = "${var.env_id}-network"
  auto_create_subnetworks = false
}

resource "google_compute_subnetwork" "bbl-subnet" {
  name          = "${var.env_id}-subnet"
  ip_cidr_range = "10.0.0.0/16"
  network       = "${google_compute_network.bbl-network.self_link}"
}

resource "google_compute_address" "jumpbox-ip" {
  name = "${var.env_id}-jumpbox-ip"
}

resource "google_compute_address" "bosh-director-ip" {
  name = "${var.env_id}-bosh-director-ip"
}
"#;

const FIREWALL_TEMPLATE: &str = r#"resource "google_compute_firewall" "external" {
  name    = "${var.env_id}-external"
  network = "${google_compute_network.bbl-network.name}"

  source_ranges = ["0.0.0.0/0"]

  allow {
    protocol = "tcp"
    ports    = ["22", "6868", "8443", "25555"]
  }

  target_tags = ["${var.env_id}-bosh-open"]
}

resource "google_compute_firewall" "internal" {
  name    = "${var.env_id}-internal"
  network = "${google_compute_network.bbl-network.name}"

  allow {
    protocol = "icmp"
  }

  allow {
    protocol = "tcp"
  }

  allow {
    protocol = "udp"
  }

  source_tags = ["${var.env_id}-bosh-open", "${var.env_id}-internal"]
  target_tags = ["${var.env_id}-internal"]
}
"#;

const OUTPUT_TEMPLATE: &str = r#"output "network_name" {
  value = "${google_compute_network.bbl-network.name}"
}

output "subnetwork_name" {
  value = "${google_compute_subnetwork.bbl-subnet.name}"
}

output "internal_cidr" {
  value = "${google_compute_subnetwork.bbl-subnet.ip_cidr_range}"
}

output "internal_gw" {
  value = "${google_compute_subnetwork.bbl-subnet.gateway_address}"
}

output "internal_tag_name" {
  value = "${google_compute_firewall.internal.target_tags[0]}"
}

output "bosh_open_tag_name" {
  value = "${google_compute_firewall.external.target_tags[0]}"
}

output "external_ip" {
  value = "${google_compute_address.bosh-director-ip.address}"
}

output "jumpbox_url" {
  value = "${google_compute_address.jumpbox-ip.address}:22"
}

output "director_address" {
  value = "https://${google_compute_address.bosh-director-ip.address}:25555"
}
"#;

/// Builds the GCP network, firewall and address template.
#[derive(Debug, Clone, Copy, Default)]
pub struct GcpTemplateGenerator;

impl TemplateGenerator for GcpTemplateGenerator {
    fn generate(&self, _state: &EnvironmentState) -> String {
        [VARS_TEMPLATE, NETWORK_TEMPLATE, FIREWALL_TEMPLATE, OUTPUT_TEMPLATE].join("\n")
    }
}
