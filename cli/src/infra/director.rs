//! Infrastructure implementation of the `DirectorClient` port over the
//! director REST API, authenticated against the director's UAA.

use anyhow::{Context, Result, anyhow};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::application::ports::{Attempt, DirectorClient, DirectorClientFactory, DirectorInfo};
use crate::domain::state::EnvironmentState;

const UAA_PORT: u16 = 8443;

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    uuid: String,
    #[serde(default)]
    version: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Token endpoint of the UAA co-located with the director.
///
/// # Errors
///
/// Returns an error if the director address is not a URL with a host.
pub fn uaa_token_url(director_address: &str) -> Result<String> {
    let url = Url::parse(director_address)
        .with_context(|| format!("parsing director address '{director_address}'"))?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("director address '{director_address}' has no host"))?;
    Ok(format!("https://{host}:{UAA_PORT}/oauth/token"))
}

fn unexpected_status(status: StatusCode) -> Attempt {
    Attempt::Terminal(anyhow!(
        "unexpected http response {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    ))
}

/// A request failure with every cause in its source chain in the message.
fn transport_error(action: &str, err: &reqwest::Error) -> anyhow::Error {
    let mut message = format!("{action}: {err}");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    anyhow!(message)
}

/// Client for one director, trusting its CA certificate.
pub struct HttpDirectorClient {
    http: reqwest::Client,
    address: String,
    token_url: String,
    username: String,
    password: String,
}

impl HttpDirectorClient {
    /// # Errors
    ///
    /// Returns an error if the CA certificate or address is invalid.
    pub fn new(address: &str, username: &str, password: &str, ca_cert: &str) -> Result<Self> {
        let mut builder = reqwest::Client::builder().use_rustls_tls();
        if !ca_cert.is_empty() {
            let cert = reqwest::Certificate::from_pem(ca_cert.as_bytes())
                .context("parsing director CA certificate")?;
            builder = builder.add_root_certificate(cert);
        }
        let http = builder.build().context("building http client")?;
        Ok(Self {
            http,
            address: address.trim_end_matches('/').to_string(),
            token_url: uaa_token_url(address)?,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    async fn token(&self) -> Result<String, Attempt> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.username, Some(&self.password))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Attempt::Transient(transport_error("requesting uaa token", &e)))?;
        if response.status() != StatusCode::OK {
            return Err(unexpected_status(response.status()));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Attempt::Terminal(transport_error("decoding uaa token", &e)))?;
        Ok(token.access_token)
    }
}

impl DirectorClient for HttpDirectorClient {
    async fn update_cloud_config(&self, yaml: &str) -> Result<(), Attempt> {
        let token = self.token().await?;
        let response = self
            .http
            .post(format!("{}/cloud_configs", self.address))
            .header(reqwest::header::CONTENT_TYPE, "text/yaml")
            .bearer_auth(token)
            .body(yaml.to_string())
            .send()
            .await
            .map_err(|e| Attempt::Transient(transport_error("updating cloud config", &e)))?;
        if response.status() != StatusCode::CREATED {
            return Err(unexpected_status(response.status()));
        }
        tracing::debug!(address = %self.address, "cloud config updated");
        Ok(())
    }

    async fn info(&self) -> Result<DirectorInfo, Attempt> {
        let response = self
            .http
            .get(format!("{}/info", self.address))
            .send()
            .await
            .map_err(|e| Attempt::Transient(transport_error("reading director info", &e)))?;
        if response.status() != StatusCode::OK {
            return Err(unexpected_status(response.status()));
        }
        let info: InfoResponse = response
            .json()
            .await
            .map_err(|e| Attempt::Terminal(transport_error("decoding director info", &e)))?;
        Ok(DirectorInfo {
            name: info.name,
            uuid: info.uuid,
            version: info.version,
        })
    }
}

/// Builds [`HttpDirectorClient`]s from the director section of the state.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDirectorClientFactory;

impl DirectorClientFactory for HttpDirectorClientFactory {
    type Client = HttpDirectorClient;

    fn client_for(&self, state: &EnvironmentState) -> Result<Self::Client> {
        let bosh = &state.bosh;
        if bosh.director_address.is_empty() {
            anyhow::bail!("no director address recorded for this environment");
        }
        HttpDirectorClient::new(
            &bosh.director_address,
            &bosh.director_username,
            &bosh.director_password,
            &bosh.director_ssl_ca,
        )
    }
}
