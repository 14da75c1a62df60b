//! Orchestrator API client utilities.
//!
//! This crate provides a lightweight client for the orchestrator and
//! permission backends. It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Validating the configured base URL for safety
//! - Typed helpers for the instance, abort, and authorize endpoints
//!
//! The primary entry point is [`OrchestratorClient`]. Create an instance via
//! [`OrchestratorClient::new`] or [`OrchestratorClient::from_config`], then
//! call the endpoint helpers in [`endpoints`].
//!
//! # Example
//!
//! ```ignore
//! use orca_api::OrchestratorClient;
//! use orca_util::OrcaConfig;
//!
//! async fn show() -> anyhow::Result<()> {
//!     let client = OrchestratorClient::from_config(&OrcaConfig::load()?)?;
//!     let assessed = client.get_instance("abc", true).await?;
//!     println!("state: {:?}", assessed.instance.state);
//!     Ok(())
//! }
//! ```

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use orca_util::OrcaConfig;
use reqwest::{Client, RequestBuilder, Url, header};
use tracing::debug;

pub mod endpoints;
pub mod error;

pub use error::ApiError;

/// Hostnames allowed to use plain HTTP.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client`.
///
/// The client pre-configures default headers and builds requests against a
/// validated base URL.
pub struct OrchestratorClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl OrchestratorClient {
    /// Construct a client for `base_url`, authenticating with `token` when given.
    ///
    /// Non-localhost hosts must use HTTPS.
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        validate_base_url(base_url)?;

        let mut default_headers = header::HeaderMap::new();
        if let Some(token) = token {
            let authorization_header_value = format!("Bearer {token}");
            let mut value = header::HeaderValue::from_str(&authorization_header_value).context("invalid API token")?;
            value.set_sensitive(true);
            default_headers.insert(header::AUTHORIZATION, value);
        }
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            user_agent: format!("orca/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    /// Construct a client from the loaded configuration.
    pub fn from_config(config: &OrcaConfig) -> Result<Self> {
        Self::new(&config.base_url, config.token.as_deref())
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "building request");

        self.http
            .request(method, url)
            .header(header::USER_AGENT, &self.user_agent)
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS
fn validate_base_url(base: &str) -> Result<()> {
    let parsed_base_url = Url::parse(base).map_err(|e| anyhow!("Invalid base URL '{}': {}", base, e))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| anyhow!("base URL '{}' must include a host", base))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(anyhow!(
            "base URL must use https for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        ));
    }

    Ok(())
}
