//! WaveSpeed API client utilities.
//!
//! This crate provides a lightweight client for the two WaveSpeed service
//! surfaces the node talks to:
//!
//! - the catalog (model categories, per-category listings, model detail)
//! - the platform API (media upload, generation submission)
//!
//! It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Injecting bearer credentials when the caller has resolved a key
//! - Validating base-URL overrides for safety
//! - Building requests with a consistent User-Agent and Accept headers
//!
//! The primary entry point is [`WaveSpeedClient`]. Create an instance via
//! [`WaveSpeedClient::new_for_service`], and then build requests with
//! [`WaveSpeedClient::request`].

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder, Url, header};
use tracing::debug;

/// Allowed base domains for non-local base-URL overrides. Subdomains of
/// these domains are also allowed.
const ALLOWED_WAVESPEED_DOMAINS: &[&str] = &["wavespeed.ai"];
/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The two WaveSpeed service surfaces, each with its own base URL and
/// override environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Read-only catalog endpoints (categories, models, model detail).
    Catalog,
    /// Authenticated platform API (media upload, generation).
    Platform,
}

impl Service {
    /// Environment variable that overrides this service's base URL.
    pub fn env_var(self) -> &'static str {
        match self {
            Service::Catalog => "WAVESPEED_CATALOG_BASE",
            Service::Platform => "WAVESPEED_API_BASE",
        }
    }

    /// Default public base URL for this service.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Service::Catalog => "https://wavespeed.ai/center/default/api/v1",
            Service::Platform => "https://api.wavespeed.ai",
        }
    }
}

/// Thin wrapper around a configured `reqwest::Client` for WaveSpeed access.
///
/// The client pre-configures default headers and builds requests against a
/// validated base URL. Credential resolution (runtime override, environment,
/// config file) is the caller's concern; pass the resolved key in, or `None`
/// for the unauthenticated catalog surface.
#[derive(Debug, Clone)]
pub struct WaveSpeedClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl WaveSpeedClient {
    /// Construct a client for `service`, authenticating with `api_key` when
    /// one is provided.
    ///
    /// The base URL is taken from the service's override variable (if set)
    /// or falls back to the public default. Non-localhost hosts must use
    /// HTTPS and be within an allowed WaveSpeed domain.
    pub fn new_for_service(service: Service, api_key: Option<&str>) -> Result<Self> {
        let mut default_headers = header::HeaderMap::new();
        if let Some(api_key) = api_key {
            let authorization_header_value = format!("Bearer {}", api_key);
            default_headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&authorization_header_value).context("api key contains invalid header bytes")?,
            );
        }
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build http client")?;

        let base_url = env::var(service.env_var()).unwrap_or_else(|_| service.default_base_url().into());
        validate_base_url(service, &base_url)?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("wavespeed-node/0.1; {}", env::consts::OS),
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    ///
    /// The resulting request includes the configured User-Agent and base
    /// headers, and is resolved relative to `self.base_url`.
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "building request");

        self.http.request(method, url).header(header::USER_AGENT, &self.user_agent)
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS, and host must be one of the allowed
///   WaveSpeed domains or a subdomain thereof
fn validate_base_url(service: Service, base: &str) -> Result<()> {
    let parsed_base_url = Url::parse(base).map_err(|e| anyhow!("Invalid {} URL '{}': {}", service.env_var(), base, e))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| anyhow!("{} must include a host", service.env_var()))?;

    // Local development allowances: localhost/127.0.0.1 with any scheme.
    if LOCALHOST_DOMAINS.iter().any(|&allowed| host_name.eq_ignore_ascii_case(allowed)) {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(anyhow!(
            "{} must use https for non-localhost hosts; got '{}://'",
            service.env_var(),
            parsed_base_url.scheme()
        ));
    }

    let is_allowed_domain = ALLOWED_WAVESPEED_DOMAINS.iter().any(|&allowed_domain| {
        host_name.eq_ignore_ascii_case(allowed_domain) || host_name.ends_with(&format!(".{}", allowed_domain))
    });
    if !is_allowed_domain {
        return Err(anyhow!(
            "{} host '{}' is not allowed; must be one of {:?} or a subdomain, or localhost",
            service.env_var(),
            host_name,
            ALLOWED_WAVESPEED_DOMAINS
        ));
    }

    Ok(())
}
