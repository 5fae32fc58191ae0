//! Bitbucket REST API transport implementation

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AuthConfig, SyncConfig};
use crate::package::types::PackageIdentity;
use crate::sync::error::TransportError;
use crate::sync::transport::Transport;

/// Default base URL for the bitbucket.org API
const DEFAULT_BASE_URL: &str = "https://api.bitbucket.org";

/// Transport implementation for Bitbucket Cloud and Bitbucket Server
pub struct BitbucketTransport {
    client: reqwest::Client,
    base_url: String,
    auth: AuthConfig,
}

impl BitbucketTransport {
    /// Creates a new BitbucketTransport with a custom base URL
    pub fn new(
        base_url: &str,
        auth: AuthConfig,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent("repo-sync")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Creates a transport pointed at the identity's host
    ///
    /// Self-hosted servers expose the API under `<host>/rest/api`.
    pub fn for_identity(
        identity: &PackageIdentity,
        config: &SyncConfig,
    ) -> Result<Self, TransportError> {
        let base_url = match &identity.enterprise_host {
            Some(host) => format!("{host}/rest/api"),
            None => DEFAULT_BASE_URL.to_string(),
        };

        Self::new(
            &base_url,
            config.auth.clone(),
            Duration::from_millis(config.http.timeout_ms),
        )
    }
}

#[async_trait::async_trait]
impl Transport for BitbucketTransport {
    async fn fetch(&self, endpoint: &str) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {}", url);

        let mut request = self.client.get(&url).header("Accept", "application/json");
        if let Some((username, password)) = self.auth.basic() {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound(endpoint.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(TransportError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            warn!("Bitbucket API rejected credentials with status {}: {}", status, url);
            return Err(TransportError::Unauthorized(format!(
                "{} returned {}",
                endpoint, status
            )));
        }

        if !status.is_success() {
            warn!("Bitbucket API returned status {}: {}", status, url);
            return Err(TransportError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse Bitbucket response from {}: {}", url, e);
            TransportError::InvalidResponse(e.to_string())
        })
    }
}
