//! Transport trait for performing a single remote call

#[cfg(test)]
use mockall::automock;

use serde_json::Value;

use crate::package::types::PackageIdentity;
use crate::sync::error::TransportError;

pub const TAGS_ENDPOINT: &str = "/1.0/repositories/:owner/:repo/tags";
pub const BRANCHES_ENDPOINT: &str = "/1.0/repositories/:owner/:repo/branches";
pub const META_ENDPOINT: &str = "/2.0/repositories/:owner/:repo";
pub const SRC_ENDPOINT: &str = "/1.0/repositories/:owner/:repo/src/:branch/";

/// Trait for fetching raw payloads from the hosting service
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Performs one GET against a fully substituted endpoint path
    ///
    /// # Arguments
    /// * `endpoint` - Path relative to the API base, e.g. "/1.0/repositories/acme/widget/tags"
    ///
    /// # Returns
    /// * `Ok(Value)` - Decoded JSON body
    /// * `Err(TransportError)` - Not found, rate limited, unauthorized or network failure
    async fn fetch(&self, endpoint: &str) -> Result<Value, TransportError>;
}

/// Substitutes `:owner`, `:repo` and `:branch` in an endpoint template
pub fn expand_endpoint(template: &str, identity: &PackageIdentity) -> String {
    template
        .replace(":owner", &identity.owner)
        .replace(":repo", &identity.repo)
        .replace(":branch", &identity.branch)
}

/// Endpoint of a file on the tracked branch
pub fn src_endpoint(identity: &PackageIdentity, file: &str) -> String {
    format!("{}{}", expand_endpoint(SRC_ENDPOINT, identity), file)
}
