//! Download link resolution
//!
//! Pure mapping from resolved version state and a release intent to the one
//! archive URL a caller should download. Precedence, first match wins:
//!
//! 1. Release asset, when configured and the package has tags
//! 2. Rollback to a requested version, when the request context names this package
//! 3. Tracked branch, when it is not the default branch or there are no tags
//! 4. Newest tag
//!
//! A branch-switch intent then replaces whatever endpoint 2-4 produced.

use serde::{Deserialize, Serialize};

use crate::package::types::PackageIdentity;
use crate::sync::version_state::{NO_TAGS, VersionState};

const HOSTED_WEB_URL: &str = "https://bitbucket.org";

/// What the caller wants to download
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseIntent {
    #[default]
    Normal,
    Rollback(RollbackRequest),
    BranchSwitch(String),
}

/// Rollback target plus the request that asked for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackRequest {
    pub target: String,
    /// Requested action, e.g. "upgrade-theme"
    pub action: Option<String>,
    /// Slug of the package the action targets
    pub slug: Option<String>,
}

impl RollbackRequest {
    fn applies_to(&self, identity: &PackageIdentity) -> bool {
        !self.target.is_empty()
            && self.action.as_deref() == Some(identity.kind.upgrade_action())
            && self.slug.as_deref() == Some(identity.repo.as_str())
    }
}

/// Resolved state a download link is computed from
#[derive(Debug, Clone, Copy)]
pub struct DownloadContext<'a> {
    pub identity: &'a PackageIdentity,
    pub versions: &'a VersionState,
    pub default_branch: &'a str,
    /// Whether the package publishes prebuilt release assets
    pub release_asset: bool,
}

pub fn construct_download_link(ctx: &DownloadContext<'_>, intent: &ReleaseIntent) -> String {
    let identity = ctx.identity;

    if ctx.release_asset && ctx.versions.newest_tag != NO_TAGS {
        return release_asset_link(identity, &ctx.versions.newest_tag);
    }

    let mut endpoint = match intent {
        ReleaseIntent::Rollback(rollback) if rollback.applies_to(identity) => {
            format!("{}.zip", rollback.target)
        }
        _ if identity.branch != ctx.default_branch || !ctx.versions.has_tags() => {
            reference_endpoint(identity, &identity.branch, "")
        }
        _ => reference_endpoint(identity, &ctx.versions.newest_tag, ""),
    };

    if let ReleaseIntent::BranchSwitch(branch) = intent {
        endpoint = reference_endpoint(identity, branch, &endpoint);
    }

    format!("{}{}", download_base(identity), endpoint)
}

/// Archive link for a tag or branch, ignoring intents and release assets
pub fn archive_link(identity: &PackageIdentity, reference: &str) -> String {
    format!(
        "{}{}",
        download_base(identity),
        reference_endpoint(identity, reference, "")
    )
}

pub fn download_base(identity: &PackageIdentity) -> String {
    match &identity.enterprise_host {
        Some(host) => format!(
            "{}/rest/api/1.0/projects/{}/repos/{}/archive",
            host, identity.owner, identity.repo
        ),
        None => format!("{}/{}/{}/get/", HOSTED_WEB_URL, identity.owner, identity.repo),
    }
}

/// Prebuilt asset uploaded to the repository's downloads for `tag`
pub fn release_asset_link(identity: &PackageIdentity, tag: &str) -> String {
    let host = identity.enterprise_host.as_deref().unwrap_or(HOSTED_WEB_URL);
    format!(
        "{}/{}/{}/downloads/{}-{}.zip",
        host, identity.owner, identity.repo, identity.repo, tag
    )
}

/// Self-hosted servers select the ref with `at=`, bitbucket.org with `<ref>.zip`
fn reference_endpoint(identity: &PackageIdentity, reference: &str, endpoint: &str) -> String {
    if identity.is_enterprise() {
        add_query_arg("at", reference, endpoint)
    } else {
        format!("{}.zip", reference)
    }
}

/// Sets `key=value` on the query string of `url`, replacing an existing `key`
fn add_query_arg(key: &str, value: &str, url: &str) -> String {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    let mut pairs: Vec<(String, String)> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k.to_string(), v.to_string())
        })
        .collect();

    match pairs.iter_mut().find(|(k, _)| k == key) {
        Some(pair) => pair.1 = value.to_string(),
        None => pairs.push((key.to_string(), value.to_string())),
    }

    let query = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!("{path}?{query}")
}
