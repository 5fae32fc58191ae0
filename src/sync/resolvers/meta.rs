use serde::Deserialize;

use crate::package::types::RepoMeta;
use crate::sync::error::SyncError;
use crate::sync::response::{ApiResponse, Resolved};
use crate::sync::validator::require_mapping;

/// Project descriptor as the hosts name its fields
#[derive(Debug, Deserialize)]
struct RepoDescriptor {
    #[serde(alias = "is_private")]
    private: bool,
    #[serde(alias = "updated_on", alias = "pushed_at")]
    last_updated: String,
    #[serde(default)]
    watchers: Option<u64>,
    #[serde(default)]
    watchers_count: Option<u64>,
    #[serde(default)]
    forks: Option<u64>,
    #[serde(default)]
    forks_count: Option<u64>,
    #[serde(default)]
    open_issues: Option<u64>,
    #[serde(default)]
    open_issues_count: Option<u64>,
}

/// Normalizes a project descriptor; counts a host does not report become 0
pub fn parse_meta_response(response: ApiResponse) -> Result<Resolved<RepoMeta>, SyncError> {
    let Some(payload) = response.into_payload()? else {
        return Err(SyncError::MalformedResponse(
            "repository metadata is empty".to_string(),
        ));
    };

    require_mapping(&payload)?;
    let descriptor: RepoDescriptor = serde_json::from_value(payload)
        .map_err(|e| SyncError::MalformedResponse(format!("repository metadata: {e}")))?;

    Ok(Resolved::found(RepoMeta {
        private: descriptor.private,
        last_updated: descriptor.last_updated,
        watchers: descriptor.watchers.or(descriptor.watchers_count).unwrap_or(0),
        forks: descriptor.forks.or(descriptor.forks_count).unwrap_or(0),
        open_issues: descriptor
            .open_issues
            .or(descriptor.open_issues_count)
            .unwrap_or(0),
    }))
}
