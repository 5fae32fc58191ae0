use indexmap::IndexMap;

use crate::sync::download::{DownloadContext, ReleaseIntent, construct_download_link};
use crate::sync::error::SyncError;
use crate::sync::resolvers::listing_names;
use crate::sync::response::{ApiResponse, Resolved};

pub const NO_BRANCHES_FOUND: &str = "No branches found";

/// Branch name to the archive link pinned to that branch, computed in one pass
pub fn parse_branch_response(
    response: ApiResponse,
    ctx: &DownloadContext<'_>,
) -> Result<Resolved<IndexMap<String, String>>, SyncError> {
    let Some(payload) = response.into_payload()? else {
        return Ok(Resolved::absent(NO_BRANCHES_FOUND));
    };

    let names = listing_names(&payload)?;
    if names.is_empty() {
        return Ok(Resolved::absent(NO_BRANCHES_FOUND));
    }

    let branches = names
        .into_iter()
        .map(|branch| {
            let link = construct_download_link(ctx, &ReleaseIntent::BranchSwitch(branch.clone()));
            (branch, link)
        })
        .collect();

    Ok(Resolved::found(branches))
}
