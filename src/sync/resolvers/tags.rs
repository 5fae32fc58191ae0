use crate::sync::error::SyncError;
use crate::sync::resolvers::listing_names;
use crate::sync::response::{ApiResponse, Resolved};

pub const NO_TAGS_FOUND: &str = "No tags found";

/// Tag names of a listing, in listing order; descriptors are discarded
pub fn parse_tag_response(response: ApiResponse) -> Result<Resolved<Vec<String>>, SyncError> {
    let Some(payload) = response.into_payload()? else {
        return Ok(Resolved::absent(NO_TAGS_FOUND));
    };

    let tags = listing_names(&payload)?;
    if tags.is_empty() {
        return Ok(Resolved::absent(NO_TAGS_FOUND));
    }
    Ok(Resolved::found(tags))
}
