//! Field-specific normalization of remote responses
//!
//! Each resolver is a pure function from an [`ApiResponse`] (plus whatever
//! collaborator it needs) to a [`Resolved`] value or a [`SyncError`].
//!
//! [`ApiResponse`]: crate::sync::response::ApiResponse
//! [`Resolved`]: crate::sync::response::Resolved
//! [`SyncError`]: crate::sync::error::SyncError

mod branches;
mod changelog;
mod info;
mod meta;
mod readme;
mod tags;

pub use branches::{NO_BRANCHES_FOUND, parse_branch_response};
pub use changelog::{NO_CHANGELOG_FOUND, parse_changelog_response, render_changelog};
pub use info::FileHeaderParser;
pub use meta::parse_meta_response;
pub use readme::{NO_README_FOUND, parse_readme_response};
pub use tags::{NO_TAGS_FOUND, parse_tag_response};

use serde_json::Value;

use crate::sync::error::SyncError;
use crate::sync::validator::require_mapping;

/// Names from a tag or branch listing, in listing order
///
/// Accepts the 1.0 shape (`{"<name>": {...}, ...}`) and the paginated 2.0
/// shape (`{"values": [{"name": "<name>"}, ...]}`).
fn listing_names(payload: &Value) -> Result<Vec<String>, SyncError> {
    let listing = require_mapping(payload)?;

    if let Some(Value::Array(values)) = listing.get("values") {
        return values
            .iter()
            .map(|entry| {
                entry
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        SyncError::MalformedResponse("listing entry without name".to_string())
                    })
            })
            .collect();
    }

    Ok(listing.keys().cloned().collect())
}
