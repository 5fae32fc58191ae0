use crate::package::types::{PackageIdentity, ReadmeInfo};
use crate::sync::error::SyncError;
use crate::sync::render::ReadmeParser;
use crate::sync::response::{ApiResponse, Resolved};
use crate::sync::validator::require_file_contents;

pub const NO_README_FOUND: &str = "No readme found";

/// Parsed readme from a remote file payload
///
/// A missing file and a failed fetch both resolve to the sentinel.
pub fn parse_readme_response(
    response: ApiResponse,
    parser: &dyn ReadmeParser,
    identity: &PackageIdentity,
) -> Result<Resolved<ReadmeInfo>, SyncError> {
    let payload = match response {
        ApiResponse::Success(payload) => payload,
        ApiResponse::Empty | ApiResponse::Error(_) => {
            return Ok(Resolved::absent(NO_README_FOUND));
        }
    };

    let text = require_file_contents(&payload)?;
    parser.parse(text, identity).map(Resolved::found)
}
