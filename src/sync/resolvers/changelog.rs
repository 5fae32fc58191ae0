use crate::sync::error::SyncError;
use crate::sync::render::MarkdownRenderer;
use crate::sync::response::{ApiResponse, Resolved};
use crate::sync::validator::require_file_contents;

pub const NO_CHANGELOG_FOUND: &str = "No changelog found";

/// Rendered changelog from a remote file payload
///
/// A missing file and a failed fetch both resolve to the sentinel.
pub fn parse_changelog_response(
    response: ApiResponse,
    renderer: &dyn MarkdownRenderer,
) -> Result<Resolved<String>, SyncError> {
    let payload = match response {
        ApiResponse::Success(payload) => payload,
        ApiResponse::Empty | ApiResponse::Error(_) => {
            return Ok(Resolved::absent(NO_CHANGELOG_FOUND));
        }
    };

    let text = require_file_contents(&payload)?;
    Ok(render_changelog(text, renderer))
}

pub fn render_changelog(text: &str, renderer: &dyn MarkdownRenderer) -> Resolved<String> {
    if text.trim().is_empty() {
        return Resolved::absent(NO_CHANGELOG_FOUND);
    }
    Resolved::found(renderer.render(text))
}
