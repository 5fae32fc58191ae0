use std::collections::HashMap;

use regex::Regex;

use crate::package::types::{FileInfo, PackageKind};
use crate::sync::error::SyncError;
use crate::sync::response::{ApiResponse, Resolved};
use crate::sync::validator::require_file_contents;

/// Only the start of the main file carries headers
const HEADER_SCAN_BYTES: usize = 8 * 1024;

/// Parser for the header block of a plugin's main file or a theme's style.css
///
/// ```text
/// /*
///  * Plugin Name: Widget
///  * Version: 1.2.0
///  */
/// ```
pub struct FileHeaderParser {
    /// Regex for a header line: ` * Key: value`
    header_re: Regex,
}

impl FileHeaderParser {
    pub fn new() -> Self {
        Self {
            // Match: leading comment decoration, `Key:`, value, optional closing `*/`
            header_re: Regex::new(concat!(
                r"(?m)^[ \t/*#@]*([A-Za-z][A-Za-z ]*?)[ \t]*:",
                r"[ \t]*(.*?)[ \t]*(?:\*/)?[ \t]*\r?$",
            ))
            .unwrap(),
        }
    }

    /// Header info from a remote file payload; a missing file is a failure
    pub fn parse_info_response(
        &self,
        response: ApiResponse,
        kind: PackageKind,
    ) -> Result<Resolved<FileInfo>, SyncError> {
        let Some(payload) = response.into_payload()? else {
            return Err(SyncError::MalformedResponse(
                "main file has no contents".to_string(),
            ));
        };

        let text = require_file_contents(&payload)?;
        self.parse_headers(text, kind).map(Resolved::found)
    }

    pub fn parse_headers(&self, text: &str, kind: PackageKind) -> Result<FileInfo, SyncError> {
        let head = truncate_at_char_boundary(text, HEADER_SCAN_BYTES);

        // First occurrence of each header wins
        let mut headers: HashMap<String, String> = HashMap::new();
        for caps in self.header_re.captures_iter(head) {
            let value = caps[2].trim();
            if value.is_empty() {
                continue;
            }
            headers
                .entry(caps[1].trim().to_lowercase())
                .or_insert_with(|| value.to_string());
        }

        let mut take = |name: &str| headers.remove(&name.to_lowercase());

        let name = take(kind.name_header()).ok_or_else(|| {
            SyncError::MalformedResponse(format!("missing `{}` header", kind.name_header()))
        })?;
        let version = take("Version")
            .ok_or_else(|| SyncError::MalformedResponse("missing `Version` header".to_string()))?;

        Ok(FileInfo {
            name,
            version,
            author: take("Author"),
            description: take("Description"),
            requires: take("Requires at least"),
            requires_php: take("Requires PHP"),
            tested: take("Tested up to"),
        })
    }
}

impl Default for FileHeaderParser {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_at_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
