//! Resolved tag and branch state of a package

use std::cmp::Ordering;

use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::package::types::PackageIdentity;
use crate::sync::download::archive_link;

/// Newest tag of a package without tags
pub const NO_TAGS: &str = "0.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionState {
    /// Tags ordered from newest to oldest
    pub tags: Vec<String>,
    pub newest_tag: String,
    /// Branch name to archive link
    pub branches: IndexMap<String, String>,
    /// Tag to archive link, newest first
    pub rollback: IndexMap<String, String>,
}

impl Default for VersionState {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            newest_tag: NO_TAGS.to_string(),
            branches: IndexMap::new(),
            rollback: IndexMap::new(),
        }
    }
}

impl VersionState {
    /// Builds tag state from a tag listing; branches start empty
    pub fn from_tags(listing: &[String], identity: &PackageIdentity) -> Self {
        let mut ordered: Vec<(Option<Version>, &String)> = listing
            .iter()
            .map(|tag| (parse_tag(tag), tag))
            .collect();

        // Parseable tags newest first, the rest after them in listing order
        ordered.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => b.cmp(a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        let tags: Vec<String> = ordered.into_iter().map(|(_, tag)| tag.clone()).collect();
        let newest_tag = tags.first().cloned().unwrap_or_else(|| NO_TAGS.to_string());
        let rollback = tags
            .iter()
            .map(|tag| (tag.clone(), archive_link(identity, tag)))
            .collect();

        Self {
            tags,
            newest_tag,
            branches: IndexMap::new(),
            rollback,
        }
    }

    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// Parses a tag as a version, tolerating a `v` prefix and partial versions.
///
/// Examples:
/// - "v1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "1.2.3-beta.1" -> Version(1, 2, 3, pre: beta.1)
pub fn parse_tag(tag: &str) -> Option<Version> {
    let stripped = tag.strip_prefix('v').unwrap_or(tag);
    let parts: Vec<&str> = stripped.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => stripped.to_string(),
    };
    Version::parse(&normalized).ok()
}
