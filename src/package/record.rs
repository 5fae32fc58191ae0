use indexmap::IndexMap;
use serde::Serialize;

use crate::package::types::{FileInfo, ReadmeInfo, RepoMeta};
use crate::sync::version_state::VersionState;

/// Section key the rendered changelog is attached under
pub const CHANGELOG_SECTION: &str = "changelog";

/// Metadata of one package as assembled by successful syncs
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackageRecord {
    pub file_info: Option<FileInfo>,
    pub versions: VersionState,
    pub repo_meta: Option<RepoMeta>,
    pub last_updated: Option<String>,
    /// Display sections such as the rendered changelog
    pub sections: IndexMap<String, String>,
    pub readme: Option<ReadmeInfo>,
    pub download_link: Option<String>,
}

impl PackageRecord {
    /// Replaces tag state wholesale, keeping the branch map
    pub fn set_tags(&mut self, tags: &VersionState) {
        self.versions = VersionState {
            branches: std::mem::take(&mut self.versions.branches),
            ..tags.clone()
        };
    }

    pub fn set_branches(&mut self, branches: IndexMap<String, String>) {
        self.versions.branches = branches;
    }

    pub fn set_repo_meta(&mut self, meta: RepoMeta) {
        self.last_updated = Some(meta.last_updated.clone());
        self.repo_meta = Some(meta);
    }

    pub fn set_changelog(&mut self, html: String) {
        self.sections.insert(CHANGELOG_SECTION.to_string(), html);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::types::{PackageIdentity, PackageKind};

    #[test]
    fn set_tags_replaces_tag_state_and_keeps_branches() {
        let identity = PackageIdentity::new(PackageKind::Plugin, "acme", "widget", "master");
        let mut record = PackageRecord::default();
        record.set_branches(IndexMap::from([(
            "develop".to_string(),
            "https://bitbucket.org/acme/widget/get/develop.zip".to_string(),
        )]));
        record.set_tags(&VersionState::from_tags(
            &["1.0.0".to_string(), "1.1.0".to_string()],
            &identity,
        ));

        record.set_tags(&VersionState::from_tags(&["2.0.0".to_string()], &identity));

        assert_eq!(record.versions.tags, vec!["2.0.0".to_string()]);
        assert_eq!(record.versions.newest_tag, "2.0.0");
        assert_eq!(record.versions.rollback.len(), 1);
        assert!(record.versions.branches.contains_key("develop"));
    }

    #[test]
    fn set_repo_meta_copies_last_updated() {
        let mut record = PackageRecord::default();
        record.set_repo_meta(RepoMeta {
            private: false,
            last_updated: "2024-03-01".to_string(),
            ..RepoMeta::default()
        });

        assert_eq!(record.last_updated.as_deref(), Some("2024-03-01"));
    }
}
