//! Common types for tracked packages

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Kind of installable artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageKind {
    Plugin,
    Theme,
}

impl PackageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageKind::Plugin => "plugin",
            PackageKind::Theme => "theme",
        }
    }

    /// Request action that triggers a rollback for this kind
    pub fn upgrade_action(&self) -> &'static str {
        match self {
            PackageKind::Plugin => "upgrade-plugin",
            PackageKind::Theme => "upgrade-theme",
        }
    }

    /// Header that carries the display name in the main file
    pub fn name_header(&self) -> &'static str {
        match self {
            PackageKind::Plugin => "Plugin Name",
            PackageKind::Theme => "Theme Name",
        }
    }
}

impl std::str::FromStr for PackageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plugin" => Ok(PackageKind::Plugin),
            "theme" => Ok(PackageKind::Theme),
            _ => Err(format!("unknown package kind: {s}")),
        }
    }
}

/// Host part of the cache key for packages on bitbucket.org
const HOSTED_HOST: &str = "bitbucket.org";

/// Identity of a tracked package, immutable for a sync session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity {
    pub kind: PackageKind,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Base URL of a self-hosted server, `None` for bitbucket.org
    pub enterprise_host: Option<String>,
}

impl PackageIdentity {
    pub fn new(kind: PackageKind, owner: &str, repo: &str, branch: &str) -> Self {
        Self {
            kind,
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
            enterprise_host: None,
        }
    }

    pub fn with_enterprise_host(mut self, host: &str) -> Self {
        self.enterprise_host = Some(host.trim_end_matches('/').to_string());
        self
    }

    pub fn is_enterprise(&self) -> bool {
        self.enterprise_host.is_some()
    }

    /// Key under which this package's fields are cached
    ///
    /// Every identity component is part of the key: `kind:host:owner/repo@branch`.
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}/{}@{}",
            self.kind.as_str(),
            self.enterprise_host.as_deref().unwrap_or(HOSTED_HOST),
            self.owner,
            self.repo,
            self.branch
        )
    }
}

/// Independently synchronized metadata category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Info,
    Tags,
    Changes,
    Readme,
    Meta,
    Branches,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Info,
        Field::Tags,
        Field::Changes,
        Field::Readme,
        Field::Meta,
        Field::Branches,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Info => "info",
            Field::Tags => "tags",
            Field::Changes => "changes",
            Field::Readme => "readme",
            Field::Meta => "meta",
            Field::Branches => "branches",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Field::Info),
            "tags" => Ok(Field::Tags),
            "changes" => Ok(Field::Changes),
            "readme" => Ok(Field::Readme),
            "meta" => Ok(Field::Meta),
            "branches" => Ok(Field::Branches),
            _ => Err(format!("unknown field: {s}")),
        }
    }
}

/// Header block read from the package's main file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub version: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub requires: Option<String>,
    pub requires_php: Option<String>,
    pub tested: Option<String>,
}

/// Host-independent project metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMeta {
    pub private: bool,
    pub last_updated: String,
    pub watchers: u64,
    pub forks: u64,
    pub open_issues: u64,
}

/// Structured readme produced by a [`crate::sync::render::ReadmeParser`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadmeInfo {
    pub name: Option<String>,
    pub requires: Option<String>,
    pub tested: Option<String>,
    pub requires_php: Option<String>,
    pub stable_tag: Option<String>,
    pub short_description: Option<String>,
    /// Section title (lowercased) to section body, in document order
    pub sections: IndexMap<String, String>,
}
