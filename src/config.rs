use serde::Deserialize;
use std::path::{Path, PathBuf};

use anyhow::Context;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default lifetime of a cached field in milliseconds (12 hours)
pub const DEFAULT_CACHE_TTL_MS: i64 = 12 * 60 * 60 * 1000;

/// Timeout for a single remote call in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Branch that tags are published from
pub const DEFAULT_BRANCH: &str = "master";

/// Sync configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub auth: AuthConfig,
    /// Allow switching the installed package to an arbitrary branch
    pub branch_switch: bool,
    pub default_branch: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            http: HttpConfig::default(),
            auth: AuthConfig::default(),
            branch_switch: false,
            default_branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

impl SyncConfig {
    /// Loads configuration from a JSON file, falling back to defaults when the file is missing.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Lifetime of a cached field in milliseconds
    pub ttl: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL_MS,
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpConfig {
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: FETCH_TIMEOUT_MS,
        }
    }
}

/// Credentials injected into the transport at construction
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AuthConfig {
    /// Returns the credential pair when both halves are set
    pub fn basic(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

/// Returns the path to the data directory for repo-sync.
/// Uses $XDG_DATA_HOME/repo-sync if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/repo-sync,
/// or ./repo-sync if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the cache database file.
pub fn db_path() -> PathBuf {
    data_dir().join("cache.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("repo-sync.log")
}

/// Returns the path to the default config file.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("repo-sync")
}
