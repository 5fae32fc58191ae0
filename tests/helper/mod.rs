//! Sync test utilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;

use repo_sync::config::SyncConfig;
use repo_sync::package::types::{PackageIdentity, PackageKind};
use repo_sync::sync::cache::SqliteCache;
use repo_sync::sync::error::TransportError;
use repo_sync::sync::local::LocalFiles;
use repo_sync::sync::repository::RepositorySync;
use repo_sync::sync::transport::Transport;

/// Canned reply of the fake transport
#[derive(Clone)]
pub enum Reply {
    Json(Value),
    NotFound,
    Fail(String),
}

/// Transport serving canned replies and counting calls per endpoint
///
/// Endpoints without a reply answer with not found.
#[derive(Default)]
pub struct CountingTransport {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl CountingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, endpoint: &str, reply: Reply) -> Self {
        self.set_reply(endpoint, reply);
        self
    }

    pub fn set_reply(&self, endpoint: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), reply);
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls.lock().unwrap().get(endpoint).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn fetch(&self, endpoint: &str) -> Result<Value, TransportError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default() += 1;

        let reply = self.replies.lock().unwrap().get(endpoint).cloned();
        match reply {
            Some(Reply::Json(value)) => Ok(value),
            Some(Reply::Fail(message)) => Err(TransportError::InvalidResponse(message)),
            Some(Reply::NotFound) | None => Err(TransportError::NotFound(endpoint.to_string())),
        }
    }
}

/// Local files held in memory, keyed by file name
#[derive(Default)]
pub struct MemoryLocalFiles {
    files: HashMap<String, String>,
}

impl MemoryLocalFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: &str, contents: &str) -> Self {
        self.files.insert(name.to_string(), contents.to_string());
        self
    }
}

impl LocalFiles for MemoryLocalFiles {
    fn get_local_file(&self, _identity: &PackageIdentity, filename: &str) -> Option<String> {
        self.files
            .get(filename)
            .filter(|contents| !contents.trim().is_empty())
            .cloned()
    }

    fn exists(&self, _identity: &PackageIdentity, filename: &str) -> bool {
        self.files.contains_key(filename)
    }
}

pub const README_TEXT: &str = "=== Widget ===
Requires at least: 6.0
Tested up to: 6.5
Stable tag: 1.2.0

Adds widgets to the sidebar.

== Description ==
Widgets everywhere.

== Changelog ==
= 1.2.0 =
* Fixes
";

pub fn identity() -> PackageIdentity {
    PackageIdentity::new(PackageKind::Plugin, "acme", "widget", "master")
}

pub fn create_test_cache() -> (TempDir, Arc<SqliteCache>) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let cache = SqliteCache::new(&db_path, 86_400_000).unwrap();
    (temp_dir, Arc::new(cache))
}

pub fn create_sync(
    config: SyncConfig,
    transport: Arc<CountingTransport>,
    cache: Arc<SqliteCache>,
    local: MemoryLocalFiles,
) -> RepositorySync {
    RepositorySync::new(identity(), config, transport, cache, Arc::new(local))
}
