//! Per-field synchronization of one package against its repository
//!
//! Every field follows the same path: cached value, local fallback where the
//! field has one, remote fetch. Fresh outcomes are validated before anything
//! is written to the cache.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::package::record::PackageRecord;
use crate::package::types::{Field, FileInfo, PackageIdentity, PackageKind, ReadmeInfo, RepoMeta};
use crate::sync::cache::CacheStore;
use crate::sync::download::{DownloadContext, ReleaseIntent, construct_download_link};
use crate::sync::error::SyncError;
use crate::sync::local::LocalFiles;
use crate::sync::render::{MarkdownHtmlRenderer, MarkdownRenderer, ReadmeParser, TxtReadmeParser};
use crate::sync::resolvers::{
    FileHeaderParser, parse_branch_response, parse_changelog_response, parse_meta_response,
    parse_readme_response, parse_tag_response, render_changelog,
};
use crate::sync::response::{ApiResponse, Resolved};
use crate::sync::transport::{
    BRANCHES_ENDPOINT, META_ENDPOINT, TAGS_ENDPOINT, Transport, expand_endpoint, src_endpoint,
};
use crate::sync::validator::{Verdict, validate};
use crate::sync::version_state::VersionState;

pub const README_FILE: &str = "readme.txt";
pub const DEFAULT_CHANGES_FILE: &str = "CHANGES.md";

/// Normalized value of one field, ready to attach to a [`PackageRecord`]
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Info(FileInfo),
    Tags(VersionState),
    /// Rendered changelog, `None` when the package has none
    Changes(Option<String>),
    /// Parsed readme, `None` when the repository has none
    Readme(Option<ReadmeInfo>),
    Meta(RepoMeta),
    Branches(IndexMap<String, String>),
}

impl FieldValue {
    pub fn apply_to(self, record: &mut PackageRecord) {
        match self {
            FieldValue::Info(info) => record.file_info = Some(info),
            FieldValue::Tags(tags) => record.set_tags(&tags),
            FieldValue::Changes(html) => record.set_changelog(html.unwrap_or_default()),
            FieldValue::Readme(readme) => {
                if readme.is_some() {
                    record.readme = readme;
                }
            }
            FieldValue::Meta(meta) => record.set_repo_meta(meta),
            FieldValue::Branches(branches) => record.set_branches(branches),
        }
    }
}

/// Outcome of [`RepositorySync::sync_all`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub record: PackageRecord,
    /// Whether each field synced successfully
    pub fields: IndexMap<Field, bool>,
}

/// A freshly resolved value and whether it may be cached
struct Fresh<T> {
    resolved: Resolved<T>,
    cacheable: bool,
}

impl<T> Fresh<T> {
    fn cacheable(resolved: Resolved<T>) -> Self {
        Self {
            resolved,
            cacheable: true,
        }
    }
}

pub struct RepositorySync {
    identity: PackageIdentity,
    config: SyncConfig,
    transport: Arc<dyn Transport>,
    cache: Arc<dyn CacheStore>,
    local: Arc<dyn LocalFiles>,
    renderer: Arc<dyn MarkdownRenderer>,
    readme_parser: Arc<dyn ReadmeParser>,
    header_parser: FileHeaderParser,
    main_file: String,
    changes_file: String,
    release_asset: bool,
}

impl RepositorySync {
    pub fn new(
        identity: PackageIdentity,
        config: SyncConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn CacheStore>,
        local: Arc<dyn LocalFiles>,
    ) -> Self {
        let main_file = match identity.kind {
            PackageKind::Plugin => format!("{}.php", identity.repo),
            PackageKind::Theme => "style.css".to_string(),
        };

        Self {
            identity,
            config,
            transport,
            cache,
            local,
            renderer: Arc::new(MarkdownHtmlRenderer),
            readme_parser: Arc::new(TxtReadmeParser::new()),
            header_parser: FileHeaderParser::new(),
            main_file,
            changes_file: DEFAULT_CHANGES_FILE.to_string(),
            release_asset: false,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn MarkdownRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_readme_parser(mut self, parser: Arc<dyn ReadmeParser>) -> Self {
        self.readme_parser = parser;
        self
    }

    /// File whose header block carries name and version
    pub fn with_main_file(mut self, file: &str) -> Self {
        self.main_file = file.to_string();
        self
    }

    pub fn with_changes_file(mut self, file: &str) -> Self {
        self.changes_file = file.to_string();
        self
    }

    pub fn with_release_asset(mut self, release_asset: bool) -> Self {
        self.release_asset = release_asset;
        self
    }

    pub fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    /// Synchronizes one field and attaches it to `record`
    ///
    /// Returns false when the field could not be synchronized; `record` is
    /// left untouched in that case.
    pub async fn sync(
        &self,
        field: Field,
        update_pending: bool,
        record: &mut PackageRecord,
    ) -> bool {
        match self.fetch(field, update_pending).await {
            Ok(value) => {
                value.apply_to(record);
                true
            }
            Err(e) => {
                debug!("Skipped {} for {}: {}", field, self.identity.cache_key(), e);
                false
            }
        }
    }

    /// Synchronizes every field concurrently, then resolves the download link
    ///
    /// A failing field never aborts the others.
    pub async fn sync_all(&self, update_pending: bool, intent: &ReleaseIntent) -> SyncReport {
        let outcomes = join_all(Field::ALL.map(|field| self.fetch(field, update_pending))).await;

        let mut record = PackageRecord::default();
        let mut fields = IndexMap::new();

        for (field, outcome) in Field::ALL.into_iter().zip(outcomes) {
            let synced = match outcome {
                Ok(value) => {
                    value.apply_to(&mut record);
                    true
                }
                Err(e) => {
                    debug!("Skipped {} for {}: {}", field, self.identity.cache_key(), e);
                    false
                }
            };
            fields.insert(field, synced);
        }

        record.download_link = Some(self.download_link(&record, intent));

        info!(
            "Synced {}/{} fields for {}",
            fields.values().filter(|synced| **synced).count(),
            fields.len(),
            self.identity.cache_key()
        );

        SyncReport { record, fields }
    }

    /// Download link for the record's current version state
    pub fn download_link(&self, record: &PackageRecord, intent: &ReleaseIntent) -> String {
        let ctx = DownloadContext {
            identity: &self.identity,
            versions: &record.versions,
            default_branch: &self.config.default_branch,
            release_asset: self.release_asset,
        };
        construct_download_link(&ctx, intent)
    }

    /// Drops every cached field of this package
    pub fn clear_cache(&self) -> Result<usize, SyncError> {
        Ok(self.cache.clear(&self.identity)?)
    }

    pub async fn fetch(&self, field: Field, update_pending: bool) -> Result<FieldValue, SyncError> {
        match field {
            Field::Info => self.fetch_info().await.map(FieldValue::Info),
            Field::Tags => self.fetch_tags().await.map(FieldValue::Tags),
            Field::Changes => self.fetch_changes(update_pending).await.map(FieldValue::Changes),
            Field::Readme => self.fetch_readme(update_pending).await.map(FieldValue::Readme),
            Field::Meta => self.fetch_meta().await.map(FieldValue::Meta),
            Field::Branches => self.fetch_branches().await.map(FieldValue::Branches),
        }
    }

    pub async fn fetch_info(&self) -> Result<FileInfo, SyncError> {
        let fresh = async {
            let response = self.request(src_endpoint(&self.identity, &self.main_file)).await;
            let resolved = self
                .header_parser
                .parse_info_response(response, self.identity.kind)?;
            Ok::<_, SyncError>(Fresh::cacheable(resolved))
        };

        self.resolve(Field::Info, fresh)
            .await?
            .into_value()
            .ok_or_else(|| SyncError::MalformedResponse("cached info is empty".to_string()))
    }

    pub async fn fetch_tags(&self) -> Result<VersionState, SyncError> {
        let fresh = async {
            let response = self.request(expand_endpoint(TAGS_ENDPOINT, &self.identity)).await;
            Ok::<_, SyncError>(Fresh::cacheable(parse_tag_response(response)?))
        };

        let listing = self
            .resolve(Field::Tags, fresh)
            .await?
            .into_value()
            .unwrap_or_default();

        Ok(VersionState::from_tags(&listing, &self.identity))
    }

    pub async fn fetch_changes(&self, update_pending: bool) -> Result<Option<String>, SyncError> {
        let fresh = async {
            if !update_pending
                && let Some(text) = self.local.get_local_file(&self.identity, &self.changes_file)
            {
                debug!("Using local {} for {}", self.changes_file, self.identity.repo);
                return Ok(Fresh::cacheable(render_changelog(&text, self.renderer.as_ref())));
            }

            let response = self
                .request(src_endpoint(&self.identity, &self.changes_file))
                .await;
            let cacheable = !matches!(response, ApiResponse::Error(_));
            Ok::<_, SyncError>(Fresh {
                resolved: parse_changelog_response(response, self.renderer.as_ref())?,
                cacheable,
            })
        };

        Ok(self.resolve(Field::Changes, fresh).await?.into_value())
    }

    pub async fn fetch_readme(
        &self,
        update_pending: bool,
    ) -> Result<Option<ReadmeInfo>, SyncError> {
        if !self.local.exists(&self.identity, README_FILE) {
            return Err(SyncError::FatalConfiguration(format!(
                "{} ships no {}",
                self.identity.repo, README_FILE
            )));
        }

        let fresh = async {
            if !update_pending
                && let Some(text) = self.local.get_local_file(&self.identity, README_FILE)
            {
                debug!("Using local {} for {}", README_FILE, self.identity.repo);
                let readme = self.readme_parser.parse(&text, &self.identity)?;
                return Ok(Fresh::cacheable(Resolved::found(readme)));
            }

            let response = self.request(src_endpoint(&self.identity, README_FILE)).await;
            let cacheable = !matches!(response, ApiResponse::Error(_));
            Ok::<_, SyncError>(Fresh {
                resolved: parse_readme_response(
                    response,
                    self.readme_parser.as_ref(),
                    &self.identity,
                )?,
                cacheable,
            })
        };

        Ok(self.resolve(Field::Readme, fresh).await?.into_value())
    }

    pub async fn fetch_meta(&self) -> Result<RepoMeta, SyncError> {
        let fresh = async {
            let response = self.request(expand_endpoint(META_ENDPOINT, &self.identity)).await;
            Ok::<_, SyncError>(Fresh::cacheable(parse_meta_response(response)?))
        };

        self.resolve(Field::Meta, fresh)
            .await?
            .into_value()
            .ok_or_else(|| SyncError::MalformedResponse("cached meta is empty".to_string()))
    }

    pub async fn fetch_branches(&self) -> Result<IndexMap<String, String>, SyncError> {
        if !self.config.branch_switch {
            return Err(SyncError::BranchSwitchDisabled);
        }

        // Branch links are pinned to the branch and never depend on tags
        let versions = VersionState::default();
        let ctx = DownloadContext {
            identity: &self.identity,
            versions: &versions,
            default_branch: &self.config.default_branch,
            release_asset: false,
        };

        let fresh = async {
            let response = self
                .request(expand_endpoint(BRANCHES_ENDPOINT, &self.identity))
                .await;
            Ok::<_, SyncError>(Fresh::cacheable(parse_branch_response(response, &ctx)?))
        };

        Ok(self
            .resolve(Field::Branches, fresh)
            .await?
            .into_value()
            .unwrap_or_default())
    }

    /// Cached value if present, otherwise the validated fresh value
    async fn resolve<T, Fut>(&self, field: Field, fresh: Fut) -> Result<Resolved<T>, SyncError>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = Result<Fresh<T>, SyncError>>,
    {
        if let Some(cached) = self.cached(field) {
            return Ok(cached);
        }

        let outcome = fresh.await;
        let verdict = validate(&outcome);
        if verdict.is_failure() {
            let key = self.identity.cache_key();
            match &verdict {
                Verdict::Recoverable(reason) => {
                    warn!("Failed to sync {} for {}: {}", field, key, reason)
                }
                Verdict::Fatal(reason) => error!("Rejected {} for {}: {}", field, key, reason),
                Verdict::Valid => {}
            }
            return Err(match outcome {
                Err(e) => e,
                Ok(_) => SyncError::MalformedResponse(format!("{field} failed validation")),
            });
        }

        let fresh = outcome?;

        if fresh.cacheable {
            self.store(field, &fresh.resolved);
        }
        Ok(fresh.resolved)
    }

    fn cached<T: DeserializeOwned>(&self, field: Field) -> Option<Resolved<T>> {
        let value = self
            .cache
            .get(&self.identity, field)
            .inspect_err(|e| warn!("Cache read failed for {}: {}", field, e))
            .ok()??;

        match serde_json::from_value(value) {
            Ok(resolved) => {
                debug!("Using cached {} for {}", field, self.identity.cache_key());
                Some(resolved)
            }
            Err(e) => {
                warn!("Ignoring unreadable cached {}: {}", field, e);
                None
            }
        }
    }

    fn store<T: Serialize>(&self, field: Field, resolved: &Resolved<T>) {
        let value = match serde_json::to_value(resolved) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to serialize {} for caching: {}", field, e);
                return;
            }
        };

        if let Err(e) = self.cache.set(&self.identity, field, &value) {
            error!(
                "Failed to cache {} for {}: {}",
                field,
                self.identity.cache_key(),
                e
            );
        }
    }

    async fn request(&self, endpoint: String) -> ApiResponse {
        info!("Fetching {} for {}", endpoint, self.identity.cache_key());
        ApiResponse::decode(self.transport.fetch(&endpoint).await)
    }
}
