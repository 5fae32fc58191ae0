use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use repo_sync::config::{self, SyncConfig};
use repo_sync::logging;
use repo_sync::package::record::PackageRecord;
use repo_sync::package::types::{Field, PackageIdentity, PackageKind};
use repo_sync::sync::cache::SqliteCache;
use repo_sync::sync::download::{ReleaseIntent, RollbackRequest};
use repo_sync::sync::local::FsLocalFiles;
use repo_sync::sync::repository::RepositorySync;
use repo_sync::sync::transports::BitbucketTransport;

#[derive(Parser)]
#[command(name = "repo-sync")]
#[command(version, about = "Bitbucket repository metadata sync for plugins and themes")]
struct Cli {
    /// Config file, defaults to <data_dir>/config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write log lines as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synchronize package metadata and print the resulting record
    Sync {
        #[command(flatten)]
        package: PackageArgs,

        /// A newer version is known to exist; skip local fallbacks
        #[arg(long)]
        update_pending: bool,

        /// Only synchronize these fields
        #[arg(long, value_delimiter = ',')]
        field: Vec<Field>,
    },
    /// Resolve the download link for a package
    DownloadLink {
        #[command(flatten)]
        package: PackageArgs,

        /// Tag to roll back to
        #[arg(long, conflicts_with = "branch_switch")]
        rollback: Option<String>,

        /// Action of the rollback request, e.g. upgrade-plugin
        #[arg(long, requires = "rollback")]
        action: Option<String>,

        /// Package slug the rollback request targets
        #[arg(long, requires = "rollback")]
        slug: Option<String>,

        /// Branch to switch to
        #[arg(long)]
        branch_switch: Option<String>,
    },
    /// Drop every cached field of a package
    ClearCache {
        #[command(flatten)]
        package: PackageArgs,
    },
}

#[derive(Args)]
struct PackageArgs {
    owner: String,
    repo: String,

    #[arg(long, default_value = config::DEFAULT_BRANCH)]
    branch: String,

    #[arg(long, default_value = "plugin")]
    kind: PackageKind,

    /// Self-hosted Bitbucket Server base URL
    #[arg(long)]
    enterprise_host: Option<String>,

    /// Directory holding installed packages, one subdirectory per repo
    #[arg(long, default_value = ".")]
    local_root: PathBuf,

    /// Prefer a prebuilt release asset over source archives
    #[arg(long)]
    release_asset: bool,
}

impl PackageArgs {
    fn identity(&self) -> PackageIdentity {
        let identity = PackageIdentity::new(self.kind, &self.owner, &self.repo, &self.branch);
        match &self.enterprise_host {
            Some(host) => identity.with_enterprise_host(host),
            None => identity,
        }
    }

    fn repository_sync(&self, config: &SyncConfig) -> anyhow::Result<RepositorySync> {
        let identity = self.identity();

        let cache = SqliteCache::new(&config::db_path(), config.cache.ttl)
            .context("failed to open cache database")?;
        cache.purge_expired()?;

        let transport = BitbucketTransport::for_identity(&identity, config)?;

        Ok(RepositorySync::new(
            identity,
            config.clone(),
            Arc::new(transport),
            Arc::new(cache),
            Arc::new(FsLocalFiles::new(&self.local_root)),
        )
        .with_release_asset(self.release_asset))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = config::data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;

    let _guard = logging::init(&config::log_path(), cli.json)?;

    let config_path = cli.config.clone().unwrap_or_else(config::config_path);
    let config = SyncConfig::load(&config_path)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli.command, config))
}

async fn run(command: Command, config: SyncConfig) -> anyhow::Result<()> {
    match command {
        Command::Sync {
            package,
            update_pending,
            field,
        } => {
            let sync = package.repository_sync(&config)?;

            if field.is_empty() {
                let report = sync.sync_all(update_pending, &ReleaseIntent::Normal).await;
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            let mut record = PackageRecord::default();
            let mut fields = indexmap::IndexMap::new();
            for f in field {
                fields.insert(f, sync.sync(f, update_pending, &mut record).await);
            }
            record.download_link = Some(sync.download_link(&record, &ReleaseIntent::Normal));

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "record": record,
                    "fields": fields,
                }))?
            );
        }
        Command::DownloadLink {
            package,
            rollback,
            action,
            slug,
            branch_switch,
        } => {
            let sync = package.repository_sync(&config)?;

            let intent = match (rollback, branch_switch) {
                (Some(target), _) => ReleaseIntent::Rollback(RollbackRequest {
                    target,
                    action,
                    slug,
                }),
                (None, Some(branch)) => ReleaseIntent::BranchSwitch(branch),
                (None, None) => ReleaseIntent::Normal,
            };

            let mut record = PackageRecord::default();
            sync.sync(Field::Tags, false, &mut record).await;
            println!("{}", sync.download_link(&record, &intent));
        }
        Command::ClearCache { package } => {
            let sync = package.repository_sync(&config)?;
            let removed = sync.clear_cache()?;
            info!("Cleared {} cached fields for {}", removed, sync.identity().cache_key());
            println!("{removed}");
        }
    }

    Ok(())
}
