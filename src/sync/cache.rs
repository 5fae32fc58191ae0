use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[cfg(test)]
use mockall::automock;

use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info};

use crate::package::types::{Field, PackageIdentity};
use crate::sync::error::CacheError;

/// Trait for storing normalized field values per package
///
/// Expiry is the store's own policy; callers only see present or absent.
#[cfg_attr(test, automock)]
pub trait CacheStore: Send + Sync {
    /// Get the cached value of a field, `None` when missing or expired
    fn get(&self, identity: &PackageIdentity, field: Field) -> Result<Option<Value>, CacheError>;

    /// Replace the cached value of a field
    fn set(&self, identity: &PackageIdentity, field: Field, value: &Value)
    -> Result<(), CacheError>;

    /// Remove every cached field of a package, returning how many were removed
    fn clear(&self, identity: &PackageIdentity) -> Result<usize, CacheError>;
}

/// Schema migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[
    // v1: index for expiry sweeps
    &["CREATE INDEX IF NOT EXISTS idx_repo_cache_inserted_at ON repo_cache(inserted_at)"],
];

pub struct SqliteCache {
    conn: Mutex<Connection>,
    ttl: i64,
}

impl SqliteCache {
    pub fn new(db_path: &Path, ttl: i64) -> Result<Self, CacheError> {
        info!("Initializing cache database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        debug!("Database connection established");

        let cache = Self {
            conn: Mutex::new(conn),
            ttl,
        };

        cache.create_schema()?;
        info!("Cache initialized successfully");

        Ok(cache)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn current_timestamp_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS repo_cache (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                package_key TEXT NOT NULL,
                field TEXT NOT NULL,
                value TEXT NOT NULL,
                inserted_at INTEGER NOT NULL,
                UNIQUE(package_key, field)
            )
            "#,
            [],
        )?;

        Self::apply_migrations(&conn)?;

        debug!("Database schema created successfully");
        Ok(())
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), CacheError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    conn.execute(sql, [])?;
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
            debug!("Updated schema version to v{}", target_version);
        }

        Ok(())
    }

    /// Delete entries older than the TTL
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let threshold = Self::current_timestamp_ms() - self.ttl;
        let conn = self.lock_conn()?;
        let removed = conn.execute("DELETE FROM repo_cache WHERE inserted_at <= ?1", [threshold])?;

        if removed > 0 {
            info!("Purged {} expired cache entries", removed);
        }
        Ok(removed)
    }
}

impl CacheStore for SqliteCache {
    fn get(&self, identity: &PackageIdentity, field: Field) -> Result<Option<Value>, CacheError> {
        let package_key = identity.cache_key();
        let conn = self.lock_conn()?;

        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT value, inserted_at FROM repo_cache WHERE package_key = ?1 AND field = ?2",
                (&package_key, field.as_str()),
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((raw, inserted_at)) = row else {
            return Ok(None);
        };

        if Self::current_timestamp_ms() - inserted_at >= self.ttl {
            debug!("Cache entry {}/{} expired", package_key, field);
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&raw)?;
        if value.is_null() {
            return Ok(None);
        }

        debug!("Cache hit for {}/{}", package_key, field);
        Ok(Some(value))
    }

    fn set(
        &self,
        identity: &PackageIdentity,
        field: Field,
        value: &Value,
    ) -> Result<(), CacheError> {
        let package_key = identity.cache_key();
        let raw = serde_json::to_string(value)?;
        let now = Self::current_timestamp_ms();

        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO repo_cache (package_key, field, value, inserted_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(package_key, field) DO UPDATE SET
                value = excluded.value,
                inserted_at = excluded.inserted_at
            "#,
            (&package_key, field.as_str(), &raw, now),
        )?;

        debug!("Cached {}/{}", package_key, field);
        Ok(())
    }

    fn clear(&self, identity: &PackageIdentity) -> Result<usize, CacheError> {
        let package_key = identity.cache_key();
        let conn = self.lock_conn()?;
        let removed = conn.execute(
            "DELETE FROM repo_cache WHERE package_key = ?1",
            [&package_key],
        )?;

        info!("Cleared {} cached fields for {}", removed, package_key);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::types::PackageKind;
    use rstest::rstest;
    use serde_json::json;
    use tempfile::TempDir;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn create_cache(ttl: i64) -> (TempDir, SqliteCache) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let cache = SqliteCache::new(&db_path, ttl).unwrap();
        (temp_dir, cache)
    }

    fn identity(repo: &str) -> PackageIdentity {
        PackageIdentity::new(PackageKind::Plugin, "acme", repo, "master")
    }

    #[test]
    fn get_returns_none_for_missing_field() {
        let (_temp_dir, cache) = create_cache(DAY_MS);

        assert_eq!(cache.get(&identity("widget"), Field::Tags).unwrap(), None);
    }

    #[test]
    fn set_then_get_returns_stored_value() {
        let (_temp_dir, cache) = create_cache(DAY_MS);
        let value = json!({"status": "found", "value": ["1.0.0", "1.1.0"]});

        cache.set(&identity("widget"), Field::Tags, &value).unwrap();

        assert_eq!(
            cache.get(&identity("widget"), Field::Tags).unwrap(),
            Some(value)
        );
    }

    #[test]
    fn set_replaces_existing_value() {
        let (_temp_dir, cache) = create_cache(DAY_MS);

        cache
            .set(&identity("widget"), Field::Meta, &json!({"private": true}))
            .unwrap();
        cache
            .set(&identity("widget"), Field::Meta, &json!({"private": false}))
            .unwrap();

        assert_eq!(
            cache.get(&identity("widget"), Field::Meta).unwrap(),
            Some(json!({"private": false}))
        );
    }

    #[test]
    fn get_treats_expired_entries_as_absent() {
        let (_temp_dir, cache) = create_cache(0);

        cache
            .set(&identity("widget"), Field::Tags, &json!(["1.0.0"]))
            .unwrap();

        assert_eq!(cache.get(&identity("widget"), Field::Tags).unwrap(), None);
    }

    #[test]
    fn get_treats_cached_null_as_absent() {
        let (_temp_dir, cache) = create_cache(DAY_MS);

        cache
            .set(&identity("widget"), Field::Readme, &Value::Null)
            .unwrap();

        assert_eq!(cache.get(&identity("widget"), Field::Readme).unwrap(), None);
    }

    #[rstest]
    #[case("widget", Field::Tags, true)]
    #[case("widget", Field::Branches, false)]
    #[case("gadget", Field::Tags, false)]
    fn get_is_scoped_by_identity_and_field(
        #[case] repo: &str,
        #[case] field: Field,
        #[case] expected: bool,
    ) {
        let (_temp_dir, cache) = create_cache(DAY_MS);
        cache
            .set(&identity("widget"), Field::Tags, &json!(["1.0.0"]))
            .unwrap();

        assert_eq!(cache.get(&identity(repo), field).unwrap().is_some(), expected);
    }

    #[test]
    fn get_is_scoped_by_branch() {
        let (_temp_dir, cache) = create_cache(DAY_MS);
        cache
            .set(&identity("widget"), Field::Tags, &json!(["1.0.0"]))
            .unwrap();

        let develop = PackageIdentity::new(PackageKind::Plugin, "acme", "widget", "develop");
        assert_eq!(cache.get(&develop, Field::Tags).unwrap(), None);
    }

    #[rstest]
    #[case(PackageIdentity::new(PackageKind::Theme, "acme", "widget", "master"))]
    #[case(identity("widget").with_enterprise_host("https://git.example.com"))]
    fn get_is_scoped_by_kind_and_host(#[case] other: PackageIdentity) {
        let (_temp_dir, cache) = create_cache(DAY_MS);
        cache
            .set(&identity("widget"), Field::Info, &json!({"name": "Widget"}))
            .unwrap();
        cache
            .set(&other, Field::Info, &json!({"name": "Skin"}))
            .unwrap();

        assert_eq!(
            cache.get(&identity("widget"), Field::Info).unwrap(),
            Some(json!({"name": "Widget"}))
        );
        assert_eq!(
            cache.get(&other, Field::Info).unwrap(),
            Some(json!({"name": "Skin"}))
        );
    }

    #[test]
    fn clear_removes_only_the_package_fields() {
        let (_temp_dir, cache) = create_cache(DAY_MS);
        cache
            .set(&identity("widget"), Field::Tags, &json!(["1.0.0"]))
            .unwrap();
        cache
            .set(&identity("widget"), Field::Meta, &json!({"private": true}))
            .unwrap();
        cache
            .set(&identity("gadget"), Field::Tags, &json!(["2.0.0"]))
            .unwrap();

        let removed = cache.clear(&identity("widget")).unwrap();

        assert_eq!(removed, 2);
        assert_eq!(cache.get(&identity("widget"), Field::Tags).unwrap(), None);
        assert!(cache.get(&identity("gadget"), Field::Tags).unwrap().is_some());
    }

    #[test]
    fn purge_expired_deletes_stale_rows() {
        let (_temp_dir, cache) = create_cache(0);
        cache
            .set(&identity("widget"), Field::Tags, &json!(["1.0.0"]))
            .unwrap();

        assert_eq!(cache.purge_expired().unwrap(), 1);
    }

    #[test]
    fn reopening_database_keeps_entries() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        {
            let cache = SqliteCache::new(&db_path, DAY_MS).unwrap();
            cache
                .set(&identity("widget"), Field::Tags, &json!(["1.0.0"]))
                .unwrap();
        }

        let cache = SqliteCache::new(&db_path, DAY_MS).unwrap();
        assert_eq!(
            cache.get(&identity("widget"), Field::Tags).unwrap(),
            Some(json!(["1.0.0"]))
        );
    }
}
