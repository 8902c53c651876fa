//! Store connector: one pool, one collection handle per process.
//!
//! The "database" of the catalog configuration is a PostgreSQL schema and the
//! "collection" is a table inside it with one JSONB document per entry:
//!
//! ```sql
//! CREATE TABLE "<database>"."<collection>" (
//!     _id TEXT PRIMARY KEY,
//!     doc JSONB NOT NULL
//! );
//! ```

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use filedex_core::{CatalogConfig, Error, Result};

use crate::errors::is_already_exists;
use crate::identifier::{quote, validate_identifier};

/// Default acquire timeout in seconds.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Connection pool tuning beyond what [`CatalogConfig`] carries.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            min_connections: 1,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

impl PoolOptions {
    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }
}

/// Shared handle to the catalog collection.
///
/// Cheap to clone; every clone uses the same pool.
#[derive(Debug, Clone)]
pub struct Collection {
    pool: PgPool,
    schema: String,
    name: String,
}

impl Collection {
    /// Wrap an existing pool. Validates the names but performs no I/O.
    pub fn new(pool: PgPool, schema: &str, name: &str) -> Result<Self> {
        validate_identifier("database", schema)?;
        validate_identifier("collection", name)?;
        Ok(Self {
            pool,
            schema: schema.to_string(),
            name: name.to_string(),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema-qualified, quoted table name for SQL.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", quote(&self.schema), quote(&self.name))
    }

    /// Schema-qualified, quoted name of another relation in the same schema.
    pub fn qualify(&self, relation: &str) -> String {
        format!("{}.{}", quote(&self.schema), quote(relation))
    }

    /// Create the schema and collection table if they do not exist.
    ///
    /// Safe to run from several processes at once.
    pub async fn create_if_missing(&self) -> Result<()> {
        let statements = [
            format!("CREATE SCHEMA IF NOT EXISTS {}", quote(&self.schema)),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (_id TEXT PRIMARY KEY, doc JSONB NOT NULL)",
                self.qualified_name()
            ),
        ];

        for sql in &statements {
            match sqlx::query(sql).execute(&self.pool).await {
                Ok(_) => {}
                Err(e) if is_already_exists(&e) => {
                    debug!(
                        subsystem = "database",
                        component = "connector",
                        collection = %self.name,
                        "Concurrent creator won the race, treating as existing"
                    );
                }
                Err(e) => return Err(Error::Database(e)),
            }
        }
        Ok(())
    }

    /// Drop the collection table. Used by test fixtures.
    pub async fn drop_collection(&self) -> Result<()> {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", self.qualified_name()))
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

/// Connect with default pool options.
pub async fn connect(config: &CatalogConfig) -> Result<Collection> {
    connect_with_options(config, PoolOptions::default()).await
}

/// Open the pool, then make sure the collection exists.
///
/// Fails fast: a missing address or invalid name is a `Config` error before
/// any I/O; an unreachable server is a `Database` error from the first
/// connection attempt. There is no retry.
pub async fn connect_with_options(config: &CatalogConfig, options: PoolOptions) -> Result<Collection> {
    config.validate()?;
    validate_identifier("database", &config.database_name)?;
    validate_identifier("collection", &config.collection_name)?;

    let start = Instant::now();
    info!(
        subsystem = "database",
        component = "connector",
        op = "connect",
        uri = %config.redacted_uri(),
        database = %config.database_name,
        collection = %config.collection_name,
        max_connections = config.max_connections,
        "Connecting to catalog store"
    );

    let mut pool_options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(options.min_connections.min(config.max_connections))
        .acquire_timeout(options.acquire_timeout)
        .idle_timeout(options.idle_timeout);
    if let Some(max_lifetime) = options.max_lifetime {
        pool_options = pool_options.max_lifetime(max_lifetime);
    }

    let pool = pool_options
        .connect(&config.database_uri)
        .await
        .map_err(Error::Database)?;

    let collection = Collection::new(pool, &config.database_name, &config.collection_name)?;
    collection.create_if_missing().await?;

    info!(
        subsystem = "database",
        component = "connector",
        op = "established",
        collection = %collection.qualified_name(),
        pool_size = collection.pool().size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Catalog store connected"
    );
    Ok(collection)
}

/// Log current pool health metrics.
///
/// Warns if no idle connections remain (potential exhaustion).
pub fn log_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle();

    debug!(
        subsystem = "database",
        component = "pool",
        op = "metrics",
        pool_size = size,
        pool_idle = idle,
        "Pool health check"
    );

    if idle == 0 && size > 0 {
        warn!(
            subsystem = "database",
            component = "pool",
            pool_size = size,
            "Connection pool has no idle connections, potential exhaustion"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_options_builder() {
        let options = PoolOptions::default()
            .min_connections(3)
            .acquire_timeout(Duration::from_secs(5))
            .max_lifetime(None);

        assert_eq!(options.min_connections, 3);
        assert_eq!(options.acquire_timeout, Duration::from_secs(5));
        assert_eq!(options.idle_timeout, Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS));
        assert_eq!(options.max_lifetime, None);
    }

    #[tokio::test]
    async fn test_missing_address_fails_before_io() {
        let config = CatalogConfig::new("");
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_invalid_collection_name_fails_before_io() {
        let config = CatalogConfig::new("postgres://127.0.0.1:1/unused").collection_name("bad-name");
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_database_error() {
        let config = CatalogConfig::new("postgres://filedex@127.0.0.1:1/unused");
        let options = PoolOptions::default().acquire_timeout(Duration::from_secs(2));
        let err = connect_with_options(&config, options).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[tokio::test]
    async fn test_qualified_names_are_quoted() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let collection = Collection::new(pool, "Cluster0", "Telegram_files").unwrap();
        assert_eq!(collection.qualified_name(), "\"Cluster0\".\"Telegram_files\"");
        assert_eq!(collection.qualify("idx"), "\"Cluster0\".\"idx\"");
    }

    #[tokio::test]
    async fn test_log_pool_metrics_on_idle_pool() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        assert_eq!(pool.size(), 0);
        log_pool_metrics(&pool);
    }
}
