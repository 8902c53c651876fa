//! # filedex-db
//!
//! PostgreSQL storage layer for the filedex media catalog.
//!
//! This crate provides:
//! - The store connector (one pool + one collection handle per process)
//! - A JSONB document collection implementing [`CatalogStore`]
//! - Secondary index management with race-tolerant creation
//!
//! ## Example
//!
//! ```rust,ignore
//! use filedex_db::{CatalogConfig, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect(&CatalogConfig::from_env()?).await?;
//!     let report = db.ensure_indexes().await;
//!     println!("indexes ok: {}", report.is_success());
//!     Ok(())
//! }
//! ```
pub mod catalog;
pub mod connector;
pub mod errors;
pub mod identifier;
pub mod indexes;

// Test fixtures for integration tests.
// Always compiled so tests/ can share them.
pub mod test_fixtures;

// Re-export core types
pub use filedex_core::*;

pub use catalog::PgCatalogStore;
pub use connector::{connect, connect_with_options, log_pool_metrics, Collection, PoolOptions};
pub use identifier::validate_identifier;
pub use indexes::{IndexState, PgIndexManager};

/// Connected catalog storage: the shared collection handle and the store over it.
#[derive(Debug, Clone)]
pub struct Database {
    /// The collection handle (owns the pool).
    pub collection: Collection,
    /// Catalog store for reads, writes, and searches.
    pub store: PgCatalogStore,
}

impl Database {
    /// Build from an already-connected collection.
    pub fn new(collection: Collection) -> Self {
        Self {
            store: PgCatalogStore::new(collection.clone()),
            collection,
        }
    }

    /// Connect using the given configuration.
    pub async fn connect(config: &CatalogConfig) -> Result<Self> {
        Ok(Self::new(connect(config).await?))
    }

    /// Connect with custom pool options.
    pub async fn connect_with_options(config: &CatalogConfig, options: PoolOptions) -> Result<Self> {
        Ok(Self::new(connect_with_options(config, options).await?))
    }

    /// Create the declared secondary indexes. Never fails; see [`IndexReport`].
    pub async fn ensure_indexes(&self) -> IndexReport {
        self.store.ensure_indexes().await
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::PgPool {
        self.collection.pool()
    }
}
