//! Storage trait the catalog runs against.
//!
//! Implementations: `filedex_db::PgCatalogStore` (PostgreSQL collection table)
//! and [`crate::memory::MemoryCatalogStore`] (process-local, for tests and
//! embedding).

use async_trait::async_trait;

use crate::error::Result;
use crate::filter::EntryFilter;
use crate::indexes::IndexReport;
use crate::models::{CatalogEntry, SaveOutcome};
use crate::search::SearchQuery;

/// Document storage for catalog entries.
///
/// Every method is a single store round trip with per-document atomicity and
/// no cross-call isolation. Implementations must be safe to share across
/// concurrent tasks.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert a new entry keyed by `file_id`.
    ///
    /// Returns [`SaveOutcome::Duplicate`] (not an error) when the key exists.
    /// Uniqueness is enforced by the store, so concurrent inserts of the same
    /// key resolve to exactly one `Inserted`.
    async fn insert(&self, entry: &CatalogEntry) -> Result<SaveOutcome>;

    /// Fetch an entry by `file_id`.
    async fn get(&self, file_id: &str) -> Result<Option<CatalogEntry>>;

    /// Return up to `limit` entries matching `filter`, in store order.
    async fn find(&self, filter: &EntryFilter, limit: u32) -> Result<Vec<CatalogEntry>>;

    /// Count entries matching `filter`.
    async fn count(&self, filter: &EntryFilter) -> Result<u64>;

    /// Delete every entry matching `filter`, returning the number removed.
    async fn delete_many(&self, filter: &EntryFilter) -> Result<u64>;

    /// Run a compiled search: name pattern AND type filter, then skip/limit.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CatalogEntry>>;

    /// Count all matches of a search, ignoring its offset and limit.
    async fn search_count(&self, query: &SearchQuery) -> Result<u64>;

    /// Create the declared secondary indexes if missing. Never fails; see
    /// [`IndexReport`].
    async fn ensure_indexes(&self) -> IndexReport;
}
