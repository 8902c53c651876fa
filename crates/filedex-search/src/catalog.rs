//! The catalog: the one type surrounding code calls into.
//!
//! [`Catalog`] wraps an injected [`CatalogStore`] and exposes idempotent
//! saves, point and filtered reads, bulk deletion, ordered substring search,
//! and index maintenance. Duplicates and misses are ordinary outcomes; only
//! storage failures come back as errors, and those are logged with the
//! operation and key, never the document.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use filedex_core::{
    CatalogEntry, CatalogStore, EntryFilter, FileType, IndexReport, Result, SaveOutcome,
    SaveSummary,
};

use crate::engine::{SearchEngine, SearchPage, SearchRequest};

/// Default `find` limit.
pub const DEFAULT_FIND_LIMIT: u32 = 50;

/// Media catalog over a shared store handle.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    engine: SearchEngine,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").finish_non_exhaustive()
    }
}

impl Catalog {
    /// Create a catalog over a shared store.
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            engine: SearchEngine::new(store.clone()),
            store,
        }
    }

    /// Create a catalog that owns `store`.
    pub fn from_store<S: CatalogStore + 'static>(store: S) -> Self {
        Self::new(Arc::new(store))
    }

    /// The search engine sharing this catalog's store.
    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// Save a new entry.
    ///
    /// Returns [`SaveOutcome::Duplicate`] when an entry with the same
    /// `file_id` already exists; the stored entry is left unchanged.
    pub async fn save(&self, entry: &CatalogEntry) -> Result<SaveOutcome> {
        entry.validate()?;

        match self.store.insert(entry).await {
            Ok(outcome) => {
                debug!(
                    subsystem = "catalog",
                    op = "save",
                    file_id = %entry.file_id,
                    outcome = ?outcome,
                    "Entry saved"
                );
                Ok(outcome)
            }
            Err(e) => {
                error!(
                    subsystem = "catalog",
                    op = "save",
                    file_id = %entry.file_id,
                    error = %e,
                    "Failed to save entry"
                );
                Err(e)
            }
        }
    }

    /// Save a batch one entry at a time, stopping at the first storage error.
    pub async fn save_many(&self, entries: &[CatalogEntry]) -> Result<SaveSummary> {
        let mut summary = SaveSummary::default();
        for entry in entries {
            summary.record(self.save(entry).await?);
        }
        debug!(
            subsystem = "catalog",
            op = "save_many",
            inserted = summary.inserted,
            duplicates = summary.duplicates,
            "Batch saved"
        );
        Ok(summary)
    }

    /// Look up an entry by `file_id`.
    pub async fn find_one(&self, file_id: &str) -> Result<Option<CatalogEntry>> {
        self.store.get(file_id).await.map_err(|e| {
            error!(
                subsystem = "catalog",
                op = "find_one",
                file_id = %file_id,
                error = %e,
                "Lookup failed"
            );
            e
        })
    }

    /// Returns true if an entry with this `file_id` exists.
    pub async fn exists(&self, file_id: &str) -> Result<bool> {
        Ok(self.find_one(file_id).await?.is_some())
    }

    /// Up to `limit` entries matching `filter`, in store order.
    pub async fn find(&self, filter: &EntryFilter, limit: u32) -> Result<Vec<CatalogEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.store
            .find(filter, limit)
            .await
            .map_err(|e| log_failure("find", e))
    }

    /// Count entries matching `filter`. An empty filter counts the catalog.
    pub async fn count_documents(&self, filter: &EntryFilter) -> Result<u64> {
        self.store
            .count(filter)
            .await
            .map_err(|e| log_failure("count_documents", e))
    }

    /// Delete every entry matching `filter`. An empty filter deletes everything.
    pub async fn delete_many(&self, filter: &EntryFilter) -> Result<u64> {
        let deleted = self
            .store
            .delete_many(filter)
            .await
            .map_err(|e| log_failure("delete_many", e))?;
        info!(
            subsystem = "catalog",
            op = "delete_many",
            deleted_count = deleted,
            unfiltered = filter.is_empty(),
            "Entries deleted"
        );
        Ok(deleted)
    }

    /// Ordered, case-insensitive substring search on `file_name`.
    pub async fn search(
        &self,
        query: &str,
        file_type: Option<FileType>,
        max_results: u32,
        offset: u32,
    ) -> Result<Vec<CatalogEntry>> {
        self.engine
            .search(query, file_type, max_results, offset)
            .await
            .map_err(|e| log_failure("search", e))
    }

    /// Like [`Catalog::search`], but returns the offset of the next page too.
    pub async fn search_page(
        &self,
        query: &str,
        file_type: Option<FileType>,
        max_results: u32,
        offset: u32,
    ) -> Result<SearchPage> {
        let mut request = SearchRequest::new(query)
            .with_limit(max_results)
            .with_offset(offset);
        if let Some(ft) = file_type {
            request = request.with_file_type(ft);
        }
        request
            .execute_page(&self.engine)
            .await
            .map_err(|e| log_failure("search_page", e))
    }

    /// Total number of entries `search` would match, ignoring paging.
    pub async fn search_count(&self, query: &str, file_type: Option<FileType>) -> Result<u64> {
        self.engine
            .count(query, file_type)
            .await
            .map_err(|e| log_failure("search_count", e))
    }

    /// Build the declared indexes. Never fails; inspect the report.
    pub async fn ensure_indexes(&self) -> IndexReport {
        let report = self.store.ensure_indexes().await;
        if !report.is_success() {
            warn!(
                subsystem = "catalog",
                op = "ensure_indexes",
                failed_count = report.failures().count(),
                "Some indexes could not be built; queries run unindexed"
            );
        }
        report
    }
}

fn log_failure(op: &'static str, e: filedex_core::Error) -> filedex_core::Error {
    error!(subsystem = "catalog", op, error = %e, "Catalog operation failed");
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use filedex_core::{Error, MemoryCatalogStore};

    fn catalog() -> Catalog {
        Catalog::from_store(MemoryCatalogStore::new())
    }

    #[tokio::test]
    async fn test_save_rejects_blank_file_id() {
        let catalog = catalog();
        let err = catalog.save(&CatalogEntry::new("  ")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(catalog.count_documents(&EntryFilter::all()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_with_zero_limit_is_empty() {
        let catalog = catalog();
        catalog.save(&CatalogEntry::new("a")).await.unwrap();
        assert!(catalog.find(&EntryFilter::all(), 0).await.unwrap().is_empty());
        assert_eq!(catalog.find(&EntryFilter::all(), DEFAULT_FIND_LIMIT).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exists() {
        let catalog = catalog();
        catalog.save(&CatalogEntry::new("a")).await.unwrap();
        assert!(catalog.exists("a").await.unwrap());
        assert!(!catalog.exists("b").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_many_counts_duplicates() {
        let catalog = catalog();
        let batch = vec![
            CatalogEntry::new("a"),
            CatalogEntry::new("b"),
            CatalogEntry::new("a"),
        ];
        let summary = catalog.save_many(&batch).await.unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.total(), 3);
    }

    #[tokio::test]
    async fn test_save_many_stops_on_invalid_entry() {
        let catalog = catalog();
        let batch = vec![CatalogEntry::new("a"), CatalogEntry::new(""), CatalogEntry::new("c")];
        assert!(catalog.save_many(&batch).await.is_err());
        assert!(catalog.exists("a").await.unwrap());
        assert!(!catalog.exists("c").await.unwrap());
    }
}
