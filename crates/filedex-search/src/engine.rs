//! Ordered substring search over a catalog store.
//!
//! The engine compiles free text into a [`SearchQuery`] and runs it against
//! whatever [`CatalogStore`] it was built with. Matching semantics live in
//! `filedex_core::search`; this module adds paging helpers and logging.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, instrument};

use filedex_core::{CatalogEntry, CatalogStore, FileType, Result, SearchQuery, DEFAULT_MAX_RESULTS};

/// One page of search results plus the offset of the next page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub entries: Vec<CatalogEntry>,
    /// Offset this page was read from.
    pub offset: u32,
    /// Offset of the following page, `None` when this page came back short.
    pub next_offset: Option<u32>,
}

impl SearchPage {
    fn from_entries(entries: Vec<CatalogEntry>, query: &SearchQuery) -> Self {
        let full = query.max_results > 0 && entries.len() as u32 >= query.max_results;
        let next_offset = if full {
            query.offset.checked_add(query.max_results)
        } else {
            None
        };
        Self {
            entries,
            offset: query.offset,
            next_offset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Search engine over a shared catalog store.
#[derive(Clone)]
pub struct SearchEngine {
    store: Arc<dyn CatalogStore>,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine").finish_non_exhaustive()
    }
}

impl SearchEngine {
    /// Create a search engine over the given store.
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Search `file_name` for `text`, optionally restricted to one type.
    pub async fn search(
        &self,
        text: &str,
        file_type: Option<FileType>,
        max_results: u32,
        offset: u32,
    ) -> Result<Vec<CatalogEntry>> {
        let query = SearchQuery::parse(text)
            .with_file_type(file_type)
            .with_max_results(max_results)
            .with_offset(offset);
        self.run(&query).await
    }

    /// Run an already compiled query.
    #[instrument(skip(self, query), fields(
        subsystem = "search",
        component = "engine",
        op = "search",
        query = %query.terms().join(" "),
        file_type = ?query.file_type,
        offset = query.offset,
        max_results = query.max_results,
    ))]
    pub async fn run(&self, query: &SearchQuery) -> Result<Vec<CatalogEntry>> {
        if query.max_results == 0 {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let entries = self.store.search(query).await?;
        debug!(
            result_count = entries.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Search complete"
        );
        Ok(entries)
    }

    /// Run a query and wrap the result as a [`SearchPage`].
    pub async fn run_page(&self, query: &SearchQuery) -> Result<SearchPage> {
        let entries = self.run(query).await?;
        Ok(SearchPage::from_entries(entries, query))
    }

    /// Total number of matches for `text`, ignoring paging.
    pub async fn count(&self, text: &str, file_type: Option<FileType>) -> Result<u64> {
        let query = SearchQuery::parse(text).with_file_type(file_type);
        self.store.search_count(&query).await
    }
}

/// Builder for search requests.
///
/// ```ignore
/// let hits = SearchRequest::new("the matrix")
///     .with_file_type(FileType::Video)
///     .with_limit(10)
///     .execute(&engine)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct SearchRequest {
    text: String,
    file_type: Option<FileType>,
    limit: u32,
    offset: u32,
}

impl SearchRequest {
    /// Create a new search request for `text` with default paging.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            file_type: None,
            limit: DEFAULT_MAX_RESULTS,
            offset: 0,
        }
    }

    /// Only match entries of this type.
    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Skip this many matches first.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Compile into a [`SearchQuery`].
    pub fn to_query(&self) -> SearchQuery {
        SearchQuery::parse(&self.text)
            .with_file_type(self.file_type)
            .with_max_results(self.limit)
            .with_offset(self.offset)
    }

    /// Execute the search request.
    pub async fn execute(self, engine: &SearchEngine) -> Result<Vec<CatalogEntry>> {
        engine.run(&self.to_query()).await
    }

    /// Execute and return a [`SearchPage`].
    pub async fn execute_page(self, engine: &SearchEngine) -> Result<SearchPage> {
        engine.run_page(&self.to_query()).await
    }
}
