//! PostgreSQL catalog store.
//!
//! Equality filters run as JSONB containment (`doc @> $1`); search runs as a
//! case-insensitive POSIX regex (`doc->>'file_name' ~* $1`) built by
//! [`SearchQuery`]. Search pages are ordered by `_id` so offset/limit paging
//! is deterministic over a static collection.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use filedex_core::{
    CatalogEntry, CatalogStore, EntryFilter, Error, IndexReport, Result, SaveOutcome,
    SearchQuery,
};

use crate::connector::Collection;
use crate::indexes::PgIndexManager;

/// A bind parameter for dynamically assembled search SQL.
#[derive(Debug, Clone, PartialEq)]
enum SearchParam {
    Text(String),
    Int(i64),
}

/// [`CatalogStore`] backed by a PostgreSQL collection table.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    collection: Collection,
    indexes: PgIndexManager,
}

impl PgCatalogStore {
    pub fn new(collection: Collection) -> Self {
        Self {
            indexes: PgIndexManager::new(collection.clone()),
            collection,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Build the WHERE clause and its parameters for a search.
    fn search_where(query: &SearchQuery) -> (String, Vec<SearchParam>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(pattern) = query.pattern() {
            params.push(SearchParam::Text(pattern.to_string()));
            clauses.push(format!("doc->>'file_name' ~* ${}", params.len()));
        }
        if let Some(ft) = query.file_type {
            params.push(SearchParam::Text(ft.as_str().to_string()));
            clauses.push(format!("doc->>'file_type' = ${}", params.len()));
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), params)
        }
    }

    fn search_sql(&self, query: &SearchQuery) -> (String, Vec<SearchParam>) {
        let (where_clause, mut params) = Self::search_where(query);
        params.push(SearchParam::Int(i64::from(query.offset)));
        let offset_idx = params.len();
        params.push(SearchParam::Int(i64::from(query.max_results)));
        let limit_idx = params.len();

        let sql = format!(
            "SELECT _id, doc FROM {} {} ORDER BY _id OFFSET ${} LIMIT ${}",
            self.collection.qualified_name(),
            where_clause,
            offset_idx,
            limit_idx
        );
        (sql, params)
    }

    fn search_count_sql(&self, query: &SearchQuery) -> (String, Vec<SearchParam>) {
        let (where_clause, params) = Self::search_where(query);
        let sql = format!(
            "SELECT COUNT(*) FROM {} {}",
            self.collection.qualified_name(),
            where_clause
        );
        (sql, params)
    }

    /// Decode result rows, skipping (and logging) documents that no longer decode.
    fn decode_all(rows: Vec<(String, JsonValue)>) -> Vec<CatalogEntry> {
        rows.into_iter()
            .filter_map(|(id, doc)| CatalogEntry::decode_or_skip(&id, doc))
            .collect()
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn insert(&self, entry: &CatalogEntry) -> Result<SaveOutcome> {
        let doc = entry.to_document()?;
        let sql = format!(
            "INSERT INTO {} (_id, doc) VALUES ($1, $2) ON CONFLICT (_id) DO NOTHING",
            self.collection.qualified_name()
        );

        let result = sqlx::query(&sql)
            .bind(&entry.file_id)
            .bind(doc)
            .execute(self.collection.pool())
            .await
            .map_err(Error::Database)?;

        Ok(if result.rows_affected() == 0 {
            SaveOutcome::Duplicate
        } else {
            SaveOutcome::Inserted
        })
    }

    async fn get(&self, file_id: &str) -> Result<Option<CatalogEntry>> {
        let sql = format!(
            "SELECT doc FROM {} WHERE _id = $1",
            self.collection.qualified_name()
        );
        let doc: Option<JsonValue> = sqlx::query_scalar(&sql)
            .bind(file_id)
            .fetch_optional(self.collection.pool())
            .await
            .map_err(Error::Database)?;

        doc.map(CatalogEntry::from_document).transpose()
    }

    async fn find(&self, filter: &EntryFilter, limit: u32) -> Result<Vec<CatalogEntry>> {
        let sql = format!(
            "SELECT _id, doc FROM {} WHERE doc @> $1 LIMIT $2",
            self.collection.qualified_name()
        );
        let rows: Vec<(String, JsonValue)> = sqlx::query_as(&sql)
            .bind(filter.to_containment()?)
            .bind(i64::from(limit))
            .fetch_all(self.collection.pool())
            .await
            .map_err(Error::Database)?;

        Ok(Self::decode_all(rows))
    }

    async fn count(&self, filter: &EntryFilter) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE doc @> $1",
            self.collection.qualified_name()
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(filter.to_containment()?)
            .fetch_one(self.collection.pool())
            .await
            .map_err(Error::Database)?;

        Ok(count as u64)
    }

    async fn delete_many(&self, filter: &EntryFilter) -> Result<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE doc @> $1",
            self.collection.qualified_name()
        );
        let result = sqlx::query(&sql)
            .bind(filter.to_containment()?)
            .execute(self.collection.pool())
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<CatalogEntry>> {
        query.validate()?;
        let (sql, params) = self.search_sql(query);
        trace!(sql = %sql, pattern = ?query.pattern(), "Search SQL");

        let mut q = sqlx::query_as::<_, (String, JsonValue)>(&sql);
        for param in params {
            q = match param {
                SearchParam::Text(s) => q.bind(s),
                SearchParam::Int(i) => q.bind(i),
            };
        }

        let rows = q
            .fetch_all(self.collection.pool())
            .await
            .map_err(Error::Database)?;
        debug!(
            subsystem = "database",
            component = "pg_store",
            op = "search",
            result_count = rows.len(),
            "Search executed"
        );

        Ok(Self::decode_all(rows))
    }

    async fn search_count(&self, query: &SearchQuery) -> Result<u64> {
        query.validate()?;
        let (sql, params) = self.search_count_sql(query);

        let mut q = sqlx::query_scalar::<_, i64>(&sql);
        for param in params {
            q = match param {
                SearchParam::Text(s) => q.bind(s),
                SearchParam::Int(i) => q.bind(i),
            };
        }

        let count = q
            .fetch_one(self.collection.pool())
            .await
            .map_err(Error::Database)?;
        Ok(count as u64)
    }

    async fn ensure_indexes(&self) -> IndexReport {
        self.indexes.ensure_indexes().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filedex_core::FileType;
    use sqlx::postgres::PgPoolOptions;

    fn store() -> PgCatalogStore {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        PgCatalogStore::new(Collection::new(pool, "Cluster0", "media").unwrap())
    }

    #[tokio::test]
    async fn test_search_sql_with_pattern_and_type() {
        let query = SearchQuery::parse("the matrix")
            .with_file_type(Some(FileType::Video))
            .with_offset(3)
            .with_max_results(3);
        let (sql, params) = store().search_sql(&query);

        assert_eq!(
            sql,
            "SELECT _id, doc FROM \"Cluster0\".\"media\" WHERE doc->>'file_name' ~* $1 AND doc->>'file_type' = $2 ORDER BY _id OFFSET $3 LIMIT $4"
        );
        assert_eq!(
            params,
            vec![
                SearchParam::Text("the.*matrix".to_string()),
                SearchParam::Text("video".to_string()),
                SearchParam::Int(3),
                SearchParam::Int(3),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_query_has_no_name_clause() {
        let (sql, params) = store().search_sql(&SearchQuery::parse("  "));
        assert!(!sql.contains("WHERE"));
        assert_eq!(params, vec![SearchParam::Int(0), SearchParam::Int(50)]);

        let query = SearchQuery::parse("").with_file_type(Some(FileType::Audio));
        let (sql, _) = store().search_sql(&query);
        assert!(sql.contains("WHERE doc->>'file_type' = $1"));
        assert!(!sql.contains("~*"));
    }

    #[tokio::test]
    async fn test_search_count_sql_ignores_paging() {
        let query = SearchQuery::parse("report").with_offset(10);
        let (sql, params) = store().search_count_sql(&query);
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM \"Cluster0\".\"media\" WHERE doc->>'file_name' ~* $1"
        );
        assert_eq!(params.len(), 1);
    }

    #[tokio::test]
    async fn test_overlong_query_is_rejected_before_io() {
        let query = SearchQuery::parse(&"x".repeat(filedex_core::MAX_QUERY_CHARS + 1));
        let err = store().search(&query).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        let err = store().search_count(&query).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_decode_all_skips_bad_documents() {
        let rows = vec![
            ("a".to_string(), serde_json::json!({"file_id": "a"})),
            ("b".to_string(), serde_json::json!({"file_id": "b", "file_type": "hologram"})),
        ];
        let entries = PgCatalogStore::decode_all(rows);
        assert_eq!(entries, vec![CatalogEntry::new("a")]);
    }
}
