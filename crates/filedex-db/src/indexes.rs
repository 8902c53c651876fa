//! Secondary index management for the collection table.
//!
//! Index builds are an explicit startup step. Each declared index is created
//! with `CREATE INDEX CONCURRENTLY IF NOT EXISTS`, which takes a SHARE UPDATE
//! EXCLUSIVE lock only, so saves, deletes, and searches keep running while
//! it builds. A concurrent creator that loses the race gets an "already
//! exists" error which is reported as `AlreadyExists`. Any other failure is
//! logged and reported, never returned: queries keep working without the
//! index.
//!
//! A failed concurrent build leaves an INVALID index behind. The next sync
//! drops and rebuilds it, unless another session is still building it.

use std::time::Instant;

use tracing::{debug, info, warn};

use filedex_core::{IndexKind, IndexOutcome, IndexReport, IndexSpec, Result, CATALOG_INDEXES};

use crate::connector::Collection;
use crate::errors::{is_already_exists, sqlstate, UNDEFINED_OBJECT};
use crate::identifier::{quote, truncate};

/// Catalog state of a named index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Missing,
    Valid,
    /// Left behind by a failed concurrent build, or still being built.
    Invalid,
}

/// Builds the catalog's declared indexes on a PostgreSQL collection.
#[derive(Debug, Clone)]
pub struct PgIndexManager {
    collection: Collection,
}

impl PgIndexManager {
    pub fn new(collection: Collection) -> Self {
        Self { collection }
    }

    /// Index name for a declared index on this collection.
    pub fn index_name(&self, spec: &IndexSpec) -> String {
        truncate(spec.name_for(self.collection.name()))
    }

    /// `CREATE INDEX` statement for a declared index.
    pub fn index_ddl(&self, spec: &IndexSpec) -> String {
        let field = format!("(doc->>'{}')", spec.field);
        let target = match spec.kind {
            IndexKind::Exact => format!("({})", field),
            IndexKind::FullText => format!(
                "USING GIN (to_tsvector('simple', COALESCE({}, '')))",
                field
            ),
            IndexKind::Trigram => format!("USING GIN ({} gin_trgm_ops)", field),
        };
        format!(
            "CREATE INDEX CONCURRENTLY IF NOT EXISTS {} ON {} {}",
            quote(&self.index_name(spec)),
            self.collection.qualified_name(),
            target
        )
    }

    /// Create every declared index that is missing.
    pub async fn ensure_indexes(&self) -> IndexReport {
        let start = Instant::now();
        let mut report = IndexReport::default();

        for spec in CATALOG_INDEXES.iter() {
            let name = self.index_name(spec);
            let outcome = self.ensure_index(spec, &name).await;

            match &outcome {
                IndexOutcome::Failed(reason) => warn!(
                    subsystem = "database",
                    component = "indexes",
                    op = "ensure_indexes",
                    index_name = %name,
                    error = %reason,
                    "Index creation failed, queries will run unindexed"
                ),
                other => debug!(
                    subsystem = "database",
                    component = "indexes",
                    index_name = %name,
                    outcome = ?other,
                    "Index checked"
                ),
            }
            report.push(name, spec.kind, outcome);
        }

        info!(
            subsystem = "database",
            component = "indexes",
            op = "ensure_indexes",
            collection = %self.collection.qualified_name(),
            created = report.created_count(),
            failed = report.failures().count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Index sync complete"
        );
        report
    }

    async fn ensure_index(&self, spec: &IndexSpec, name: &str) -> IndexOutcome {
        if spec.kind == IndexKind::Trigram {
            match self.has_trigram_extension().await {
                Ok(true) => {}
                Ok(false) => return IndexOutcome::Skipped("pg_trgm extension not installed".into()),
                Err(e) => return IndexOutcome::Failed(e.to_string()),
            }
        }

        match self.index_state(name).await {
            Ok(IndexState::Valid) => return IndexOutcome::AlreadyExists,
            Ok(IndexState::Missing) => {}
            Ok(IndexState::Invalid) => match self.build_in_progress(name).await {
                Ok(true) => return IndexOutcome::AlreadyExists,
                Ok(false) => {
                    warn!(
                        subsystem = "database",
                        component = "indexes",
                        index_name = %name,
                        "Dropping invalid index left by a failed build"
                    );
                    if let Err(e) = self.drop_index(name).await {
                        return IndexOutcome::Failed(format!("invalid index could not be dropped: {}", e));
                    }
                }
                Err(e) => return IndexOutcome::Failed(e.to_string()),
            },
            Err(e) => return IndexOutcome::Failed(e.to_string()),
        }

        // CONCURRENTLY refuses to run inside a transaction block, so send it
        // over the simple query protocol.
        match sqlx::raw_sql(&self.index_ddl(spec))
            .execute(self.collection.pool())
            .await
        {
            Ok(_) => IndexOutcome::Created,
            Err(e) if is_already_exists(&e) => IndexOutcome::AlreadyExists,
            Err(e) if spec.kind == IndexKind::Trigram
                && sqlstate(&e).as_deref() == Some(UNDEFINED_OBJECT) =>
            {
                IndexOutcome::Skipped("gin_trgm_ops not available".into())
            }
            Err(e) => IndexOutcome::Failed(e.to_string()),
        }
    }

    /// Look up an index in the collection's schema and whether it is usable.
    pub async fn index_state(&self, name: &str) -> Result<IndexState> {
        let valid: Option<bool> = sqlx::query_scalar(
            "SELECT i.indisvalid FROM pg_index i WHERE i.indexrelid = to_regclass($1)",
        )
        .bind(self.collection.qualify(name))
        .fetch_optional(self.collection.pool())
        .await?;

        Ok(match valid {
            None => IndexState::Missing,
            Some(true) => IndexState::Valid,
            Some(false) => IndexState::Invalid,
        })
    }

    /// Returns true while some session is running `CREATE INDEX` for `name`.
    async fn build_in_progress(&self, name: &str) -> Result<bool> {
        let building: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM pg_stat_progress_create_index WHERE index_relid = to_regclass($1))",
        )
        .bind(self.collection.qualify(name))
        .fetch_one(self.collection.pool())
        .await?;
        Ok(building)
    }

    async fn drop_index(&self, name: &str) -> Result<()> {
        let sql = format!(
            "DROP INDEX CONCURRENTLY IF EXISTS {}",
            self.collection.qualify(name)
        );
        sqlx::raw_sql(&sql).execute(self.collection.pool()).await?;
        Ok(())
    }

    /// Check if the pg_trgm extension is available.
    pub async fn has_trigram_extension(&self) -> Result<bool> {
        let has: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM pg_extension WHERE extname = 'pg_trgm')",
        )
        .fetch_one(self.collection.pool())
        .await?;
        Ok(has)
    }
}
