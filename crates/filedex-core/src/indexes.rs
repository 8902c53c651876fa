//! Secondary index declarations and index-sync reporting.
//!
//! Index builds are best-effort. A failed build leaves the catalog fully
//! usable (queries run unindexed), so stores report per-index outcomes in an
//! [`IndexReport`] instead of returning an error.

use serde::Serialize;

/// How an index is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Exact-match lookup on a field value.
    Exact,
    /// Full-text index over a field.
    FullText,
    /// Trigram index accelerating substring / regex matching. Optional: only
    /// built where the backend supports it.
    Trigram,
}

/// A secondary index the catalog wants to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    /// Name suffix; stores prefix it with the collection name.
    pub suffix: &'static str,
    /// Document field the index covers.
    pub field: &'static str,
    pub kind: IndexKind,
}

impl IndexSpec {
    /// Full index name for a collection.
    pub fn name_for(&self, collection: &str) -> String {
        format!("{}_{}", collection, self.suffix)
    }
}

/// Every index the catalog declares.
pub const CATALOG_INDEXES: [IndexSpec; 4] = [
    IndexSpec {
        suffix: "file_name_idx",
        field: "file_name",
        kind: IndexKind::Exact,
    },
    IndexSpec {
        suffix: "file_type_idx",
        field: "file_type",
        kind: IndexKind::Exact,
    },
    IndexSpec {
        suffix: "file_name_text_idx",
        field: "file_name",
        kind: IndexKind::FullText,
    },
    IndexSpec {
        suffix: "file_name_trgm_idx",
        field: "file_name",
        kind: IndexKind::Trigram,
    },
];

/// What happened to one index during a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum IndexOutcome {
    Created,
    /// The index existed already, or a concurrent creator won the race.
    AlreadyExists,
    /// Not applicable to this backend (e.g. a missing extension).
    Skipped(String),
    /// The build failed; queries still work, unindexed.
    Failed(String),
}

/// Per-index status for one index sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    pub name: String,
    pub kind: IndexKind,
    pub outcome: IndexOutcome,
}

/// Outcome of `ensure_indexes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub indexes: Vec<IndexStatus>,
}

impl IndexReport {
    pub fn push(&mut self, name: impl Into<String>, kind: IndexKind, outcome: IndexOutcome) {
        self.indexes.push(IndexStatus {
            name: name.into(),
            kind,
            outcome,
        });
    }

    /// Returns true if no index build failed. Skipped indexes count as success.
    pub fn is_success(&self) -> bool {
        !self
            .indexes
            .iter()
            .any(|s| matches!(s.outcome, IndexOutcome::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &IndexStatus> {
        self.indexes
            .iter()
            .filter(|s| matches!(s.outcome, IndexOutcome::Failed(_)))
    }

    pub fn created_count(&self) -> usize {
        self.indexes
            .iter()
            .filter(|s| s.outcome == IndexOutcome::Created)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declares_name_type_and_text_indexes() {
        let exact: Vec<_> = CATALOG_INDEXES
            .iter()
            .filter(|s| s.kind == IndexKind::Exact)
            .map(|s| s.field)
            .collect();
        assert_eq!(exact, vec!["file_name", "file_type"]);
        assert!(CATALOG_INDEXES
            .iter()
            .any(|s| s.kind == IndexKind::FullText && s.field == "file_name"));
    }

    #[test]
    fn test_index_names_are_unique() {
        let mut names: Vec<_> = CATALOG_INDEXES.iter().map(|s| s.name_for("media")).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CATALOG_INDEXES.len());
        assert_eq!(CATALOG_INDEXES[0].name_for("media"), "media_file_name_idx");
    }

    #[test]
    fn test_report_success_ignores_skipped() {
        let mut report = IndexReport::default();
        report.push("a", IndexKind::Exact, IndexOutcome::Created);
        report.push("b", IndexKind::Exact, IndexOutcome::AlreadyExists);
        report.push(
            "c",
            IndexKind::Trigram,
            IndexOutcome::Skipped("pg_trgm not installed".into()),
        );
        assert!(report.is_success());
        assert_eq!(report.created_count(), 1);

        report.push("d", IndexKind::FullText, IndexOutcome::Failed("boom".into()));
        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
    }
}
