//! Process-local catalog store.
//!
//! Keeps entries as encoded documents in a `BTreeMap` keyed by `file_id`, so
//! reads go through the same document decoding as the database store. Store
//! order is ascending `file_id`.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::error::Result;
use crate::filter::EntryFilter;
use crate::indexes::{IndexKind, IndexOutcome, IndexReport, CATALOG_INDEXES};
use crate::models::{CatalogEntry, SaveOutcome};
use crate::search::SearchQuery;
use crate::traits::CatalogStore;

const DEFAULT_COLLECTION: &str = "catalog";

/// In-memory [`CatalogStore`].
#[derive(Debug)]
pub struct MemoryCatalogStore {
    collection: String,
    docs: RwLock<BTreeMap<String, JsonValue>>,
    indexes: Mutex<BTreeSet<String>>,
}

impl Default for MemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::with_collection(DEFAULT_COLLECTION)
    }

    /// Create a store whose index names are prefixed with `collection`.
    pub fn with_collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            docs: RwLock::new(BTreeMap::new()),
            indexes: Mutex::new(BTreeSet::new()),
        }
    }

    /// Names of the indexes built so far.
    pub async fn index_names(&self) -> Vec<String> {
        self.indexes.lock().await.iter().cloned().collect()
    }

    fn decode_matching<'a>(
        docs: impl Iterator<Item = (&'a String, &'a JsonValue)>,
        mut keep: impl FnMut(&CatalogEntry) -> bool,
    ) -> Vec<CatalogEntry> {
        docs.filter_map(|(id, doc)| CatalogEntry::decode_or_skip(id, doc.clone()))
            .filter(|entry| keep(entry))
            .collect()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn insert(&self, entry: &CatalogEntry) -> Result<SaveOutcome> {
        let doc = entry.to_document()?;
        let mut docs = self.docs.write().await;
        if docs.contains_key(&entry.file_id) {
            return Ok(SaveOutcome::Duplicate);
        }
        docs.insert(entry.file_id.clone(), doc);
        Ok(SaveOutcome::Inserted)
    }

    async fn get(&self, file_id: &str) -> Result<Option<CatalogEntry>> {
        let docs = self.docs.read().await;
        docs.get(file_id)
            .cloned()
            .map(CatalogEntry::from_document)
            .transpose()
    }

    async fn find(&self, filter: &EntryFilter, limit: u32) -> Result<Vec<CatalogEntry>> {
        let docs = self.docs.read().await;
        let mut found = Self::decode_matching(docs.iter(), |e| filter.matches(e));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn count(&self, filter: &EntryFilter) -> Result<u64> {
        let docs = self.docs.read().await;
        if filter.is_empty() {
            return Ok(docs.len() as u64);
        }
        let found = Self::decode_matching(docs.iter(), |e| filter.matches(e));
        Ok(found.len() as u64)
    }

    async fn delete_many(&self, filter: &EntryFilter) -> Result<u64> {
        let mut docs = self.docs.write().await;
        let doomed: Vec<String> = Self::decode_matching(docs.iter(), |e| filter.matches(e))
            .into_iter()
            .map(|e| e.file_id)
            .collect();
        for id in &doomed {
            docs.remove(id);
        }
        Ok(doomed.len() as u64)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<CatalogEntry>> {
        let matcher = query.name_matcher()?;
        trace!(pattern = ?query.pattern(), "Compiled in-memory search pattern");

        let docs = self.docs.read().await;
        let hits = Self::decode_matching(docs.iter(), |e| matcher.matches_entry(query, e));
        Ok(hits
            .into_iter()
            .skip(query.offset as usize)
            .take(query.max_results as usize)
            .collect())
    }

    async fn search_count(&self, query: &SearchQuery) -> Result<u64> {
        let matcher = query.name_matcher()?;
        let docs = self.docs.read().await;
        let hits = Self::decode_matching(docs.iter(), |e| matcher.matches_entry(query, e));
        Ok(hits.len() as u64)
    }

    async fn ensure_indexes(&self) -> IndexReport {
        let mut built = self.indexes.lock().await;
        let mut report = IndexReport::default();

        for spec in CATALOG_INDEXES.iter() {
            let name = spec.name_for(&self.collection);
            let outcome = if spec.kind == IndexKind::Trigram {
                IndexOutcome::Skipped("not supported by the in-memory store".to_string())
            } else if built.insert(name.clone()) {
                IndexOutcome::Created
            } else {
                IndexOutcome::AlreadyExists
            };
            report.push(name, spec.kind, outcome);
        }

        debug!(
            subsystem = "catalog",
            component = "memory_store",
            op = "ensure_indexes",
            created = report.created_count(),
            "In-memory index sync complete"
        );
        report
    }
}
