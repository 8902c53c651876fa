//! # filedex-core
//!
//! Core types, traits, and abstractions for the filedex media catalog.
//!
//! This crate provides the catalog entry model, typed filters, search query
//! compilation, the [`CatalogStore`] storage trait, and an in-memory store
//! implementation that other filedex crates and tests build on.

pub mod config;
pub mod error;
pub mod filter;
pub mod indexes;
pub mod logging;
pub mod memory;
pub mod models;
pub mod search;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::CatalogConfig;
pub use error::{Error, Result};
pub use filter::EntryFilter;
pub use indexes::{IndexKind, IndexOutcome, IndexReport, IndexSpec, IndexStatus, CATALOG_INDEXES};
pub use memory::MemoryCatalogStore;
pub use models::*;
pub use search::{NameMatcher, SearchQuery, DEFAULT_MAX_RESULTS, MAX_QUERY_CHARS};
pub use traits::CatalogStore;
