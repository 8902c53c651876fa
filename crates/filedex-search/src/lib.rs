//! # filedex-search
//!
//! Ordered substring search and the catalog facade for filedex.
//!
//! This crate provides:
//! - [`SearchEngine`] and the [`SearchRequest`] builder
//! - [`SearchPage`] for offset-based paging
//! - [`Catalog`], the collaborator-facing API over any [`CatalogStore`]
//!
//! ## Example
//!
//! ```ignore
//! use filedex_search::{Catalog, FileType, SearchRequest};
//! use filedex_db::Database;
//!
//! let db = Database::connect(&CatalogConfig::from_env()?).await?;
//! let catalog = Catalog::from_store(db.store);
//! catalog.ensure_indexes().await;
//!
//! let hits = SearchRequest::new("the matrix")
//!     .with_file_type(FileType::Video)
//!     .with_limit(10)
//!     .execute(catalog.engine())
//!     .await?;
//! ```

pub mod catalog;
pub mod engine;

// Re-export core types
pub use filedex_core::*;

pub use catalog::{Catalog, DEFAULT_FIND_LIMIT};
pub use engine::{SearchEngine, SearchPage, SearchRequest};
