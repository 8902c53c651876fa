//! Search query compilation.
//!
//! A free-text query is split on whitespace into terms. Each term is escaped
//! so it matches literally, and the terms are joined with `.*`, producing a
//! pattern that requires the terms to appear in the given order with any
//! characters (including none) between them. Matching against `file_name` is
//! case-insensitive.
//!
//! The pattern only uses escaped literals and `.*`, so the same string is
//! valid for the Rust `regex` crate and for PostgreSQL's `~*` operator.
//!
//! ```
//! use filedex_core::SearchQuery;
//!
//! let query = SearchQuery::parse("the matrix");
//! let matcher = query.name_matcher().unwrap();
//! assert!(matcher.is_match(Some("The.Matrix.1999.1080p")));
//! assert!(!SearchQuery::parse("matrix the").name_matcher().unwrap().is_match(Some("The.Matrix.1999.1080p")));
//! ```

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};
use crate::models::{CatalogEntry, FileType};

/// Default page size for searches and finds.
pub const DEFAULT_MAX_RESULTS: u32 = 50;

/// Longest accepted query, in characters of term text.
///
/// Well under what the in-process matcher can compile at
/// [`MATCHER_SIZE_LIMIT`], so both stores accept and reject the same queries.
pub const MAX_QUERY_CHARS: usize = 1024;

/// Compiled-size ceiling for the in-process matcher.
const MATCHER_SIZE_LIMIT: usize = 1 << 20;

/// A parsed search over the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<String>,
    pattern: Option<String>,
    /// Exact-match constraint on `file_type`, conjoined with the name match.
    pub file_type: Option<FileType>,
    /// Number of matches to skip.
    pub offset: u32,
    /// Maximum number of matches to return after skipping.
    pub max_results: u32,
}

impl SearchQuery {
    /// Parse free text into an ordered, literal term list.
    pub fn parse(text: &str) -> Self {
        let terms: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let pattern = build_pattern(&terms);
        Self {
            terms,
            pattern,
            file_type: None,
            offset: 0,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_file_type(mut self, file_type: Option<FileType>) -> Self {
        self.file_type = file_type;
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// The whitespace-separated terms, case preserved.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// The ordered gap-tolerant pattern, or `None` when the query had no terms.
    ///
    /// A query without terms places no constraint on `file_name` at all, so
    /// it matches entries that have no name too.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Returns true if the query constrains nothing but (maybe) the file type.
    pub fn is_unconstrained(&self) -> bool {
        self.pattern.is_none()
    }

    /// Reject queries longer than [`MAX_QUERY_CHARS`].
    ///
    /// Every store calls this before running a query.
    pub fn validate(&self) -> Result<()> {
        let len: usize = self.terms.iter().map(|t| t.chars().count()).sum();
        if len > MAX_QUERY_CHARS {
            return Err(Error::InvalidInput(format!(
                "search query is {} characters, the limit is {}",
                len, MAX_QUERY_CHARS
            )));
        }
        Ok(())
    }

    /// Compile the name pattern for in-process matching.
    pub fn name_matcher(&self) -> Result<NameMatcher> {
        self.validate()?;
        let regex = match &self.pattern {
            None => None,
            Some(pattern) => Some(
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .dot_matches_new_line(true)
                    .size_limit(MATCHER_SIZE_LIMIT)
                    .build()?,
            ),
        };
        Ok(NameMatcher { regex })
    }
}

/// In-process evaluator for a [`SearchQuery`]'s name condition.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    regex: Option<Regex>,
}

impl NameMatcher {
    /// Test a (possibly absent) file name.
    pub fn is_match(&self, file_name: Option<&str>) -> bool {
        match (&self.regex, file_name) {
            (None, _) => true,
            (Some(re), Some(name)) => re.is_match(name),
            (Some(_), None) => false,
        }
    }

    /// Test an entry against both the name and the type condition of `query`.
    pub fn matches_entry(&self, query: &SearchQuery, entry: &CatalogEntry) -> bool {
        if let Some(ft) = query.file_type {
            if entry.file_type != Some(ft) {
                return false;
            }
        }
        self.is_match(entry.file_name.as_deref())
    }
}

fn build_pattern(terms: &[String]) -> Option<String> {
    if terms.is_empty() {
        return None;
    }
    let escaped: Vec<String> = terms.iter().map(|t| regex::escape(t)).collect();
    Some(escaped.join(".*"))
}
