//! Structured logging field names shared by every filedex crate.
//!
//! Events never carry document contents; ids, counts, and timings only.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Storage failure surfaced to a caller |
//! | WARN  | Recoverable issue (index build failed, catalog still usable) |
//! | INFO  | Lifecycle events (connect, index sync), bulk deletions |
//! | DEBUG | Per-operation outcomes (inserted, duplicate, result counts) |
//! | TRACE | Compiled patterns, per-entry iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "catalog", "search", "database", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "connector", "indexes", "memory_store", "pg_store"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "save", "find_one", "search", "ensure_indexes"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// File identifier being operated on.
pub const FILE_ID: &str = "file_id";

/// Collection (table) the operation ran against.
pub const COLLECTION: &str = "collection";

/// Index name for index lifecycle events.
pub const INDEX_NAME: &str = "index_name";

/// Search query text.
pub const QUERY: &str = "query";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of entries returned by a find or search.
pub const RESULT_COUNT: &str = "result_count";

/// Number of entries removed by a bulk delete.
pub const DELETED_COUNT: &str = "deleted_count";

/// Number of connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
