//! SQLSTATE classification for the outcomes the catalog treats as expected.

/// `unique_violation`: a duplicate primary key, or two sessions racing to
/// create the same catalog object.
pub const UNIQUE_VIOLATION: &str = "23505";
/// `duplicate_schema`
pub const DUPLICATE_SCHEMA: &str = "42P06";
/// `duplicate_table`, also raised for relations such as indexes.
pub const DUPLICATE_TABLE: &str = "42P07";
/// `duplicate_object`
pub const DUPLICATE_OBJECT: &str = "42710";
/// `undefined_object`, e.g. an operator class from a missing extension.
pub const UNDEFINED_OBJECT: &str = "42704";

/// SQLSTATE code of a server-reported error, if any.
pub fn sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

/// Returns true for errors meaning "the object you tried to create exists".
///
/// `CREATE ... IF NOT EXISTS` is not atomic against a concurrent creator; the
/// loser sees one of these codes instead of a notice.
pub fn is_already_exists(err: &sqlx::Error) -> bool {
    matches!(
        sqlstate(err).as_deref(),
        Some(UNIQUE_VIOLATION | DUPLICATE_SCHEMA | DUPLICATE_TABLE | DUPLICATE_OBJECT)
    )
}
