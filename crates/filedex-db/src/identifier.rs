//! Identifier validation for the schema and table a collection lives in.
//!
//! Both names are interpolated into SQL (always double-quoted), so they are
//! restricted to a conservative character set before any statement is built.

use filedex_core::{Error, Result};

/// PostgreSQL identifier length limit (NAMEDATALEN - 1).
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Validate a schema or collection name.
///
/// Names must:
/// - Not be empty
/// - Not exceed 63 characters
/// - Contain only ASCII letters, digits, and underscores
/// - Not start with a digit
/// - Not use the `pg_` prefix reserved for system schemas
///
/// `kind` names the thing being validated in error messages.
///
/// # Examples
///
/// ```
/// use filedex_db::validate_identifier;
///
/// assert!(validate_identifier("collection", "Telegram_files").is_ok());
/// assert!(validate_identifier("database", "Cluster0").is_ok());
/// assert!(validate_identifier("collection", "1files").is_err());
/// assert!(validate_identifier("collection", "files; DROP").is_err());
/// ```
pub fn validate_identifier(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Config(format!("{} name cannot be empty", kind)));
    }

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(Error::Config(format!(
            "{} name exceeds {} character limit: {} characters",
            kind,
            MAX_IDENTIFIER_LEN,
            name.len()
        )));
    }

    if let Some(first) = name.chars().next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::Config(format!(
                "{} name must start with a letter or underscore, found: '{}'",
                kind, first
            )));
        }
    }

    if let Some(bad) = name
        .chars()
        .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '_')
    {
        return Err(Error::Config(format!(
            "{} name contains invalid character: '{}'. Only alphanumeric and underscore allowed",
            kind, bad
        )));
    }

    if name.to_lowercase().starts_with("pg_") {
        return Err(Error::Config(format!(
            "{} name '{}' uses the reserved pg_ prefix",
            kind, name
        )));
    }

    Ok(())
}

/// Double-quote a validated identifier.
pub(crate) fn quote(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Truncate a derived identifier to the PostgreSQL length limit.
///
/// Inputs are validated ASCII, so byte truncation never splits a character.
pub(crate) fn truncate(name: String) -> String {
    if name.len() <= MAX_IDENTIFIER_LEN {
        name
    } else {
        name[..MAX_IDENTIFIER_LEN].to_string()
    }
}
