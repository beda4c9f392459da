//! Centralized identifier validation and quoting for SQL injection prevention.
//!
//! SQL identifiers (table names, column names) cannot be passed as parameters
//! in prepared statements - only data values can be parameterized. Every
//! identifier that ends up in statement text therefore goes through an
//! explicit allow-list check here before it is quoted. Archive table and
//! column names come from a fixed schema-derived set; anything outside the
//! pattern is rejected rather than escaped.

use crate::error::{MigrateError, Result};

/// Maximum identifier length (MySQL limit).
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Validate an identifier against the allow-list pattern.
///
/// Accepts non-empty names of at most 64 bytes consisting only of ASCII
/// alphanumerics, `_` and `$`.
///
/// # Errors
///
/// Returns `MigrateError::Config` for invalid identifiers with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "SECURITY: Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '$'))
    {
        return Err(MigrateError::Config(format!(
            "SECURITY: Identifier contains disallowed character {:?} (possible injection attempt): {:?}",
            bad, name
        )));
    }

    Ok(())
}

/// Validate a table name prefix.
///
/// A prefix is a leading fragment of an identifier, so an empty string is
/// allowed; everything else follows the identifier allow-list.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Ok(());
    }
    validate_identifier(prefix)
}

/// Quote a MySQL identifier using backticks.
///
/// Validates the identifier before quoting and escapes backticks by doubling
/// them.
///
/// # Examples
///
/// ```
/// use mysql_archive_migrate::core::identifier::quote_ident;
///
/// assert_eq!(quote_ident("archive_numeric_2024_01").unwrap(), "`archive_numeric_2024_01`");
/// assert!(quote_ident("name; DROP TABLE x").is_err());
/// ```
pub fn quote_ident(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}
