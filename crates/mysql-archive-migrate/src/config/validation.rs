//! Configuration validation.

use super::TargetConfig;
use crate::core::identifier::{validate_identifier, validate_prefix};
use crate::error::{MigrateError, Result};

/// Validate the target configuration.
pub fn validate(target: &TargetConfig) -> Result<()> {
    if target.host.is_empty() {
        return Err(MigrateError::Config("target.host is required".into()));
    }
    if target.database.is_empty() {
        return Err(MigrateError::Config("target.database is required".into()));
    }
    if target.user.is_empty() {
        return Err(MigrateError::Config("target.user is required".into()));
    }
    if target.adapter != "mysql" {
        return Err(MigrateError::Config(format!(
            "target.adapter must be 'mysql', got '{}'",
            target.adapter
        )));
    }

    // The prefix is concatenated into physical table names, so it has to be
    // identifier-safe on its own.
    if validate_prefix(&target.tables_prefix).is_err() {
        return Err(MigrateError::Config(format!(
            "target.tables_prefix is not identifier-safe: {:?}",
            target.tables_prefix
        )));
    }

    // The charset goes verbatim into the session's SET NAMES statement.
    if validate_identifier(&target.charset).is_err() {
        return Err(MigrateError::Config(format!(
            "target.charset is not a valid charset name: {:?}",
            target.charset
        )));
    }

    Ok(())
}
