//! Error types for the target write adapter.

use thiserror::Error;

/// Main error type for adapter operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, unsafe identifiers, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cannot establish or authenticate the target connection
    #[error("Cannot connect to target database: {message}\n  Context: {context}")]
    Connection {
        message: String,
        context: String,
        #[source]
        source: mysql_async::Error,
    },

    /// SQL execution failure (DDL, insert, update, query); propagated uncaught
    #[error("Target database error: {context}: {source}")]
    Execution {
        context: String,
        #[source]
        source: mysql_async::Error,
    },

    /// Failure to create or read the sequence record for a table
    #[error("Sequence error for {sequence}: {message}")]
    Sequence { sequence: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl MigrateError {
    /// Create a Connection error with context about what was being connected to
    pub fn connection(source: mysql_async::Error, context: impl Into<String>) -> Self {
        MigrateError::Connection {
            message: source.to_string(),
            context: context.into(),
            source,
        }
    }

    /// Create an Execution error with context about the failed statement
    pub fn execution(source: mysql_async::Error, context: impl Into<String>) -> Self {
        MigrateError::Execution {
            context: context.into(),
            source,
        }
    }

    /// Create a Sequence error for a named sequence
    pub fn sequence(sequence: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Sequence {
            sequence: sequence.into(),
            message: message.into(),
        }
    }

    /// Server-side error code from the wrapped driver error, when there is one.
    /// Connection and execution failures keep the MySQL error code reachable
    /// so callers can distinguish e.g. access-denied from unknown-database.
    pub fn server_code(&self) -> Option<u16> {
        let source = match self {
            MigrateError::Connection { source, .. } => source,
            MigrateError::Execution { source, .. } => source,
            _ => return None,
        };
        match source {
            mysql_async::Error::Server(err) => Some(err.code),
            _ => None,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn driver_error() -> mysql_async::Error {
        mysql_async::Error::Other("connection reset".into())
    }

    #[test]
    fn test_helper_constructors() {
        let err =
            MigrateError::connection(driver_error(), "connecting to localhost:3306/analytics");
        assert!(matches!(err, MigrateError::Connection { .. }));
        assert!(err.to_string().contains("localhost:3306/analytics"));

        let err = MigrateError::execution(driver_error(), "INSERT INTO `mig_archive_numeric`");
        assert!(matches!(err, MigrateError::Execution { .. }));
        assert!(err.to_string().contains("INSERT INTO `mig_archive_numeric`"));

        let err = MigrateError::sequence("mig_archive_numeric", "no sequence row");
        assert_eq!(
            err.to_string(),
            "Sequence error for mig_archive_numeric: no sequence row"
        );
    }

    #[test]
    fn test_server_code_without_server_source() {
        let err = MigrateError::execution(driver_error(), "SELECT 1");
        assert_eq!(err.server_code(), None);
        assert_eq!(MigrateError::Config("bad".to_string()).server_code(), None);
    }

    #[test]
    fn test_format_detailed_includes_cause_chain() {
        let err = MigrateError::execution(driver_error(), "SELECT 1");
        let detailed = err.format_detailed();

        assert!(detailed.starts_with("Error: Target database error: SELECT 1"));
        assert!(detailed.contains("Caused by:"));
        assert!(detailed.contains("connection reset"));
    }
}
