//! Durable per-table sequence allocation.
//!
//! Surrogate ids for migrated archive rows come from a named-counter side
//! table in the target database rather than engine auto-increment: freshly
//! provisioned archive tables have no identity column, and a counter row
//! survives process restarts, so a re-run can never hand out an id a killed
//! run already used. One row per prefixed archive table name.
//!
//! The increment uses the MySQL `LAST_INSERT_ID(expr)` idiom, which bumps the
//! counter and publishes the new value to the session in a single statement.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::core::conn::TargetConnection;
use crate::core::identifier::{quote_ident, validate_identifier};
use crate::core::value::SqlValue;
use crate::error::{MigrateError, Result};

/// Logical name of the sequence side table, before prefixing.
pub const SEQUENCE_TABLE: &str = "sequence";

/// Named-counter allocator backed by the `<prefix>sequence` table.
pub struct SequenceAllocator {
    conn: Arc<dyn TargetConnection>,
    table: String,
    table_ready: OnceCell<()>,
}

impl SequenceAllocator {
    /// Create an allocator writing to `<tables_prefix>sequence`.
    pub fn new(conn: Arc<dyn TargetConnection>, tables_prefix: &str) -> Result<Self> {
        let table = format!("{}{}", tables_prefix, SEQUENCE_TABLE);
        validate_identifier(&table)?;
        Ok(Self {
            conn,
            table,
            table_ready: OnceCell::new(),
        })
    }

    /// Physical name of the side table.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Create the side table if it does not exist yet.
    ///
    /// Runs at most one statement per allocator; later calls are free.
    pub async fn ensure_table(&self) -> Result<()> {
        self.table_ready
            .get_or_try_init(|| async {
                let sql = format!(
                    "CREATE TABLE IF NOT EXISTS {} (\n  \
                       `name` VARCHAR(120) NOT NULL,\n  \
                       `value` BIGINT UNSIGNED NOT NULL,\n  \
                       PRIMARY KEY (`name`)\n\
                     ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
                    quote_ident(&self.table)?
                );
                self.conn.execute(&sql, &[]).await?;
                Ok::<(), MigrateError>(())
            })
            .await?;
        Ok(())
    }

    /// Whether a counter row exists for `name`.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        let sql = format!(
            "SELECT `value` FROM {} WHERE `name` = ?",
            quote_ident(&self.table)?
        );
        let row = self
            .conn
            .fetch_first(&sql, &[SqlValue::text_borrowed(name)])
            .await
            .map_err(|e| {
                MigrateError::sequence(name, format!("failed to read sequence row: {}", e))
            })?;
        Ok(row.is_some())
    }

    /// Create the counter row for `name` with the given starting value.
    ///
    /// The first id handed out afterwards is `initial + 1`.
    pub async fn create(&self, name: &str, initial: u64) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (`name`, `value`) VALUES (?, ?)",
            quote_ident(&self.table)?
        );
        self.conn
            .execute(
                &sql,
                &[SqlValue::text_borrowed(name), SqlValue::U64(initial)],
            )
            .await
            .map_err(|e| {
                MigrateError::sequence(name, format!("failed to create sequence row: {}", e))
            })?;
        debug!("Created sequence {} starting at {}", name, initial);
        Ok(())
    }

    /// Atomically increment the counter for `name` and return the new value.
    ///
    /// The incremented value is durable as soon as the statement commits
    /// (immediately under autocommit, or with the caller's transaction).
    pub async fn next_id(&self, name: &str) -> Result<i64> {
        let sql = format!(
            "UPDATE {} SET `value` = LAST_INSERT_ID(`value` + 1) WHERE `name` = ?",
            quote_ident(&self.table)?
        );
        let affected = self
            .conn
            .execute(&sql, &[SqlValue::text_borrowed(name)])
            .await?;
        if affected != 1 {
            return Err(MigrateError::sequence(
                name,
                "no sequence row; create it before allocating",
            ));
        }

        let id = self.conn.last_insert_id().await?.ok_or_else(|| {
            MigrateError::sequence(name, "engine reported no generated id after increment")
        })?;
        i64::try_from(id)
            .map_err(|_| MigrateError::sequence(name, "sequence value exceeds i64 range"))
    }

    /// Current counter value for `name`, if the row exists.
    pub async fn current_id(&self, name: &str) -> Result<Option<i64>> {
        let sql = format!(
            "SELECT `value` FROM {} WHERE `name` = ?",
            quote_ident(&self.table)?
        );
        let row = self
            .conn
            .fetch_first(&sql, &[SqlValue::text_borrowed(name)])
            .await?;
        Ok(row.and_then(|r| r.get("value").and_then(|v| v.as_i64())))
    }
}
