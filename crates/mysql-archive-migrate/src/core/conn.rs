//! Database capability contract for the target session.
//!
//! The write adapter depends on this trait rather than a concrete driver:
//! the shipped implementation wraps a single `mysql_async` connection, and
//! tests substitute a scripted fake. Implementations hand out one logical
//! session; `last_insert_id` and the transaction statements refer to that
//! session's state, so a pooled implementation would be incorrect.

use async_trait::async_trait;

use crate::error::Result;

use super::value::{Row, SqlValue};

/// A single exclusive session against the target database.
///
/// All statements use positional `?` placeholders; `params` are bound in
/// order. Errors are surfaced as-is - implementations do not retry.
#[async_trait]
pub trait TargetConnection: Send + Sync {
    /// Execute a statement, returning the affected-row count.
    async fn execute(&self, sql: &str, params: &[SqlValue<'_>]) -> Result<u64>;

    /// Fetch all rows of a query as ordered column-to-value mappings.
    async fn fetch_all(&self, sql: &str, params: &[SqlValue<'_>]) -> Result<Vec<Row<'static>>>;

    /// Fetch the first row of a query, if any.
    ///
    /// The default implementation fetches everything and keeps the first row;
    /// drivers override this with a real single-row fetch.
    async fn fetch_first(&self, sql: &str, params: &[SqlValue<'_>]) -> Result<Option<Row<'static>>> {
        let rows = self.fetch_all(sql, params).await?;
        Ok(rows.into_iter().next())
    }

    /// The last auto-generated identifier produced on this session, if any.
    async fn last_insert_id(&self) -> Result<Option<u64>>;

    /// Open a transaction.
    ///
    /// Precondition: no transaction is currently open on this session.
    /// Nested transactions are not supported and not detected.
    async fn begin_transaction(&self) -> Result<()>;

    /// Commit the open transaction.
    async fn commit(&self) -> Result<()>;

    /// Roll back the open transaction.
    async fn roll_back(&self) -> Result<()>;
}
