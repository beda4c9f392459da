//! Target database write adapter.
//!
//! [`TargetDb`] is the single entry point the migration driver writes through:
//! it prefixes logical table names, provisions archive tables on first use,
//! allocates durable archive ids, and generates parameterized INSERT/UPDATE
//! statements. Construction fixes the write mode; in dry run every statement
//! is still built and validated, then logged instead of executed.

mod mysql;
mod synthetic;

#[cfg(test)]
pub(crate) mod fake;

pub use mysql::MysqlConnection;
pub use synthetic::SyntheticIds;

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::config::{Config, TargetConfig, TargetOverrides, WriteMode};
use crate::core::conn::TargetConnection;
use crate::core::identifier::{quote_ident, validate_identifier};
use crate::core::value::{Row, SqlValue};
use crate::error::{MigrateError, Result};
use crate::provision::{ArchiveKind, TemplateRegistry, ARCHIVE_ID_COLUMN};
use crate::sequence::SequenceAllocator;

/// Column metadata as reported by `SHOW COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column type as printed by the server, e.g. `int(10) unsigned`.
    pub column_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Index membership (`PRI`, `UNI`, `MUL`, or empty).
    pub key: String,
    /// Default value, when one is defined.
    pub default: Option<String>,
    /// Extra attributes, e.g. `auto_increment`.
    pub extra: String,
}

/// Write adapter over the target MySQL database.
///
/// Holds one exclusive session plus the DDL template registry and the
/// sequence allocator. All table arguments are logical names; the configured
/// prefix is applied internally, and every identifier that ends up in a
/// statement is validated first.
pub struct TargetDb {
    conn: Arc<dyn TargetConnection>,
    config: TargetConfig,
    templates: TemplateRegistry,
    sequences: SequenceAllocator,
    synthetic: SyntheticIds,
}

impl TargetDb {
    /// Connect to the target and build the adapter.
    ///
    /// `overrides` are applied on top of the loaded configuration before
    /// validation, so a caller can flip to dry run or point at a different
    /// host without editing the file.
    pub async fn connect(config: &Config, overrides: TargetOverrides) -> Result<Self> {
        let target = config.target.clone().with_overrides(overrides);
        target.validate()?;
        let conn = MysqlConnection::connect(&target).await?;
        Self::with_connection(target, Arc::new(conn))
    }

    /// Build the adapter over an already-established session.
    pub fn with_connection(config: TargetConfig, conn: Arc<dyn TargetConnection>) -> Result<Self> {
        config.validate()?;
        let sequences = SequenceAllocator::new(conn.clone(), &config.tables_prefix)?;
        if config.mode.is_dry_run() {
            info!("Dry run: mutating statements will be built and logged, not executed");
        }
        Ok(Self {
            conn,
            config,
            templates: TemplateRegistry::builtin(),
            sequences,
            synthetic: SyntheticIds::new(),
        })
    }

    /// Replace the DDL template registry.
    #[must_use]
    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }

    /// Replace the synthetic id source used in dry run.
    #[must_use]
    pub fn with_synthetic_ids(mut self, ids: SyntheticIds) -> Self {
        self.synthetic = ids;
        self
    }

    /// The underlying session.
    pub fn connection(&self) -> &Arc<dyn TargetConnection> {
        &self.conn
    }

    /// The validated target configuration.
    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    /// The write mode fixed at construction.
    pub fn mode(&self) -> WriteMode {
        self.config.mode
    }

    /// Whether mutating statements are suppressed.
    pub fn is_dry_run(&self) -> bool {
        self.config.mode.is_dry_run()
    }

    /// The DDL template registry.
    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Physical name of a logical table under the configured prefix.
    pub fn prefix_table(&self, table: &str) -> String {
        format!("{}{}", self.config.tables_prefix, table)
    }

    /// Open a transaction on the session.
    ///
    /// Runs in dry run too: suppressed writes leave nothing to commit, and
    /// keeping the boundaries live preserves the caller's control flow.
    pub async fn begin_transaction(&self) -> Result<()> {
        self.conn.begin_transaction().await
    }

    /// Commit the open transaction.
    pub async fn commit(&self) -> Result<()> {
        self.conn.commit().await
    }

    /// Roll back the open transaction.
    pub async fn roll_back(&self) -> Result<()> {
        self.conn.roll_back().await
    }

    /// Fetch the first row of a query, if any.
    pub async fn fetch_row(&self, sql: &str, params: &[SqlValue<'_>]) -> Result<Option<Row<'static>>> {
        self.conn.fetch_first(sql, params).await
    }

    /// Fetch all rows of a query.
    pub async fn fetch_all(&self, sql: &str, params: &[SqlValue<'_>]) -> Result<Vec<Row<'static>>> {
        self.conn.fetch_all(sql, params).await
    }

    /// Whether the prefixed table exists in the target schema.
    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        self.physical_table_exists(&self.prefix_table(table)).await
    }

    // SHOW statements cannot be prepared, so the name is validated and then
    // inlined as a literal; the identifier allow-list cannot produce a quote.
    // An underscore in the name keeps its LIKE single-character meaning.
    async fn physical_table_exists(&self, physical: &str) -> Result<bool> {
        validate_identifier(physical)?;
        let sql = format!("SHOW TABLES LIKE '{}'", physical);
        let rows = self.conn.fetch_all(&sql, &[]).await?;
        Ok(!rows.is_empty())
    }

    /// Column metadata of the prefixed table, in definition order.
    pub async fn table_columns(&self, table: &str) -> Result<IndexMap<String, ColumnInfo>> {
        let physical = self.prefix_table(table);
        let sql = format!("SHOW COLUMNS FROM {}", quote_ident(&physical)?);
        let rows = self.conn.fetch_all(&sql, &[]).await?;

        let mut columns = IndexMap::with_capacity(rows.len());
        for row in rows {
            let field = match text_cell(row.get("Field")) {
                Some(field) => field.trim().to_string(),
                None => continue,
            };
            let info = ColumnInfo {
                column_type: text_cell(row.get("Type")).unwrap_or_default(),
                nullable: text_cell(row.get("Null"))
                    .is_some_and(|v| v.eq_ignore_ascii_case("YES")),
                key: text_cell(row.get("Key")).unwrap_or_default(),
                default: text_cell(row.get("Default")),
                extra: text_cell(row.get("Extra")).unwrap_or_default(),
            };
            columns.insert(field, info);
        }
        Ok(columns)
    }

    /// Create the archive table for a logical name if it does not exist.
    ///
    /// The category (numeric or blob) is derived from the name and selects
    /// the DDL template. The statement is rendered before the dry-run branch,
    /// so an unsafe name or broken template fails in either mode.
    pub async fn create_archive_table_if_needed(&self, table: &str) -> Result<()> {
        if self.table_exists(table).await? {
            return Ok(());
        }

        let kind = ArchiveKind::of_table(table);
        let physical = self.prefix_table(table);
        let ddl = self.templates.render(kind, &physical)?;

        if self.is_dry_run() {
            debug!("Dry run: would create {} table {}", kind.key(), physical);
            return Ok(());
        }

        self.conn.execute(&ddl, &[]).await?;
        debug!("Created {} table {}", kind.key(), physical);
        Ok(())
    }

    /// Allocate the next archive id for a logical archive table.
    ///
    /// Backed by a per-table row in the sequence side table. A sequence seen
    /// for the first time starts at the maximum id already present in the
    /// archive table, so re-running a migration against a populated target
    /// continues above the existing rows. In dry run the id comes from the
    /// synthetic source and nothing is written.
    pub async fn allocate_archive_id(&self, table: &str) -> Result<i64> {
        let physical = self.prefix_table(table);

        if self.is_dry_run() {
            let id = self.synthetic.next_id();
            debug!("Dry run: synthetic archive id {} for {}", id, physical);
            return Ok(id);
        }

        self.sequences.ensure_table().await?;
        if !self.sequences.exists(&physical).await? {
            let start = self.sequence_start(&physical).await?;
            self.sequences.create(&physical, start).await?;
        }
        self.sequences.next_id(&physical).await
    }

    /// Starting value for a new sequence: the highest id already present in
    /// the archive table, or zero when the table is absent or empty.
    async fn sequence_start(&self, physical: &str) -> Result<u64> {
        if !self.physical_table_exists(physical).await? {
            return Ok(0);
        }
        let sql = format!(
            "SELECT COALESCE(MAX({}), 0) AS max_id FROM {}",
            quote_ident(ARCHIVE_ID_COLUMN)?,
            quote_ident(physical)?
        );
        let row = self.conn.fetch_first(&sql, &[]).await?;
        let max = row
            .and_then(|r| r.get("max_id").and_then(SqlValue::as_i64))
            .unwrap_or(0);
        match u64::try_from(max) {
            Ok(start) => Ok(start),
            Err(_) => {
                warn!("Negative max id {} in {}; sequence starts at 0", max, physical);
                Ok(0)
            }
        }
    }

    /// Insert one row into the prefixed table.
    ///
    /// Columns and bind order follow the row's insertion order. Returns the
    /// engine-generated id, or zero when the statement produced none (archive
    /// tables have no auto-increment column). In dry run the statement is
    /// built, logged and dropped, and a synthetic id comes back.
    pub async fn insert(&self, table: &str, row: &Row<'_>) -> Result<i64> {
        if row.is_empty() {
            return Err(MigrateError::Config(format!(
                "insert into {} requires at least one column",
                table
            )));
        }

        let physical = self.prefix_table(table);
        let columns = quoted_column_list(row.keys())?;
        let placeholders = vec!["?"; row.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&physical)?,
            columns,
            placeholders
        );

        if self.is_dry_run() {
            let id = self.synthetic.next_id();
            debug!("Dry run: {}", sql);
            return Ok(id);
        }

        let params: Vec<SqlValue<'_>> = row.values().cloned().collect();
        self.conn.execute(&sql, &params).await?;

        let id = self
            .conn
            .last_insert_id()
            .await?
            .and_then(|id| i64::try_from(id).ok())
            .unwrap_or(0);
        Ok(id)
    }

    /// Update rows of the prefixed table, returning the affected-row count.
    ///
    /// An empty `set` is a no-op. An empty `filter` is refused: an unfiltered
    /// UPDATE would rewrite the whole table, which no migration path wants.
    /// Binds are the set values followed by the filter values. Filter
    /// conditions are conjoined equalities.
    pub async fn update<'v>(&self, table: &str, set: &Row<'v>, filter: &Row<'v>) -> Result<u64> {
        if set.is_empty() {
            return Ok(0);
        }
        if filter.is_empty() {
            return Err(MigrateError::Config(format!(
                "update of {} requires a non-empty filter",
                table
            )));
        }

        let physical = self.prefix_table(table);
        let assignments = column_clause(set.keys(), ", ")?;
        let conditions = column_clause(filter.keys(), " AND ")?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            quote_ident(&physical)?,
            assignments,
            conditions
        );

        if self.is_dry_run() {
            debug!("Dry run: {}", sql);
            return Ok(0);
        }

        let params: Vec<SqlValue<'_>> = set.values().chain(filter.values()).cloned().collect();
        self.conn.execute(&sql, &params).await
    }
}

/// Quote column names into a comma-separated list.
fn quoted_column_list<'a>(names: impl Iterator<Item = &'a String>) -> Result<String> {
    let quoted: Vec<String> = names.map(|n| quote_ident(n)).collect::<Result<_>>()?;
    Ok(quoted.join(", "))
}

/// Quote column names into `` `col` = ? `` fragments joined by `sep`.
fn column_clause<'a>(names: impl Iterator<Item = &'a String>, sep: &str) -> Result<String> {
    let parts: Vec<String> = names
        .map(|n| Ok(format!("{} = ?", quote_ident(n)?)))
        .collect::<Result<_>>()?;
    Ok(parts.join(sep))
}

/// Text content of a fetched cell; NULL and non-text cells yield `None`.
///
/// The text protocol delivers string cells as bytes, so both shapes decode.
fn text_cell(value: Option<&SqlValue<'_>>) -> Option<String> {
    match value {
        Some(SqlValue::Text(s)) => Some(s.to_string()),
        Some(SqlValue::Bytes(b)) => Some(String::from_utf8_lossy(b).into_owned()),
        _ => None,
    }
}
