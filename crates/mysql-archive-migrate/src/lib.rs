//! # mysql-archive-migrate
//!
//! Target-side write adapter for migrating analytics archive data into
//! MySQL/MariaDB.
//!
//! This library mediates all writes from a migration process into the
//! destination database, with support for:
//!
//! - **Lazy provisioning** of archive tables from canonical DDL templates
//! - **Durable surrogate ids** from a per-table sequence that survives
//!   process restarts
//! - **Parameterized inserts and updates** with identifier validation
//! - **Dry-run mode** that exercises the full write path without mutating
//!   the target
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysql_archive_migrate::{Config, Result, TargetDb, TargetOverrides};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load("migration.yaml")?;
//!     let db = TargetDb::connect(&config, TargetOverrides::default()).await?;
//!
//!     db.create_archive_table_if_needed("archive_numeric_2024_01").await?;
//!     let id = db.allocate_archive_id("archive_numeric_2024_01").await?;
//!     println!("Allocated archive id {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod provision;
pub mod sequence;
pub mod target;

// Re-exports for convenient access
pub use config::{Config, TargetConfig, TargetOverrides, WriteMode};
pub use crate::core::{Row, SqlValue, TargetConnection};
pub use error::{MigrateError, Result};
pub use provision::{ArchiveKind, TemplateRegistry};
pub use sequence::SequenceAllocator;
pub use target::{ColumnInfo, MysqlConnection, SyntheticIds, TargetDb};
