//! Archive table categorization and DDL templates.
//!
//! Destination archive tables come in exactly two shapes: numeric-valued and
//! blob-valued. The category is derived from the logical table name, and the
//! CREATE TABLE text for each category lives in a registry keyed by category.
//! Rendering substitutes a single table-name token into the template body, so
//! a provisioned table is structurally identical to the canonical template
//! and differs only in name.

use std::collections::HashMap;

use crate::core::identifier::quote_ident;
use crate::error::{MigrateError, Result};

/// Surrogate key column of every archive table; sequences bootstrap from its
/// maximum when a table already holds rows.
pub const ARCHIVE_ID_COLUMN: &str = "idarchive";

/// Token replaced by the quoted physical table name when rendering a template.
pub const TABLE_TOKEN: &str = "{table}";

const NUMERIC_TEMPLATE: &str = "\
CREATE TABLE {table} (
  `idarchive` INTEGER UNSIGNED NOT NULL,
  `name` VARCHAR(190) NOT NULL,
  `idsite` INTEGER UNSIGNED NULL,
  `date1` DATE NULL,
  `date2` DATE NULL,
  `period` TINYINT UNSIGNED NULL,
  `ts_archived` DATETIME NULL,
  `value` DOUBLE NULL,
  PRIMARY KEY (`idarchive`, `name`),
  INDEX `index_idsite_dates_periods` (`idsite`, `date1`, `date2`, `period`, `ts_archived`),
  INDEX `index_period_archived` (`period`, `ts_archived`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";

const BLOB_TEMPLATE: &str = "\
CREATE TABLE {table} (
  `idarchive` INTEGER UNSIGNED NOT NULL,
  `name` VARCHAR(190) NOT NULL,
  `idsite` INTEGER UNSIGNED NULL,
  `date1` DATE NULL,
  `date2` DATE NULL,
  `period` TINYINT UNSIGNED NULL,
  `ts_archived` DATETIME NULL,
  `value` MEDIUMBLOB NULL,
  PRIMARY KEY (`idarchive`, `name`),
  INDEX `index_period_archived` (`period`, `ts_archived`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";

/// Archive table category.
///
/// Categorization is purely name-based so it yields the same answer every
/// time it runs: a logical name containing "blob" is blob-valued, everything
/// else is numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// Numeric aggregate rows (`value DOUBLE`).
    Numeric,
    /// Serialized report rows (`value MEDIUMBLOB`).
    Blob,
}

impl ArchiveKind {
    /// Categorize a logical (unprefixed) table name.
    pub fn of_table(logical_name: &str) -> Self {
        if logical_name.contains("blob") {
            ArchiveKind::Blob
        } else {
            ArchiveKind::Numeric
        }
    }

    /// Registry key for this category.
    pub fn key(self) -> &'static str {
        match self {
            ArchiveKind::Numeric => "archive_numeric",
            ArchiveKind::Blob => "archive_blob",
        }
    }
}

/// Registry of CREATE TABLE templates keyed by archive category.
///
/// Ships with the canonical archive templates; a caller may replace a
/// category's template as long as the replacement carries the table-name
/// token.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<ArchiveKind, String>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateRegistry {
    /// Registry with the canonical numeric and blob archive templates.
    pub fn builtin() -> Self {
        let mut templates = HashMap::new();
        templates.insert(ArchiveKind::Numeric, NUMERIC_TEMPLATE.to_string());
        templates.insert(ArchiveKind::Blob, BLOB_TEMPLATE.to_string());
        Self { templates }
    }

    /// Replace the template for a category.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::Config` when the template body does not contain
    /// the table-name token.
    pub fn set_template(&mut self, kind: ArchiveKind, ddl: impl Into<String>) -> Result<()> {
        let ddl = ddl.into();
        if !ddl.contains(TABLE_TOKEN) {
            return Err(MigrateError::Config(format!(
                "template for {} does not contain the {} token",
                kind.key(),
                TABLE_TOKEN
            )));
        }
        self.templates.insert(kind, ddl);
        Ok(())
    }

    /// The raw template body for a category.
    pub fn template(&self, kind: ArchiveKind) -> &str {
        // Both categories are present from construction and set_template
        // only replaces entries.
        &self.templates[&kind]
    }

    /// Render the CREATE TABLE statement for a physical table name.
    ///
    /// The name is validated and quoted, then substituted for the token in a
    /// single step; nothing else in the template body changes.
    pub fn render(&self, kind: ArchiveKind, physical_table: &str) -> Result<String> {
        let quoted = quote_ident(physical_table)?;
        Ok(self.template(kind).replace(TABLE_TOKEN, &quoted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_of_table() {
        assert_eq!(
            ArchiveKind::of_table("archive_numeric_2024_01"),
            ArchiveKind::Numeric
        );
        assert_eq!(
            ArchiveKind::of_table("archive_blob_2024_01"),
            ArchiveKind::Blob
        );
        assert_eq!(ArchiveKind::of_table("archive_numeric"), ArchiveKind::Numeric);
        assert_eq!(ArchiveKind::of_table("archive_blob"), ArchiveKind::Blob);
    }

    #[test]
    fn test_kind_keys() {
        assert_eq!(ArchiveKind::Numeric.key(), "archive_numeric");
        assert_eq!(ArchiveKind::Blob.key(), "archive_blob");
    }

    #[test]
    fn test_render_substitutes_only_the_name() {
        let registry = TemplateRegistry::builtin();
        let ddl = registry
            .render(ArchiveKind::Numeric, "mig_archive_numeric_2024_01")
            .unwrap();

        assert!(ddl.starts_with("CREATE TABLE `mig_archive_numeric_2024_01` ("));
        assert!(!ddl.contains(TABLE_TOKEN));

        // Everything except the name token matches the canonical template.
        let expected = NUMERIC_TEMPLATE.replace(TABLE_TOKEN, "`mig_archive_numeric_2024_01`");
        assert_eq!(ddl, expected);
    }

    #[test]
    fn test_blob_and_numeric_templates_differ_in_value_type() {
        let registry = TemplateRegistry::builtin();
        let numeric = registry.render(ArchiveKind::Numeric, "t_num").unwrap();
        let blob = registry.render(ArchiveKind::Blob, "t_blob").unwrap();

        assert!(numeric.contains("`value` DOUBLE NULL"));
        assert!(blob.contains("`value` MEDIUMBLOB NULL"));
        assert!(numeric.contains("index_idsite_dates_periods"));
        assert!(!blob.contains("index_idsite_dates_periods"));
    }

    #[test]
    fn test_render_rejects_unsafe_name() {
        let registry = TemplateRegistry::builtin();
        assert!(registry
            .render(ArchiveKind::Numeric, "t; DROP TABLE x")
            .is_err());
    }

    #[test]
    fn test_set_template_requires_token() {
        let mut registry = TemplateRegistry::builtin();
        let err = registry.set_template(ArchiveKind::Blob, "CREATE TABLE fixed_name (id INT)");
        assert!(err.is_err());

        registry
            .set_template(ArchiveKind::Blob, "CREATE TABLE {table} (id INT)")
            .unwrap();
        let ddl = registry.render(ArchiveKind::Blob, "mig_custom").unwrap();
        assert_eq!(ddl, "CREATE TABLE `mig_custom` (id INT)");
    }
}
