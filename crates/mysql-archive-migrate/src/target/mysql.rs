//! MySQL session over a single exclusive connection.
//!
//! Implements [`TargetConnection`] with one `mysql_async::Conn` behind an
//! async mutex. The adapter is a single logical writer, so there is no pool:
//! `last_insert_id` and the transaction statements refer to this session
//! alone, which a pooled handle could not guarantee. Statements without bind
//! parameters go through the text protocol because DDL and `SHOW` statements
//! cannot be prepared.

use std::borrow::Cow;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use mysql_async::consts::{ColumnFlags, ColumnType};
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::TargetConfig;
use crate::core::conn::TargetConnection;
use crate::core::value::{Row, SqlValue};
use crate::error::{MigrateError, Result};

/// A single exclusive MySQL/MariaDB session.
pub struct MysqlConnection {
    conn: Mutex<Conn>,
}

impl MysqlConnection {
    /// Connect to the target described by `config` and probe the session.
    ///
    /// The session charset is applied via `SET NAMES` at init. A `SELECT 1`
    /// probe runs before the connection is handed out, so bad credentials or
    /// an unknown database surface immediately as a connection error with the
    /// server code preserved.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let opts: Opts = OptsBuilder::default()
            .ip_or_hostname(&config.host)
            .tcp_port(config.port)
            .db_name(Some(&config.database))
            .user(Some(&config.user))
            .pass(Some(&config.password))
            .init(vec![format!("SET NAMES {}", config.charset)])
            .into();

        let mut conn = Conn::new(opts).await.map_err(|e| {
            MigrateError::connection(e, format!("connecting to {}", config.endpoint()))
        })?;

        conn.query_drop("SELECT 1").await.map_err(|e| {
            MigrateError::connection(e, format!("probing {}", config.endpoint()))
        })?;

        info!(
            "Connected to MySQL target: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl TargetConnection for MysqlConnection {
    async fn execute(&self, sql: &str, params: &[SqlValue<'_>]) -> Result<u64> {
        let mut conn = self.conn.lock().await;
        if params.is_empty() {
            conn.query_drop(sql)
                .await
                .map_err(|e| MigrateError::execution(e, sql_context(sql)))?;
        } else {
            let values: Vec<mysql_async::Value> = params.iter().map(sql_value_to_mysql).collect();
            conn.exec_drop(sql, values)
                .await
                .map_err(|e| MigrateError::execution(e, sql_context(sql)))?;
        }
        Ok(conn.affected_rows())
    }

    async fn fetch_all(&self, sql: &str, params: &[SqlValue<'_>]) -> Result<Vec<Row<'static>>> {
        let mut conn = self.conn.lock().await;
        let mysql_rows: Vec<mysql_async::Row> = if params.is_empty() {
            conn.query(sql).await
        } else {
            let values: Vec<mysql_async::Value> = params.iter().map(sql_value_to_mysql).collect();
            conn.exec(sql, values).await
        }
        .map_err(|e| MigrateError::execution(e, sql_context(sql)))?;

        Ok(mysql_rows.into_iter().map(to_row).collect())
    }

    async fn fetch_first(&self, sql: &str, params: &[SqlValue<'_>]) -> Result<Option<Row<'static>>> {
        let mut conn = self.conn.lock().await;
        let mysql_row: Option<mysql_async::Row> = if params.is_empty() {
            conn.query_first(sql).await
        } else {
            let values: Vec<mysql_async::Value> = params.iter().map(sql_value_to_mysql).collect();
            conn.exec_first(sql, values).await
        }
        .map_err(|e| MigrateError::execution(e, sql_context(sql)))?;

        Ok(mysql_row.map(to_row))
    }

    async fn last_insert_id(&self) -> Result<Option<u64>> {
        let conn = self.conn.lock().await;
        Ok(conn.last_insert_id())
    }

    // Transaction boundaries are plain statements rather than the driver's
    // guard object: they are caller-scoped and the session is never shared,
    // so there is no state worth tracking here.

    async fn begin_transaction(&self) -> Result<()> {
        self.execute("START TRANSACTION", &[]).await.map(drop)
    }

    async fn commit(&self) -> Result<()> {
        self.execute("COMMIT", &[]).await.map(drop)
    }

    async fn roll_back(&self) -> Result<()> {
        self.execute("ROLLBACK", &[]).await.map(drop)
    }
}

/// Convert a driver row into the crate's ordered column-to-value mapping.
fn to_row(mysql_row: mysql_async::Row) -> Row<'static> {
    let columns = mysql_row.columns();
    let mut row = Row::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        let value: mysql_async::Value = mysql_row.get(idx).unwrap_or(mysql_async::Value::NULL);
        row.insert(
            column.name_str().to_string(),
            from_mysql_value(value, column.column_type(), column.flags()),
        );
    }
    row
}

/// Convert [`SqlValue`] to a driver value for binding.
fn sql_value_to_mysql(value: &SqlValue<'_>) -> mysql_async::Value {
    match value {
        SqlValue::Null => mysql_async::Value::NULL,
        SqlValue::Bool(b) => mysql_async::Value::from(*b),
        SqlValue::I32(i) => mysql_async::Value::from(*i),
        SqlValue::I64(i) => mysql_async::Value::from(*i),
        SqlValue::U64(u) => mysql_async::Value::from(*u),
        SqlValue::F64(f) => mysql_async::Value::from(*f),
        SqlValue::Text(s) => mysql_async::Value::from(s.as_ref()),
        SqlValue::Bytes(b) => mysql_async::Value::from(b.as_ref()),
        SqlValue::Date(d) => {
            mysql_async::Value::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0)
        }
        SqlValue::DateTime(dt) => mysql_async::Value::Date(
            dt.year() as u16,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            dt.nanosecond() / 1_000,
        ),
    }
}

/// Convert a driver value into [`SqlValue`].
///
/// Column metadata matters twice: the text protocol returns every cell as
/// raw bytes which the column type disambiguates, and the wire `Date` carries
/// both DATE and DATETIME payloads.
fn from_mysql_value(
    value: mysql_async::Value,
    column_type: ColumnType,
    flags: ColumnFlags,
) -> SqlValue<'static> {
    use mysql_async::Value;

    match value {
        Value::NULL => SqlValue::Null,
        Value::Int(i) => SqlValue::I64(i),
        Value::UInt(u) => SqlValue::U64(u),
        Value::Float(f) => SqlValue::F64(f64::from(f)),
        Value::Double(d) => SqlValue::F64(d),
        Value::Bytes(bytes) => bytes_to_sql(bytes, column_type, flags),
        Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day));
            let datetime = date.and_then(|d| {
                d.and_hms_micro_opt(u32::from(hour), u32::from(min), u32::from(sec), micro)
            });
            match (date, datetime) {
                (Some(date), _) if column_type == ColumnType::MYSQL_TYPE_DATE => {
                    SqlValue::Date(date)
                }
                (_, Some(dt)) => SqlValue::DateTime(dt),
                // Zero dates and other out-of-range payloads keep their text form.
                _ => SqlValue::Text(Cow::Owned(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    year, month, day, hour, min, sec
                ))),
            }
        }
        Value::Time(negative, days, hours, mins, secs, micros) => {
            // Archive rows carry no TIME columns; render one as text if it
            // shows up through the read passthrough.
            let total_hours = u32::from(hours) + days * 24;
            let sign = if negative { "-" } else { "" };
            SqlValue::Text(Cow::Owned(format!(
                "{}{:02}:{:02}:{:02}.{:06}",
                sign, total_hours, mins, secs, micros
            )))
        }
    }
}

/// Interpret a text-protocol byte payload using the column type.
fn bytes_to_sql(bytes: Vec<u8>, column_type: ColumnType, flags: ColumnFlags) -> SqlValue<'static> {
    if is_binary(column_type, flags) {
        return SqlValue::Bytes(Cow::Owned(bytes));
    }

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => return SqlValue::Bytes(Cow::Owned(err.into_bytes())),
    };

    match column_type {
        ColumnType::MYSQL_TYPE_TINY
        | ColumnType::MYSQL_TYPE_SHORT
        | ColumnType::MYSQL_TYPE_LONG
        | ColumnType::MYSQL_TYPE_LONGLONG
        | ColumnType::MYSQL_TYPE_INT24
        | ColumnType::MYSQL_TYPE_YEAR => match text.parse::<i64>() {
            Ok(i) => SqlValue::I64(i),
            Err(_) => match text.parse::<u64>() {
                Ok(u) => SqlValue::U64(u),
                Err(_) => SqlValue::Text(Cow::Owned(text)),
            },
        },
        ColumnType::MYSQL_TYPE_FLOAT
        | ColumnType::MYSQL_TYPE_DOUBLE
        | ColumnType::MYSQL_TYPE_DECIMAL
        | ColumnType::MYSQL_TYPE_NEWDECIMAL => text
            .parse::<f64>()
            .map(SqlValue::F64)
            .unwrap_or(SqlValue::Text(Cow::Owned(text))),
        ColumnType::MYSQL_TYPE_DATE => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map(SqlValue::Date)
            .unwrap_or(SqlValue::Text(Cow::Owned(text))),
        ColumnType::MYSQL_TYPE_DATETIME | ColumnType::MYSQL_TYPE_TIMESTAMP => {
            NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f")
                .map(SqlValue::DateTime)
                .unwrap_or(SqlValue::Text(Cow::Owned(text)))
        }
        _ => SqlValue::Text(Cow::Owned(text)),
    }
}

/// Whether a byte payload is genuinely binary rather than text.
///
/// MySQL ships both over the same wire types; the binary flag on a blob or
/// string column separates `MEDIUMBLOB` report payloads from `VARCHAR`.
fn is_binary(column_type: ColumnType, flags: ColumnFlags) -> bool {
    flags.contains(ColumnFlags::BINARY_FLAG)
        && matches!(
            column_type,
            ColumnType::MYSQL_TYPE_TINY_BLOB
                | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
                | ColumnType::MYSQL_TYPE_LONG_BLOB
                | ColumnType::MYSQL_TYPE_BLOB
                | ColumnType::MYSQL_TYPE_STRING
                | ColumnType::MYSQL_TYPE_VAR_STRING
                | ColumnType::MYSQL_TYPE_VARCHAR
        )
}

/// Short statement preview for error context.
fn sql_context(sql: &str) -> String {
    let preview: String = sql.chars().take(72).collect();
    if preview.len() < sql.len() {
        format!("{}...", preview)
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_to_mysql_scalars() {
        assert_eq!(
            sql_value_to_mysql(&SqlValue::Null),
            mysql_async::Value::NULL
        );
        assert_eq!(
            sql_value_to_mysql(&SqlValue::I64(-7)),
            mysql_async::Value::Int(-7)
        );
        assert_eq!(
            sql_value_to_mysql(&SqlValue::U64(7)),
            mysql_async::Value::UInt(7)
        );
        assert_eq!(
            sql_value_to_mysql(&SqlValue::F64(1.5)),
            mysql_async::Value::Double(1.5)
        );
        assert_eq!(
            sql_value_to_mysql(&SqlValue::text_borrowed("nb_visits")),
            mysql_async::Value::Bytes(b"nb_visits".to_vec())
        );
        assert_eq!(
            sql_value_to_mysql(&SqlValue::bytes_borrowed(&[0x1f, 0x8b])),
            mysql_async::Value::Bytes(vec![0x1f, 0x8b])
        );
    }

    #[test]
    fn test_sql_value_to_mysql_temporal() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(
            sql_value_to_mysql(&SqlValue::Date(date)),
            mysql_async::Value::Date(2024, 1, 15, 0, 0, 0, 0)
        );

        let dt = date.and_hms_opt(10, 30, 5).unwrap();
        assert_eq!(
            sql_value_to_mysql(&SqlValue::DateTime(dt)),
            mysql_async::Value::Date(2024, 1, 15, 10, 30, 5, 0)
        );
    }

    #[test]
    fn test_bytes_parse_by_column_type() {
        let none = ColumnFlags::empty();
        assert_eq!(
            bytes_to_sql(b"123".to_vec(), ColumnType::MYSQL_TYPE_LONGLONG, none),
            SqlValue::I64(123)
        );
        assert_eq!(
            bytes_to_sql(
                b"18446744073709551615".to_vec(),
                ColumnType::MYSQL_TYPE_LONGLONG,
                none
            ),
            SqlValue::U64(u64::MAX)
        );
        assert_eq!(
            bytes_to_sql(b"1.5".to_vec(), ColumnType::MYSQL_TYPE_DOUBLE, none),
            SqlValue::F64(1.5)
        );
        assert_eq!(
            bytes_to_sql(b"nb_visits".to_vec(), ColumnType::MYSQL_TYPE_VAR_STRING, none),
            SqlValue::text_owned("nb_visits".to_string())
        );
    }

    #[test]
    fn test_bytes_parse_temporal_columns() {
        let none = ColumnFlags::empty();
        assert_eq!(
            bytes_to_sql(b"2024-01-15".to_vec(), ColumnType::MYSQL_TYPE_DATE, none),
            SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );

        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            bytes_to_sql(
                b"2024-01-15 10:30:00".to_vec(),
                ColumnType::MYSQL_TYPE_DATETIME,
                none
            ),
            SqlValue::DateTime(expected)
        );

        // Zero dates have no chrono representation; the text survives.
        assert_eq!(
            bytes_to_sql(b"0000-00-00".to_vec(), ColumnType::MYSQL_TYPE_DATE, none),
            SqlValue::text_owned("0000-00-00".to_string())
        );
    }

    #[test]
    fn test_binary_flagged_blob_stays_bytes() {
        let payload = vec![0x1f, 0x8b, 0x08, 0x00];
        assert_eq!(
            bytes_to_sql(
                payload.clone(),
                ColumnType::MYSQL_TYPE_MEDIUM_BLOB,
                ColumnFlags::BINARY_FLAG
            ),
            SqlValue::bytes_owned(payload)
        );

        // Unflagged text columns decode even when the type is blob-like
        // (TEXT columns report blob types without the binary flag).
        assert_eq!(
            bytes_to_sql(
                b"serialized report".to_vec(),
                ColumnType::MYSQL_TYPE_BLOB,
                ColumnFlags::empty()
            ),
            SqlValue::text_owned("serialized report".to_string())
        );
    }

    #[test]
    fn test_from_mysql_value_date_vs_datetime() {
        let none = ColumnFlags::empty();
        assert_eq!(
            from_mysql_value(
                mysql_async::Value::Date(2024, 1, 15, 0, 0, 0, 0),
                ColumnType::MYSQL_TYPE_DATE,
                none
            ),
            SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );

        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 5)
            .unwrap();
        assert_eq!(
            from_mysql_value(
                mysql_async::Value::Date(2024, 1, 15, 10, 30, 5, 0),
                ColumnType::MYSQL_TYPE_DATETIME,
                none
            ),
            SqlValue::DateTime(expected)
        );
    }

    #[test]
    fn test_sql_context_truncates_long_statements() {
        let short = "SELECT 1";
        assert_eq!(sql_context(short), short);

        let long = format!("INSERT INTO t VALUES ({})", "x".repeat(200));
        let context = sql_context(&long);
        assert!(context.ends_with("..."));
        assert!(context.len() < long.len());
    }
}
