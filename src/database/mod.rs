//! Database backend abstraction
//!
//! This module provides the single seam between the loader and the store:
//! - DuckDB: embedded database, file based or in-memory (default)
//! - PostgreSQL: server database (feature `postgres-backend`)
//!
//! Every value crosses the seam as a nullable string. SQL rendered by
//! [`schema`] casts parameters to the column type, so one statement text
//! works on both backends.

#[cfg(feature = "duckdb-backend")]
pub mod duckdb;

#[cfg(feature = "postgres-backend")]
pub mod postgres;

pub mod config;
pub mod schema;

#[cfg(feature = "duckdb-backend")]
pub use self::duckdb::DuckDBBackend;

#[cfg(feature = "postgres-backend")]
pub use self::postgres::PostgresBackend;

pub use config::{ConnectionTarget, connect};
pub use schema::Dialect;

use crate::Row;
use crate::tables::TableSpec;

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// The connection string is not understood
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// The backend was not compiled in
    #[error("Database backend '{0}' is not enabled in this build")]
    BackendNotEnabled(String),
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database backend trait
///
/// Implementations hold one connection. Statements run on that connection in
/// the order they are issued, inside whatever transaction is open.
pub trait DatabaseBackend {
    /// Backend name for logging
    fn backend_type(&self) -> &'static str;

    /// SQL dialect used to render DDL
    fn dialect(&self) -> Dialect;

    /// Execute one or more statements without parameters
    fn execute_batch(&self, sql: &str) -> DatabaseResult<()>;

    /// Execute a parameterized statement, returning the affected row count
    ///
    /// Placeholders are `$1`, `$2`, ...
    fn execute(&self, sql: &str, params: &[Option<String>]) -> DatabaseResult<u64>;

    /// Run a parameterized query, returning every row as nullable strings
    ///
    /// Selected columns must be castable to text.
    fn query(&self, sql: &str, params: &[Option<String>]) -> DatabaseResult<Vec<Row>>;

    /// Start a transaction
    fn begin(&self) -> DatabaseResult<()> {
        self.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DatabaseError::TransactionFailed(format!("Begin failed: {}", e)))
    }

    /// Commit the open transaction
    fn commit(&self) -> DatabaseResult<()> {
        self.execute_batch("COMMIT")
            .map_err(|e| DatabaseError::TransactionFailed(format!("Commit failed: {}", e)))
    }

    /// Roll back the open transaction
    fn rollback(&self) -> DatabaseResult<()> {
        self.execute_batch("ROLLBACK")
            .map_err(|e| DatabaseError::TransactionFailed(format!("Rollback failed: {}", e)))
    }

    /// Check whether `table` exists in the current schema
    fn table_exists(&self, table: &str) -> DatabaseResult<bool> {
        let rows = self.query(
            "SELECT CAST(COUNT(*) AS VARCHAR) FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = CAST($1 AS VARCHAR)",
            &[Some(table.to_string())],
        )?;
        Ok(scalar_u64(&rows)? > 0)
    }

    /// Number of rows in `table`
    fn count_rows(&self, table: &str) -> DatabaseResult<u64> {
        let rows = self.query(
            &format!("SELECT CAST(COUNT(*) AS VARCHAR) FROM {}", table),
            &[],
        )?;
        scalar_u64(&rows)
    }

    /// Insert `rows` into `table` with a single statement
    ///
    /// Rows shorter than the column list are padded with nulls and longer
    /// rows are truncated.
    fn insert_rows(&self, table: &TableSpec, rows: &[Row]) -> DatabaseResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let sql = schema::insert_sql(table, rows.len(), false);
        self.execute(&sql, &flatten_params(table.columns.len(), rows))
    }
}

/// Lays out `rows` as one flat parameter list of `width` values per row.
pub fn flatten_params(width: usize, rows: &[Row]) -> Vec<Option<String>> {
    let mut params = Vec::with_capacity(width * rows.len());
    for row in rows {
        params.extend(
            row.iter()
                .cloned()
                .chain(std::iter::repeat(None))
                .take(width),
        );
    }
    params
}

/// Reads the first column of the first row as an unsigned integer.
pub(crate) fn scalar_u64(rows: &[Row]) -> DatabaseResult<u64> {
    let value = rows
        .first()
        .and_then(|row| row.first())
        .and_then(|v| v.as_deref())
        .ok_or_else(|| DatabaseError::QueryFailed("Expected a single value".to_string()))?;
    value
        .trim()
        .parse()
        .map_err(|e| DatabaseError::QueryFailed(format!("Invalid count '{}': {}", value, e)))
}
