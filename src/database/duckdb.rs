//! DuckDB database backend implementation
//!
//! Embedded backend used by default. Supports a file-based database and an
//! in-memory one for tests and throwaway loads.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{DatabaseBackend, DatabaseError, DatabaseResult, Dialect};
use crate::Row;

/// DuckDB database backend
pub struct DuckDBBackend {
    /// DuckDB connection (wrapped in Mutex for thread safety)
    connection: Mutex<duckdb::Connection>,
}

impl DuckDBBackend {
    /// Open (or create) a file-based database
    pub fn new(db_path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let connection = duckdb::Connection::open(db_path.as_ref()).map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to open DuckDB: {}", e))
        })?;

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Create an in-memory database
    pub fn in_memory() -> DatabaseResult<Self> {
        let connection = duckdb::Connection::open_in_memory().map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to create in-memory DuckDB: {}", e))
        })?;

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> DatabaseResult<MutexGuard<'_, duckdb::Connection>> {
        self.connection
            .lock()
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Lock error: {}", e)))
    }
}

fn param_refs(params: &[Option<String>]) -> Vec<&dyn duckdb::ToSql> {
    params.iter().map(|p| p as &dyn duckdb::ToSql).collect()
}

impl DatabaseBackend for DuckDBBackend {
    fn backend_type(&self) -> &'static str {
        "duckdb"
    }

    fn dialect(&self) -> Dialect {
        Dialect::DuckDB
    }

    fn execute_batch(&self, sql: &str) -> DatabaseResult<()> {
        self.lock()?
            .execute_batch(sql)
            .map_err(|e| DatabaseError::QueryFailed(format!("Batch execute failed: {}", e)))
    }

    fn execute(&self, sql: &str, params: &[Option<String>]) -> DatabaseResult<u64> {
        let conn = self.lock()?;
        let refs = param_refs(params);
        conn.execute(sql, refs.as_slice())
            .map(|n| n as u64)
            .map_err(|e| DatabaseError::QueryFailed(format!("Execute failed: {}", e)))
    }

    fn query(&self, sql: &str, params: &[Option<String>]) -> DatabaseResult<Vec<Row>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;

        let refs = param_refs(params);
        // In DuckDB 1.4+, the column count is only known once the query ran
        let mut result_rows = stmt
            .query(refs.as_slice())
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;
        let column_count = result_rows.as_ref().map(|r| r.column_count()).unwrap_or(0);

        let mut rows = Vec::new();
        while let Some(row) = result_rows
            .next()
            .map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))?
        {
            let values = (0..column_count)
                .map(|i| row.get::<_, Option<String>>(i))
                .collect::<Result<Row, _>>()
                .map_err(|e| DatabaseError::QueryFailed(format!("Value read error: {}", e)))?;
            rows.push(values);
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_database() {
        let backend = DuckDBBackend::in_memory().unwrap();
        assert_eq!(backend.backend_type(), "duckdb");
    }

    #[test]
    fn test_execute_and_query_with_nulls() {
        let backend = DuckDBBackend::in_memory().unwrap();
        backend
            .execute_batch("CREATE TABLE t (a INTEGER, b VARCHAR(10))")
            .unwrap();
        let inserted = backend
            .execute(
                "INSERT INTO t VALUES (CAST(CAST($1 AS VARCHAR) AS INTEGER), CAST($2 AS VARCHAR)), \
                 (CAST(CAST($3 AS VARCHAR) AS INTEGER), CAST($4 AS VARCHAR))",
                &[Some("1".into()), None, Some("2".into()), Some("x".into())],
            )
            .unwrap();
        assert_eq!(inserted, 2);

        let rows = backend
            .query(
                "SELECT CAST(a AS VARCHAR), b FROM t WHERE a >= CAST(CAST($1 AS VARCHAR) AS INTEGER) ORDER BY a",
                &[Some("1".into())],
            )
            .unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Some("1".to_string()), None],
                vec![Some("2".to_string()), Some("x".to_string())],
            ]
        );
        assert_eq!(backend.count_rows("t").unwrap(), 2);
    }

    #[test]
    fn test_table_exists() {
        let backend = DuckDBBackend::in_memory().unwrap();
        assert!(!backend.table_exists("t").unwrap());
        backend.execute_batch("CREATE TABLE t (a INTEGER)").unwrap();
        assert!(backend.table_exists("t").unwrap());
    }

    #[test]
    fn test_rollback_discards_changes() {
        let backend = DuckDBBackend::in_memory().unwrap();
        backend.execute_batch("CREATE TABLE t (a INTEGER)").unwrap();
        backend.begin().unwrap();
        backend.execute_batch("INSERT INTO t VALUES (1)").unwrap();
        backend.rollback().unwrap();
        assert_eq!(backend.count_rows("t").unwrap(), 0);
    }
}
