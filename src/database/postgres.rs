//! PostgreSQL database backend implementation
//!
//! Wraps an async `tokio-postgres` client in a private current-thread
//! runtime so callers see the same blocking interface as DuckDB.

use tokio::runtime::Runtime;
use tokio_postgres::types::ToSql;

use super::{DatabaseBackend, DatabaseError, DatabaseResult, Dialect};
use crate::Row;

/// PostgreSQL database backend
pub struct PostgresBackend {
    /// Runtime driving the client and its connection task
    runtime: Runtime,
    client: tokio_postgres::Client,
}

impl PostgresBackend {
    /// Connect to the server at `connection_string`
    pub fn new(connection_string: &str) -> DatabaseResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                DatabaseError::ConnectionFailed(format!("Failed to start runtime: {}", e))
            })?;

        let (client, connection) = runtime
            .block_on(tokio_postgres::connect(
                connection_string,
                tokio_postgres::NoTls,
            ))
            .map_err(|e| {
                DatabaseError::ConnectionFailed(format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        // Polled whenever a query blocks on the runtime
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self { runtime, client })
    }
}

fn param_refs(params: &[Option<String>]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

impl DatabaseBackend for PostgresBackend {
    fn backend_type(&self) -> &'static str {
        "postgres"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute_batch(&self, sql: &str) -> DatabaseResult<()> {
        self.runtime
            .block_on(self.client.batch_execute(sql))
            .map_err(|e| DatabaseError::QueryFailed(format!("Batch execute failed: {}", e)))
    }

    fn execute(&self, sql: &str, params: &[Option<String>]) -> DatabaseResult<u64> {
        let refs = param_refs(params);
        self.runtime
            .block_on(self.client.execute(sql, &refs))
            .map_err(|e| DatabaseError::QueryFailed(format!("Execute failed: {}", e)))
    }

    fn query(&self, sql: &str, params: &[Option<String>]) -> DatabaseResult<Vec<Row>> {
        let refs = param_refs(params);
        let rows = self
            .runtime
            .block_on(self.client.query(sql, &refs))
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;

        rows.iter()
            .map(|row| {
                (0..row.len())
                    .map(|i| row.try_get::<_, Option<String>>(i))
                    .collect::<Result<Row, _>>()
                    .map_err(|e| {
                        DatabaseError::QueryFailed(format!("Value read error: {}", e))
                    })
            })
            .collect()
    }
}
