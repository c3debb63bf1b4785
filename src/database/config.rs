//! Connection string handling
//!
//! Accepted forms:
//! - `postgres://...` or `postgresql://...`: PostgreSQL server
//! - `duckdb://:memory:` or `:memory:`: in-memory DuckDB
//! - `duckdb://<path>` or a bare path: DuckDB database file

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::info;

use super::{DatabaseBackend, DatabaseError, DatabaseResult};

/// Scheme prefix for DuckDB connection strings
pub const DUCKDB_SCHEME: &str = "duckdb://";

/// Scheme prefixes for PostgreSQL connection strings
pub const POSTGRES_SCHEMES: [&str; 2] = ["postgres://", "postgresql://"];

/// Path that selects an in-memory DuckDB database
pub const MEMORY_PATH: &str = ":memory:";

/// Where a connection string points to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// DuckDB database file
    DuckDBFile(PathBuf),
    /// In-memory DuckDB database
    DuckDBMemory,
    /// PostgreSQL connection string, passed through unchanged
    Postgres(String),
}

impl ConnectionTarget {
    /// Backend name for the target
    pub fn backend_name(&self) -> &'static str {
        match self {
            ConnectionTarget::DuckDBFile(_) | ConnectionTarget::DuckDBMemory => "duckdb",
            ConnectionTarget::Postgres(_) => "postgres",
        }
    }

    /// Open a connection to the target
    pub fn connect(&self) -> DatabaseResult<Box<dyn DatabaseBackend>> {
        match self {
            #[cfg(feature = "duckdb-backend")]
            ConnectionTarget::DuckDBFile(path) => {
                Ok(Box::new(super::DuckDBBackend::new(path)?))
            }
            #[cfg(feature = "duckdb-backend")]
            ConnectionTarget::DuckDBMemory => Ok(Box::new(super::DuckDBBackend::in_memory()?)),
            #[cfg(feature = "postgres-backend")]
            ConnectionTarget::Postgres(url) => Ok(Box::new(super::PostgresBackend::new(url)?)),
            #[allow(unreachable_patterns)]
            other => Err(DatabaseError::BackendNotEnabled(
                other.backend_name().to_string(),
            )),
        }
    }
}

impl FromStr for ConnectionTarget {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DatabaseError::InvalidConnectionString(
                "empty connection string".to_string(),
            ));
        }

        let lowered = s.to_lowercase();
        if POSTGRES_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
            return Ok(ConnectionTarget::Postgres(s.to_string()));
        }

        let path = if lowered.starts_with(DUCKDB_SCHEME) {
            &s[DUCKDB_SCHEME.len()..]
        } else if s.contains("://") {
            return Err(DatabaseError::InvalidConnectionString(format!(
                "unsupported scheme in '{}'. Use postgres://, postgresql://, duckdb:// or a file path.",
                s
            )));
        } else {
            s
        };

        match path {
            "" => Err(DatabaseError::InvalidConnectionString(format!(
                "missing database path in '{}'",
                s
            ))),
            MEMORY_PATH => Ok(ConnectionTarget::DuckDBMemory),
            path => Ok(ConnectionTarget::DuckDBFile(PathBuf::from(path))),
        }
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionTarget::DuckDBFile(path) => write!(f, "{}{}", DUCKDB_SCHEME, path.display()),
            ConnectionTarget::DuckDBMemory => write!(f, "{}{}", DUCKDB_SCHEME, MEMORY_PATH),
            ConnectionTarget::Postgres(url) => f.write_str(&mask_password(url)),
        }
    }
}

/// Replace the password of a `user:password@host` connection string
pub fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@')
        && let Some(colon_pos) = url[..at_pos].rfind(':')
        && !url[colon_pos + 1..].starts_with("//")
    {
        return format!("{}****{}", &url[..colon_pos + 1], &url[at_pos..]);
    }
    url.to_string()
}

/// Parse `connection_string` and open a backend for it
pub fn connect(connection_string: &str) -> DatabaseResult<Box<dyn DatabaseBackend>> {
    let target: ConnectionTarget = connection_string.parse()?;
    info!("Connecting to database {}...", target);
    target.connect()
}
