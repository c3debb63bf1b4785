//! Top-level error type of a load.

use crate::database::DatabaseError;
use crate::reader::ReaderError;
use crate::resolver::ResolverError;
use crate::writer::IntegrityError;

/// Any failure that aborts a load or a lookup
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error(transparent)]
    Resolver(#[from] ResolverError),

    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column {column} in table {table}")]
    UnknownColumn { table: String, column: String },
}

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;
