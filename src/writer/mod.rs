//! Table creation, cleaning, batched population and dropping.

mod toposort;

use tracing::{debug, info};

use crate::database::{DatabaseBackend, schema};
use crate::error::{LoaderError, LoaderResult};
use crate::tables::{TableRegistry, TableSpec};
use crate::Row;

pub use toposort::{IntegrityError, sort_topologically};

/// Default number of rows per INSERT statement
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 1000;

/// Writes registry tables through a [`DatabaseBackend`].
///
/// The writer never opens or closes transactions; the caller owns the unit of
/// work.
pub struct DatabaseWriter<'a> {
    backend: &'a dyn DatabaseBackend,
    registry: &'a TableRegistry,
    batch_size: usize,
}

impl<'a> DatabaseWriter<'a> {
    pub fn new(backend: &'a dyn DatabaseBackend, registry: &'a TableRegistry) -> Self {
        Self {
            backend,
            registry,
            batch_size: DEFAULT_INSERT_BATCH_SIZE,
        }
    }

    /// Rows per INSERT statement (at least one)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn table(&self, name: &str) -> LoaderResult<&'a TableSpec> {
        self.registry
            .get(name)
            .ok_or_else(|| LoaderError::UnknownTable(name.to_string()))
    }

    /// Creates the missing tables among `names`, with their indexes.
    pub fn create_tables(&self, names: &[&str]) -> LoaderResult<()> {
        info!("Creating tables: {}", names.join(", "));
        let dialect = self.backend.dialect();

        for name in names {
            let table = self.table(name)?;
            self.backend
                .execute_batch(&schema::create_table_sql(table, dialect))?;
            for index in schema::create_indexes_sql(table) {
                self.backend.execute_batch(&index)?;
            }
        }
        Ok(())
    }

    /// Deletes every row of `names`, children before parents.
    pub fn clean_tables(&self, names: &[&str]) -> LoaderResult<()> {
        info!("Cleaning tables");

        for name in names.iter().rev() {
            let table = self.table(name)?;
            let count = self.backend.count_rows(table.name)?;
            if count > 0 {
                info!("Deleting {} rows from table {}", count, table.name);
                self.backend
                    .execute_batch(&schema::delete_all_sql(table.name))?;
            }
        }
        Ok(())
    }

    /// Drops `names` if they exist, children before parents.
    pub fn drop_tables(&self, names: &[&str]) -> LoaderResult<()> {
        if names.is_empty() {
            return Ok(());
        }
        info!("Dropping tables");

        for name in names.iter().rev() {
            let table = self.table(name)?;
            info!("Dropping table {}", table.name);
            self.backend
                .execute_batch(&schema::drop_table_sql(table.name))?;
        }
        Ok(())
    }

    /// Inserts `rows` into `name`, returning how many rows were inserted.
    ///
    /// Rows of a self-referencing table are buffered and sorted parents first
    /// before anything is inserted.
    pub fn populate_table<I, E>(&self, name: &str, rows: I) -> LoaderResult<u64>
    where
        I: IntoIterator<Item = Result<Row, E>>,
        E: Into<LoaderError>,
    {
        info!("Populating table {}", name);
        let table = self.table(name)?;

        let inserted = match table.self_reference() {
            Some(parent_index) => {
                let key_column = table.columns[parent_index]
                    .references
                    .map(|fk| fk.column)
                    .unwrap_or_default();
                let key_index = table
                    .columns
                    .iter()
                    .position(|c| c.name == key_column)
                    .ok_or_else(|| LoaderError::UnknownColumn {
                        table: table.name.to_string(),
                        column: key_column.to_string(),
                    })?;
                let rows = rows
                    .into_iter()
                    .collect::<Result<Vec<Row>, E>>()
                    .map_err(Into::<LoaderError>::into)?;
                debug!("Sorting {} rows of {} parents first", rows.len(), name);
                let sorted = sort_topologically(rows, key_index, parent_index)?;
                self.insert_in_batches(table, sorted.into_iter().map(Ok::<_, LoaderError>))?
            }
            None => self.insert_in_batches(table, rows)?,
        };

        info!("Inserted {} rows into table \"{}\"", inserted, name);
        Ok(inserted)
    }

    fn insert_in_batches<I, E>(&self, table: &TableSpec, rows: I) -> LoaderResult<u64>
    where
        I: IntoIterator<Item = Result<Row, E>>,
        E: Into<LoaderError>,
    {
        let mut batch: Vec<Row> = Vec::with_capacity(self.batch_size);
        let mut inserted = 0u64;

        for row in rows {
            batch.push(row.map_err(Into::<LoaderError>::into)?);
            if batch.len() >= self.batch_size {
                inserted += self.flush(table, &mut batch)?;
            }
        }
        if !batch.is_empty() {
            inserted += self.flush(table, &mut batch)?;
        }
        Ok(inserted)
    }

    fn flush(&self, table: &TableSpec, batch: &mut Vec<Row>) -> LoaderResult<u64> {
        let count = batch.len() as u64;
        self.backend.insert_rows(table, batch)?;
        batch.clear();
        Ok(count)
    }
}
