//! SQL rendering for registry tables
//!
//! Statements are portable between DuckDB and PostgreSQL. The only dialect
//! difference is that foreign keys are emitted for PostgreSQL alone.

use crate::tables::{ColumnSpec, ColumnType, TableSpec};

/// Target SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    DuckDB,
    Postgres,
}

impl Dialect {
    /// Whether FOREIGN KEY constraints are rendered
    pub fn supports_foreign_keys(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }
}

fn column_type_sql(ty: &ColumnType) -> String {
    match ty {
        ColumnType::Varchar(len) => format!("VARCHAR({})", len),
        ColumnType::Integer => "INTEGER".to_string(),
        ColumnType::Code(codes) => {
            let len = codes.iter().map(|c| c.len()).max().unwrap_or(1);
            format!("VARCHAR({})", len)
        }
    }
}

fn column_sql(column: &ColumnSpec) -> String {
    let mut sql = format!("{} {}", column.name, column_type_sql(&column.ty));
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    if let ColumnType::Code(codes) = column.ty {
        let values: Vec<String> = codes.iter().map(|c| format!("'{}'", c)).collect();
        sql.push_str(&format!(" CHECK ({} IN ({}))", column.name, values.join(", ")));
    }
    sql
}

/// `CREATE TABLE IF NOT EXISTS` statement for `table`.
pub fn create_table_sql(table: &TableSpec, dialect: Dialect) -> String {
    let mut parts: Vec<String> = table.columns.iter().map(column_sql).collect();

    let primary_key = table.primary_key();
    if !primary_key.is_empty() {
        parts.push(format!("PRIMARY KEY ({})", primary_key.join(", ")));
    }

    if dialect.supports_foreign_keys() {
        for column in &table.columns {
            if let Some(fk) = column.references {
                parts.push(format!(
                    "FOREIGN KEY ({}) REFERENCES {} ({})",
                    column.name, fk.table, fk.column
                ));
            }
        }
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        table.name,
        parts.join(",\n    ")
    )
}

/// `CREATE INDEX IF NOT EXISTS` statements for indexed columns.
pub fn create_indexes_sql(table: &TableSpec) -> Vec<String> {
    table
        .columns
        .iter()
        .filter(|c| c.indexed)
        .map(|c| {
            format!(
                "CREATE INDEX IF NOT EXISTS ix_{table}_{column} ON {table} ({column})",
                table = table.name,
                column = c.name
            )
        })
        .collect()
}

/// Placeholder for parameter `n` cast to the type of `column`.
pub fn placeholder(column: &ColumnSpec, n: usize) -> String {
    if column.ty.is_integer() {
        format!("CAST(CAST(${} AS VARCHAR) AS INTEGER)", n)
    } else {
        format!("CAST(${} AS VARCHAR)", n)
    }
}

/// Multi-row `INSERT` for `rows` rows, with parameters numbered row by row.
///
/// With `skip_conflicts`, rows clashing with an existing primary key are
/// ignored.
pub fn insert_sql(table: &TableSpec, rows: usize, skip_conflicts: bool) -> String {
    let width = table.columns.len();
    let values: Vec<String> = (0..rows)
        .map(|r| {
            let row: Vec<String> = table
                .columns
                .iter()
                .enumerate()
                .map(|(c, column)| placeholder(column, r * width + c + 1))
                .collect();
            format!("({})", row.join(", "))
        })
        .collect();

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        table.name,
        table.column_names().join(", "),
        values.join(", ")
    );
    if skip_conflicts {
        let primary_key = table.primary_key();
        sql.push_str(&format!(" ON CONFLICT ({}) DO NOTHING", primary_key.join(", ")));
    }
    sql
}

pub fn delete_all_sql(table: &str) -> String {
    format!("DELETE FROM {}", table)
}

pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", table)
}
