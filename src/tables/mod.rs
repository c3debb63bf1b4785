//! Static description of the eDNE "Básico" tables.
//!
//! The registry is built once by [`TableRegistry::dne`] and then passed by
//! reference to the resolver, the writer and the unified-table builder.

mod codes;
mod registry;
mod table_set;

pub use codes::{CepRangeType, LocalitySituation, LocalityType, SectionSide};
pub use registry::{TableRegistry, UNIFIED_TABLE};
pub use table_set::TableSet;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Variable length text with a maximum length
    Varchar(u16),
    /// 32-bit integer
    Integer,
    /// Short text restricted to a closed set of codes
    Code(&'static [&'static str]),
}

impl ColumnType {
    /// Whether values must be cast to an integer on insert.
    pub fn is_integer(&self) -> bool {
        matches!(self, ColumnType::Integer)
    }
}

/// Target of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
}

/// Column definition inside a [`TableSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub indexed: bool,
    pub references: Option<ForeignKey>,
}

impl ColumnSpec {
    fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            nullable: true,
            primary_key: false,
            unique: false,
            indexed: false,
            references: None,
        }
    }

    pub fn varchar(name: &'static str, len: u16) -> Self {
        Self::new(name, ColumnType::Varchar(len))
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn code(name: &'static str, codes: &'static [&'static str]) -> Self {
        Self::new(name, ColumnType::Code(codes))
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as part of the primary key (implies NOT NULL).
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some(ForeignKey { table, column });
        self
    }
}

/// One table of the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: Vec<ColumnSpec>,
    /// Glob of the source files, relative to the data directory. `None` for
    /// tables that are not loaded from files.
    pub file_glob: Option<String>,
    /// Whether the table is needed to build the unified lookup table.
    pub required_for_lookup: bool,
    /// Whether this is the unified lookup table itself.
    pub unified: bool,
}

impl TableSpec {
    pub(crate) fn new(name: &'static str, columns: Vec<ColumnSpec>) -> Self {
        Self {
            name,
            columns,
            file_glob: Some(format!("{}.TXT", name.to_uppercase())),
            required_for_lookup: false,
            unified: false,
        }
    }

    pub(crate) fn with_file_glob(mut self, glob: &str) -> Self {
        self.file_glob = Some(glob.to_string());
        self
    }

    pub(crate) fn unified(mut self) -> Self {
        self.file_glob = None;
        self.unified = true;
        self
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn primary_key(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name)
            .collect()
    }

    /// Tables this table references, excluding itself.
    pub fn parent_tables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .filter_map(|c| c.references)
            .map(|fk| fk.table)
            .filter(move |t| *t != self.name)
    }

    /// Index of the column holding a foreign key to this same table, if any.
    ///
    /// Rows of such a table must be inserted parents first.
    pub fn self_reference(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.references.is_some_and(|fk| fk.table == self.name))
    }
}
