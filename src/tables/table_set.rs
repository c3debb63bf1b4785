use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::TableRegistry;

/// Which tables are loaded and which are kept once the unified table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableSet {
    /// Keep only the unified lookup table
    #[default]
    UnifiedCepOnly,
    /// Keep the tables needed for CEP lookups
    CepTables,
    /// Load and keep every table
    #[serde(rename = "all")]
    AllTables,
}

impl TableSet {
    /// Tables to create and fill, in dependency order.
    pub fn to_populate(&self, registry: &TableRegistry) -> Vec<&'static str> {
        match self {
            TableSet::AllTables => registry.names(),
            TableSet::UnifiedCepOnly | TableSet::CepTables => registry.lookup_tables(),
        }
    }

    /// Tables to drop after the unified table is built, in dependency order.
    pub fn to_drop(&self, registry: &TableRegistry) -> Vec<&'static str> {
        match self {
            TableSet::UnifiedCepOnly => registry
                .tables()
                .iter()
                .filter(|t| !t.unified)
                .map(|t| t.name)
                .collect(),
            TableSet::CepTables | TableSet::AllTables => Vec::new(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableSet::UnifiedCepOnly => "unified-cep-only",
            TableSet::CepTables => "cep-tables",
            TableSet::AllTables => "all",
        }
    }
}

impl FromStr for TableSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unified-cep-only" => Ok(TableSet::UnifiedCepOnly),
            "cep-tables" => Ok(TableSet::CepTables),
            "all" => Ok(TableSet::AllTables),
            _ => Err(format!(
                "Unknown table set: {}. Use 'unified-cep-only', 'cep-tables' or 'all'.",
                s
            )),
        }
    }
}

impl fmt::Display for TableSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
