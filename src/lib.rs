//! Loader for the Correios eDNE "Básico" postal-code dataset.
//!
//! A load resolves a DNE source (URL, ZIP, nested ZIP or directory), fills
//! the eDNE tables from the delimited text files, and builds `cep_unificado`,
//! a single table answering "which address has this CEP".
//!
//! ```no_run
//! use edne_loader::database;
//! use edne_loader::loader::DneLoader;
//! use edne_loader::querier::CepQuerier;
//! use edne_loader::tables::{TableRegistry, TableSet};
//!
//! let registry = TableRegistry::dne();
//! let backend = database::connect("duckdb://cep.duckdb")?;
//! DneLoader::new(backend.as_ref(), &registry)
//!     .load(Some("eDNE_Basico.zip"), TableSet::UnifiedCepOnly)?;
//!
//! let record = CepQuerier::new(backend.as_ref()).query("01001-000")?;
//! # Ok::<(), edne_loader::error::LoaderError>(())
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod loader;
pub mod querier;
pub mod reader;
pub mod resolver;
pub mod tables;
pub mod unified;
pub mod writer;

#[cfg(feature = "cli")]
pub mod cli;

/// One record of a table: nullable text fields in column order.
pub type Row = Vec<Option<String>>;

pub use config::LoaderConfig;
pub use error::{LoaderError, LoaderResult};
pub use loader::{DneLoader, LoadSummary};
pub use querier::{CepQuerier, UnifiedRecord};
pub use tables::{TableRegistry, TableSet};
