//! Single-CEP lookups against the unified table.

use serde::{Deserialize, Serialize};

use crate::Row;
use crate::database::{DatabaseBackend, DatabaseError};
use crate::error::LoaderResult;
use crate::tables::UNIFIED_TABLE;

/// One row of the unified table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub cep: String,
    pub logradouro: Option<String>,
    pub complemento: Option<String>,
    pub bairro: Option<String>,
    pub municipio: String,
    pub municipio_cod_ibge: i32,
    pub uf: String,
    pub nome: Option<String>,
}

impl UnifiedRecord {
    fn from_row(row: Row) -> Result<Self, DatabaseError> {
        let mut fields = row.into_iter();
        let mut next = || fields.next().flatten();
        let required = |value: Option<String>, column: &str| {
            value.ok_or_else(|| {
                DatabaseError::QueryFailed(format!("Column {} is unexpectedly null", column))
            })
        };

        let cep = required(next(), "cep")?;
        let logradouro = next();
        let complemento = next();
        let bairro = next();
        let municipio = required(next(), "municipio")?;
        let code = required(next(), "municipio_cod_ibge")?;
        let municipio_cod_ibge = code.trim().parse().map_err(|e| {
            DatabaseError::QueryFailed(format!("Invalid municipio_cod_ibge '{}': {}", code, e))
        })?;
        let uf = required(next(), "uf")?;
        let nome = next();

        Ok(Self {
            cep,
            logradouro,
            complemento,
            bairro,
            municipio,
            municipio_cod_ibge,
            uf,
            nome,
        })
    }
}

/// Strips hyphens and surrounding whitespace from a CEP.
pub fn normalize_cep(cep: &str) -> String {
    cep.replace('-', "").trim().to_string()
}

/// Looks CEPs up in the unified table
pub struct CepQuerier<'a> {
    backend: &'a dyn DatabaseBackend,
}

impl<'a> CepQuerier<'a> {
    pub fn new(backend: &'a dyn DatabaseBackend) -> Self {
        Self { backend }
    }

    /// The record for `cep`, or `None` when the CEP is unknown.
    pub fn query(&self, cep: &str) -> LoaderResult<Option<UnifiedRecord>> {
        let cep = normalize_cep(cep);
        let sql = format!(
            "SELECT CAST(cep AS VARCHAR), CAST(logradouro AS VARCHAR), \
             CAST(complemento AS VARCHAR), CAST(bairro AS VARCHAR), \
             CAST(municipio AS VARCHAR), CAST(municipio_cod_ibge AS VARCHAR), \
             CAST(uf AS VARCHAR), CAST(nome AS VARCHAR) \
             FROM {} WHERE cep = CAST($1 AS VARCHAR)",
            UNIFIED_TABLE
        );

        let rows = self.backend.query(&sql, &[Some(cep)])?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(UnifiedRecord::from_row(row)?)),
            None => Ok(None),
        }
    }
}
