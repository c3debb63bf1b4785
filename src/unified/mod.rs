//! Builds the denormalized `cep_unificado` table from the populated source
//! tables.
//!
//! Six sources are merged in a fixed order. A CEP already present is never
//! overwritten, so earlier sources win. Streets, localities and subordinate
//! localities are copied with `INSERT ... SELECT`. Community mailboxes, large
//! users and operational units carry a free-text address that is split into
//! street and complement here, so their rows are read page by page and
//! inserted in batches.

mod normalize;

use serde::Serialize;
use tracing::{debug, info};

use crate::Row;
use crate::database::{DatabaseBackend, flatten_params, schema};
use crate::error::{LoaderError, LoaderResult};
use crate::tables::{TableRegistry, TableSpec, UNIFIED_TABLE};

pub use normalize::split_address;

/// Default number of rows per normalized INSERT
pub const DEFAULT_UNIFIED_BATCH_SIZE: usize = 500;

const UNIFIED_COLUMNS: &str =
    "cep, logradouro, complemento, bairro, municipio, municipio_cod_ibge, uf, nome";

const LOGRADOURO: usize = 1;
const COMPLEMENTO: usize = 2;

/// Source relation feeding the unified table, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnifiedSource {
    Streets,
    Localities,
    SubordinateLocalities,
    CommunityMailboxes,
    LargeUsers,
    OperationalUnits,
}

impl UnifiedSource {
    /// Every source, in insertion order
    pub const ALL: [UnifiedSource; 6] = [
        UnifiedSource::Streets,
        UnifiedSource::Localities,
        UnifiedSource::SubordinateLocalities,
        UnifiedSource::CommunityMailboxes,
        UnifiedSource::LargeUsers,
        UnifiedSource::OperationalUnits,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            UnifiedSource::Streets => "streets",
            UnifiedSource::Localities => "localities",
            UnifiedSource::SubordinateLocalities => "subordinate localities",
            UnifiedSource::CommunityMailboxes => "community mailboxes",
            UnifiedSource::LargeUsers => "large users",
            UnifiedSource::OperationalUnits => "operational units",
        }
    }

    /// Whether the address column must be split before insertion
    pub fn needs_normalization(&self) -> bool {
        match self {
            UnifiedSource::Streets
            | UnifiedSource::Localities
            | UnifiedSource::SubordinateLocalities => false,
            UnifiedSource::CommunityMailboxes
            | UnifiedSource::LargeUsers
            | UnifiedSource::OperationalUnits => true,
        }
    }

    /// Projection of this source onto the unified columns, plus `rn`, which
    /// is 1 for the first row of each CEP. Rows without a municipality code
    /// are excluded.
    fn select_sql(&self) -> &'static str {
        match self {
            UnifiedSource::Streets => {
                "SELECT lg.cep AS cep, \
                        CASE WHEN lg.log_sta_tlo = 'S' THEN lg.tlo_tx || ' ' || lg.log_no \
                             ELSE lg.log_no END AS logradouro, \
                        CAST(NULL AS VARCHAR) AS complemento, \
                        b.bai_no AS bairro, \
                        l.loc_no AS municipio, \
                        l.mun_nu AS municipio_cod_ibge, \
                        lg.ufe_sg AS uf, \
                        CAST(NULL AS VARCHAR) AS nome, \
                        ROW_NUMBER() OVER (PARTITION BY lg.cep ORDER BY lg.log_nu) AS rn \
                 FROM log_logradouro lg \
                 JOIN log_localidade l ON lg.loc_nu = l.loc_nu \
                 JOIN log_bairro b ON lg.bai_nu_ini = b.bai_nu \
                 WHERE l.mun_nu IS NOT NULL"
            }
            UnifiedSource::Localities => {
                "SELECT l.cep AS cep, \
                        CAST(NULL AS VARCHAR) AS logradouro, \
                        CAST(NULL AS VARCHAR) AS complemento, \
                        CAST(NULL AS VARCHAR) AS bairro, \
                        l.loc_no AS municipio, \
                        l.mun_nu AS municipio_cod_ibge, \
                        l.ufe_sg AS uf, \
                        CAST(NULL AS VARCHAR) AS nome, \
                        ROW_NUMBER() OVER (PARTITION BY l.cep ORDER BY l.loc_nu) AS rn \
                 FROM log_localidade l \
                 WHERE l.cep IS NOT NULL AND l.loc_nu_sub IS NULL AND l.mun_nu IS NOT NULL"
            }
            UnifiedSource::SubordinateLocalities => {
                "SELECT l.cep AS cep, \
                        CAST(NULL AS VARCHAR) AS logradouro, \
                        CAST(NULL AS VARCHAR) AS complemento, \
                        l.loc_no AS bairro, \
                        sup.loc_no AS municipio, \
                        sup.mun_nu AS municipio_cod_ibge, \
                        l.ufe_sg AS uf, \
                        CAST(NULL AS VARCHAR) AS nome, \
                        ROW_NUMBER() OVER (PARTITION BY l.cep ORDER BY l.loc_nu) AS rn \
                 FROM log_localidade l \
                 JOIN log_localidade sup ON l.loc_nu_sub = sup.loc_nu \
                 WHERE l.cep IS NOT NULL AND sup.mun_nu IS NOT NULL"
            }
            UnifiedSource::CommunityMailboxes => {
                "SELECT c.cep AS cep, \
                        c.cpc_endereco AS logradouro, \
                        CAST(NULL AS VARCHAR) AS complemento, \
                        CAST(NULL AS VARCHAR) AS bairro, \
                        COALESCE(sup.loc_no, l.loc_no) AS municipio, \
                        COALESCE(sup.mun_nu, l.mun_nu) AS municipio_cod_ibge, \
                        c.ufe_sg AS uf, \
                        c.cpc_no AS nome, \
                        ROW_NUMBER() OVER (PARTITION BY c.cep ORDER BY c.cpc_nu) AS rn \
                 FROM log_cpc c \
                 JOIN log_localidade l ON c.loc_nu = l.loc_nu \
                 LEFT JOIN log_localidade sup ON l.loc_nu_sub = sup.loc_nu \
                 WHERE COALESCE(sup.mun_nu, l.mun_nu) IS NOT NULL"
            }
            UnifiedSource::LargeUsers => {
                "SELECT g.cep AS cep, \
                        g.gru_endereco AS logradouro, \
                        CAST(NULL AS VARCHAR) AS complemento, \
                        b.bai_no AS bairro, \
                        COALESCE(sup.loc_no, l.loc_no) AS municipio, \
                        COALESCE(sup.mun_nu, l.mun_nu) AS municipio_cod_ibge, \
                        g.ufe_sg AS uf, \
                        g.gru_no AS nome, \
                        ROW_NUMBER() OVER (PARTITION BY g.cep ORDER BY g.gru_nu) AS rn \
                 FROM log_grande_usuario g \
                 JOIN log_localidade l ON g.loc_nu = l.loc_nu \
                 JOIN log_bairro b ON g.bai_nu = b.bai_nu \
                 LEFT JOIN log_localidade sup ON l.loc_nu_sub = sup.loc_nu \
                 WHERE COALESCE(sup.mun_nu, l.mun_nu) IS NOT NULL"
            }
            UnifiedSource::OperationalUnits => {
                "SELECT u.cep AS cep, \
                        u.uop_endereco AS logradouro, \
                        CAST(NULL AS VARCHAR) AS complemento, \
                        b.bai_no AS bairro, \
                        COALESCE(sup.loc_no, l.loc_no) AS municipio, \
                        COALESCE(sup.mun_nu, l.mun_nu) AS municipio_cod_ibge, \
                        u.ufe_sg AS uf, \
                        u.uop_no AS nome, \
                        ROW_NUMBER() OVER (PARTITION BY u.cep ORDER BY u.uop_nu) AS rn \
                 FROM log_unid_oper u \
                 JOIN log_localidade l ON u.loc_nu = l.loc_nu \
                 JOIN log_bairro b ON u.bai_nu = b.bai_nu \
                 LEFT JOIN log_localidade sup ON l.loc_nu_sub = sup.loc_nu \
                 WHERE COALESCE(sup.mun_nu, l.mun_nu) IS NOT NULL"
            }
        }
    }

    /// `INSERT ... SELECT` moving this source into the unified table
    pub fn insert_from_select_sql(&self) -> String {
        format!(
            "INSERT INTO {table} ({cols}) SELECT {cols} FROM ({select}) src \
             WHERE rn = 1 ON CONFLICT (cep) DO NOTHING",
            table = UNIFIED_TABLE,
            cols = UNIFIED_COLUMNS,
            select = self.select_sql()
        )
    }

    /// The next `limit` rows of this source after the CEP bound to `$1`,
    /// every column as text
    pub fn page_sql(&self, limit: usize) -> String {
        format!(
            "SELECT CAST(cep AS VARCHAR), CAST(logradouro AS VARCHAR), \
             CAST(complemento AS VARCHAR), CAST(bairro AS VARCHAR), \
             CAST(municipio AS VARCHAR), CAST(municipio_cod_ibge AS VARCHAR), \
             CAST(uf AS VARCHAR), CAST(nome AS VARCHAR) \
             FROM ({select}) src WHERE rn = 1 AND cep > CAST($1 AS VARCHAR) \
             ORDER BY cep LIMIT {limit}",
            select = self.select_sql()
        )
    }
}

/// Rows contributed by each source in one build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnifiedSummary {
    pub phases: Vec<(UnifiedSource, u64)>,
}

impl UnifiedSummary {
    /// Rows contributed by `source`
    pub fn count(&self, source: UnifiedSource) -> u64 {
        self.phases
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Rows contributed by all sources
    pub fn total(&self) -> u64 {
        self.phases.iter().map(|(_, n)| n).sum()
    }
}

/// Replaces the address column of a unified row by its street part and
/// fills the complement.
pub fn normalize_row(mut row: Row) -> Row {
    if let Some(address) = row.get(LOGRADOURO).cloned().flatten() {
        let (street, complement) = split_address(&address);
        row[LOGRADOURO] = Some(street);
        if let Some(slot) = row.get_mut(COMPLEMENTO) {
            *slot = complement;
        }
    }
    row
}

/// Populates the unified table
pub struct UnifiedTableBuilder<'a> {
    backend: &'a dyn DatabaseBackend,
    registry: &'a TableRegistry,
    batch_size: usize,
}

impl<'a> UnifiedTableBuilder<'a> {
    pub fn new(backend: &'a dyn DatabaseBackend, registry: &'a TableRegistry) -> Self {
        Self {
            backend,
            registry,
            batch_size: DEFAULT_UNIFIED_BATCH_SIZE,
        }
    }

    /// Rows per normalized INSERT and per page read (at least one)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Runs every source in order. The source tables must be populated.
    pub fn build(&self) -> LoaderResult<UnifiedSummary> {
        info!("Populating unified CEP table");
        let table = self
            .registry
            .get(UNIFIED_TABLE)
            .ok_or_else(|| LoaderError::UnknownTable(UNIFIED_TABLE.to_string()))?;

        let mut summary = UnifiedSummary::default();
        let mut total = self.backend.count_rows(UNIFIED_TABLE)?;

        for source in UnifiedSource::ALL {
            if source.needs_normalization() {
                info!(
                    "Populating unified CEP table with normalized {} data",
                    source.label()
                );
                self.insert_normalized(table, source)?;
            } else {
                info!("Populating unified CEP table with {} data", source.label());
                self.backend
                    .execute(&source.insert_from_select_sql(), &[])?;
            }

            let after = self.backend.count_rows(UNIFIED_TABLE)?;
            let inserted = after.saturating_sub(total);
            total = after;
            info!(
                "Inserted {} CEPs from {} into table {}",
                inserted,
                source.label(),
                UNIFIED_TABLE
            );
            summary.phases.push((source, inserted));
        }

        info!("Inserted {} rows into table \"{}\"", summary.total(), UNIFIED_TABLE);
        Ok(summary)
    }

    fn insert_normalized(&self, table: &TableSpec, source: UnifiedSource) -> LoaderResult<()> {
        let width = table.columns.len();
        let sql = source.page_sql(self.batch_size);
        // Every CEP sorts after the empty string
        let mut last_cep = String::new();

        loop {
            let page = self.backend.query(&sql, &[Some(last_cep.clone())])?;
            let fetched = page.len();
            match page.last().and_then(|row| row.first().cloned().flatten()) {
                Some(cep) => last_cep = cep,
                None => break,
            }
            let rows: Vec<Row> = page.into_iter().map(normalize_row).collect();

            debug!("Inserting {} rows into {}", rows.len(), UNIFIED_TABLE);
            let insert = schema::insert_sql(table, rows.len(), true);
            self.backend.execute(&insert, &flatten_params(width, &rows))?;

            if fetched < self.batch_size {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[Option<&str>]) -> Row {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_normalize_row_splits_address() {
        let row = text(&[
            Some("11111111"),
            Some("Street X, Apt 5"),
            None,
            None,
            Some("City"),
            Some("1"),
            Some("SP"),
            Some("Name"),
        ]);
        let row = normalize_row(row);
        assert_eq!(row[LOGRADOURO].as_deref(), Some("Street X"));
        assert_eq!(row[COMPLEMENTO].as_deref(), Some("Apt 5"));
    }

    #[test]
    fn test_normalize_row_without_comma() {
        let row = normalize_row(text(&[Some("1"), Some("Street Y"), None]));
        assert_eq!(row[LOGRADOURO].as_deref(), Some("Street Y"));
        assert_eq!(row[COMPLEMENTO], None);
    }

    #[test]
    fn test_sources_in_precedence_order() {
        let normalized: Vec<bool> = UnifiedSource::ALL
            .iter()
            .map(|s| s.needs_normalization())
            .collect();
        assert_eq!(normalized, vec![false, false, false, true, true, true]);
    }

    #[test]
    fn test_summary_total() {
        let summary = UnifiedSummary {
            phases: vec![(UnifiedSource::Streets, 3), (UnifiedSource::LargeUsers, 2)],
        };
        assert_eq!(summary.total(), 5);
        assert_eq!(summary.count(UnifiedSource::LargeUsers), 2);
        assert_eq!(summary.count(UnifiedSource::Localities), 0);
    }

    #[test]
    fn test_page_sql_paginates_by_cep() {
        let sql = UnifiedSource::LargeUsers.page_sql(500);
        assert!(sql.ends_with("WHERE rn = 1 AND cep > CAST($1 AS VARCHAR) ORDER BY cep LIMIT 500"));
        assert!(!sql.contains("OFFSET"));
        assert!(sql.contains("FROM log_grande_usuario g"));
    }
}
