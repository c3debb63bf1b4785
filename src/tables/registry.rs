use std::collections::HashSet;

use super::codes::{CepRangeType, LocalitySituation, LocalityType, SectionSide};
use super::{ColumnSpec as C, TableSpec};

/// Name of the denormalized lookup table.
pub const UNIFIED_TABLE: &str = "cep_unificado";

/// Immutable, ordered collection of table definitions.
///
/// Tables are kept in dependency order: every table appears after the tables
/// its foreign keys point to.
#[derive(Debug, Clone)]
pub struct TableRegistry {
    tables: Vec<TableSpec>,
}

impl TableRegistry {
    /// Builds a registry from `tables`, computing which of them are needed
    /// for the lookup table.
    ///
    /// A table is needed when it has a `cep` column or when an already needed
    /// table references it, walking the tables from the last to the first.
    pub fn new(mut tables: Vec<TableSpec>) -> Self {
        let mut dependencies: HashSet<&'static str> = HashSet::new();
        for table in tables.iter_mut().rev() {
            if table.has_column("cep") || dependencies.contains(table.name) {
                dependencies.extend(
                    table
                        .columns
                        .iter()
                        .filter_map(|c| c.references)
                        .map(|fk| fk.table),
                );
                table.required_for_lookup = true;
            }
        }
        Self { tables }
    }

    /// The eDNE "Básico" layout.
    pub fn dne() -> Self {
        Self::new(dne_tables())
    }

    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    pub fn get(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Position of `name` in dependency order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tables.iter().map(|t| t.name).collect()
    }

    /// Tables loaded from files.
    pub fn file_tables(&self) -> impl Iterator<Item = &TableSpec> {
        self.tables.iter().filter(|t| t.file_glob.is_some())
    }

    pub fn lookup_tables(&self) -> Vec<&'static str> {
        self.tables
            .iter()
            .filter(|t| t.required_for_lookup)
            .map(|t| t.name)
            .collect()
    }
}

fn dne_tables() -> Vec<TableSpec> {
    vec![
        TableSpec::new(
            UNIFIED_TABLE,
            vec![
                C::varchar("cep", 8).primary_key(),
                C::varchar("logradouro", 100),
                C::varchar("complemento", 100),
                C::varchar("bairro", 72),
                C::varchar("municipio", 72).not_null(),
                C::integer("municipio_cod_ibge").not_null(),
                C::varchar("uf", 2).not_null(),
                C::varchar("nome", 100),
            ],
        )
        .unified(),
        TableSpec::new(
            "ect_pais",
            vec![
                C::varchar("pai_sg", 2).primary_key(),
                C::varchar("pai_sg_alternativa", 3),
                C::varchar("pai_no_portugues", 72),
                C::varchar("pai_no_ingles", 72),
                C::varchar("pai_no_frances", 72),
                C::varchar("pai_abreviatura", 36),
            ],
        ),
        TableSpec::new(
            "log_faixa_uf",
            vec![
                C::varchar("ufe_sg", 2).primary_key(),
                C::varchar("ufe_cep_ini", 8).primary_key(),
                C::varchar("ufe_cep_fim", 8).not_null(),
            ],
        ),
        TableSpec::new(
            "log_localidade",
            vec![
                C::integer("loc_nu").primary_key().unique(),
                C::varchar("ufe_sg", 2).primary_key(),
                C::varchar("loc_no", 72).not_null(),
                C::varchar("cep", 8).indexed(),
                C::code("loc_in_sit", LocalitySituation::CODES).not_null(),
                C::code("loc_in_tipo_loc", LocalityType::CODES).not_null(),
                C::integer("loc_nu_sub")
                    .indexed()
                    .references("log_localidade", "loc_nu"),
                C::varchar("loc_no_abrev", 36),
                C::integer("mun_nu"),
            ],
        ),
        TableSpec::new(
            "log_bairro",
            vec![
                C::integer("bai_nu").primary_key(),
                C::varchar("ufe_sg", 2).not_null(),
                C::integer("loc_nu")
                    .not_null()
                    .indexed()
                    .references("log_localidade", "loc_nu"),
                C::varchar("bai_no", 72).not_null(),
                C::varchar("bai_no_abrev", 36),
            ],
        ),
        TableSpec::new(
            "log_cpc",
            vec![
                C::integer("cpc_nu").primary_key(),
                C::varchar("ufe_sg", 2).not_null(),
                C::integer("loc_nu")
                    .not_null()
                    .indexed()
                    .references("log_localidade", "loc_nu"),
                C::varchar("cpc_no", 72).not_null(),
                C::varchar("cpc_endereco", 100).not_null(),
                C::varchar("cep", 8).not_null().indexed(),
            ],
        ),
        TableSpec::new(
            "log_faixa_localidade",
            vec![
                C::integer("loc_nu")
                    .primary_key()
                    .references("log_localidade", "loc_nu"),
                C::varchar("loc_cep_ini", 8).primary_key(),
                C::varchar("loc_cep_fim", 8),
                C::code("loc_tipo_faixa", CepRangeType::CODES).primary_key(),
            ],
        ),
        TableSpec::new(
            "log_var_loc",
            vec![
                C::integer("loc_nu")
                    .primary_key()
                    .references("log_localidade", "loc_nu"),
                C::integer("val_nu").primary_key(),
                C::varchar("val_tx", 72).not_null(),
            ],
        ),
        TableSpec::new(
            "log_faixa_bairro",
            vec![
                C::integer("bai_nu")
                    .primary_key()
                    .references("log_bairro", "bai_nu"),
                C::varchar("fcb_cep_ini", 8).primary_key(),
                C::varchar("fcb_cep_fim", 8).not_null(),
            ],
        ),
        TableSpec::new(
            "log_faixa_cpc",
            vec![
                C::integer("cpc_nu")
                    .primary_key()
                    .references("log_cpc", "cpc_nu"),
                C::varchar("cpc_inicial", 6).primary_key(),
                C::varchar("cpc_final", 6).primary_key(),
            ],
        ),
        TableSpec::new(
            "log_logradouro",
            vec![
                C::integer("log_nu").primary_key(),
                C::varchar("ufe_sg", 2).not_null(),
                C::integer("loc_nu")
                    .not_null()
                    .indexed()
                    .references("log_localidade", "loc_nu"),
                C::integer("bai_nu_ini")
                    .not_null()
                    .indexed()
                    .references("log_bairro", "bai_nu"),
                C::integer("bai_nu_fim")
                    .indexed()
                    .references("log_bairro", "bai_nu"),
                C::varchar("log_no", 100).not_null(),
                C::varchar("log_complemento", 100),
                C::varchar("cep", 8).not_null().indexed(),
                C::varchar("tlo_tx", 36).not_null(),
                C::varchar("log_sta_tlo", 1).indexed(),
                C::varchar("log_no_abrev", 36),
            ],
        )
        .with_file_glob("LOG_LOGRADOURO_*.TXT"),
        TableSpec::new(
            "log_var_bai",
            vec![
                C::integer("bai_nu")
                    .primary_key()
                    .references("log_bairro", "bai_nu"),
                C::integer("vdb_nu").primary_key(),
                C::varchar("vdb_tx", 72).not_null(),
            ],
        ),
        TableSpec::new(
            "log_grande_usuario",
            vec![
                C::integer("gru_nu").primary_key(),
                C::varchar("ufe_sg", 2).not_null(),
                C::integer("loc_nu")
                    .not_null()
                    .indexed()
                    .references("log_localidade", "loc_nu"),
                C::integer("bai_nu")
                    .not_null()
                    .indexed()
                    .references("log_bairro", "bai_nu"),
                C::integer("log_nu")
                    .indexed()
                    .references("log_logradouro", "log_nu"),
                C::varchar("gru_no", 72).not_null(),
                C::varchar("gru_endereco", 100).not_null(),
                C::varchar("cep", 8).not_null().indexed(),
                C::varchar("gru_no_abrev", 36),
            ],
        ),
        TableSpec::new(
            "log_num_sec",
            vec![
                C::integer("log_nu")
                    .primary_key()
                    .references("log_logradouro", "log_nu"),
                C::varchar("sec_nu_ini", 10),
                C::varchar("sec_nu_fim", 10),
                C::code("sec_in_lado", SectionSide::CODES),
            ],
        ),
        TableSpec::new(
            "log_unid_oper",
            vec![
                C::integer("uop_nu").primary_key(),
                C::varchar("ufe_sg", 2).not_null(),
                C::integer("loc_nu")
                    .not_null()
                    .indexed()
                    .references("log_localidade", "loc_nu"),
                C::integer("bai_nu")
                    .not_null()
                    .indexed()
                    .references("log_bairro", "bai_nu"),
                C::integer("log_nu")
                    .indexed()
                    .references("log_logradouro", "log_nu"),
                C::varchar("uop_no", 100).not_null(),
                C::varchar("uop_endereco", 100).not_null(),
                C::varchar("cep", 8).not_null().indexed(),
                C::varchar("uop_in_cp", 1),
                C::varchar("uop_no_abrev", 36),
            ],
        ),
        TableSpec::new(
            "log_var_log",
            vec![
                C::integer("log_nu")
                    .primary_key()
                    .references("log_logradouro", "log_nu"),
                C::integer("vlo_nu").primary_key(),
                C::varchar("tlo_tx", 36),
                C::varchar("vlo_tx", 150),
            ],
        ),
        TableSpec::new(
            "log_faixa_uop",
            vec![
                C::integer("upo_nu")
                    .primary_key()
                    .references("log_unid_oper", "uop_nu"),
                C::integer("fnc_inicial").primary_key(),
                C::integer("fnc_final").not_null(),
            ],
        ),
    ]
}
