//! End-to-end loads followed by CEP lookups

mod common;

use std::fs;

use edne_loader::config::LoaderConfig;
use edne_loader::database::{DatabaseBackend, DuckDBBackend, connect};
use edne_loader::error::LoaderError;
use edne_loader::resolver::ResolverError;
use edne_loader::tables::{TableRegistry, TableSet, UNIFIED_TABLE};
use edne_loader::writer::IntegrityError;
use edne_loader::{CepQuerier, DneLoader};
use tempfile::tempdir;

fn config_with_temp_root(root: &std::path::Path) -> LoaderConfig {
    let mut config = LoaderConfig::default();
    config.source.temp_dir = Some(root.to_path_buf());
    config.loader.insert_batch_size = 2;
    config.loader.unified_batch_size = 2;
    config
}

#[test]
fn test_load_from_url_keeps_only_unified_table() {
    let registry = TableRegistry::dne();
    let temp_root = tempdir().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/eDNE_Basico.zip")
        .with_status(200)
        .with_body(common::outer_zip_bytes())
        .create();

    let mut config = config_with_temp_root(temp_root.path());
    config.source.download_url = format!("{}/eDNE_Basico.zip", server.url());
    let backend = DuckDBBackend::in_memory().unwrap();

    let summary = DneLoader::new(&backend, &registry)
        .with_config(config)
        .load(None, TableSet::UnifiedCepOnly)
        .unwrap();

    mock.assert();
    assert_eq!(summary.unified.total(), common::UNIFIED_CEPS);
    assert_eq!(summary.inserted("log_logradouro"), Some(3));
    assert_eq!(summary.inserted("ect_pais"), None);
    assert_eq!(summary.dropped.len(), registry.tables().len() - 1);
    assert_eq!(common::entry_count(temp_root.path()), 0);

    for table in registry.names() {
        assert_eq!(
            backend.table_exists(table).unwrap(),
            table == UNIFIED_TABLE,
            "{}",
            table
        );
    }

    let querier = CepQuerier::new(&backend);
    let plain = querier.query(common::SEEDED_CEP).unwrap();
    let dashed = querier.query("11111-111").unwrap();
    let padded = querier.query(" 11111111 ").unwrap();
    assert!(plain.is_some());
    assert_eq!(plain, dashed);
    assert_eq!(plain, padded);
    assert_eq!(querier.query("99999-999").unwrap(), None);
}

#[test]
fn test_load_cep_tables_keeps_lookup_tables() {
    let registry = TableRegistry::dne();
    let source = tempdir().unwrap();
    let zip = common::write_dne_zip(source.path(), "eDNE_Basico_25051.zip");
    let backend = DuckDBBackend::in_memory().unwrap();

    let summary = DneLoader::new(&backend, &registry)
        .load(Some(&zip.to_string_lossy()), TableSet::CepTables)
        .unwrap();

    assert!(summary.dropped.is_empty());
    assert_eq!(summary.tables.len(), 6);
    for table in registry.names() {
        let lookup = registry.get(table).unwrap().required_for_lookup;
        assert_eq!(backend.table_exists(table).unwrap(), lookup, "{}", table);
    }
    assert_eq!(backend.count_rows("log_localidade").unwrap(), 4);
}

#[test]
fn test_load_all_tables_from_directory() {
    let registry = TableRegistry::dne();
    let source = tempdir().unwrap();
    common::write_dne_package_dir(source.path());
    let backend = DuckDBBackend::in_memory().unwrap();

    let summary = DneLoader::new(&backend, &registry)
        .load(Some(&source.path().to_string_lossy()), TableSet::AllTables)
        .unwrap();

    assert_eq!(summary.tables.len(), registry.tables().len() - 1);
    for table in registry.names() {
        assert!(backend.table_exists(table).unwrap(), "{} missing", table);
    }
    assert_eq!(backend.count_rows("ect_pais").unwrap(), 1);
    assert_eq!(backend.count_rows("log_grande_usuario").unwrap(), 2);
    assert_eq!(
        backend.count_rows(UNIFIED_TABLE).unwrap(),
        common::UNIFIED_CEPS
    );
}

#[test]
fn test_failed_load_rolls_back() {
    let registry = TableRegistry::dne();
    let source = tempdir().unwrap();
    common::write_dne_dir(source.path());
    fs::write(
        source.path().join("LOG_CPC.TXT"),
        common::encode("abc@SP@2@CPC@Rua Um@55555555\n"),
    )
    .unwrap();
    let backend = DuckDBBackend::in_memory().unwrap();

    let result = DneLoader::new(&backend, &registry)
        .load(Some(&source.path().to_string_lossy()), TableSet::AllTables);

    assert!(matches!(result, Err(LoaderError::Database(_))));
    for table in registry.names() {
        assert!(!backend.table_exists(table).unwrap(), "{} kept", table);
    }
}

#[test]
fn test_locality_cycle_rolls_back() {
    let registry = TableRegistry::dne();
    let source = tempdir().unwrap();
    common::write_dne_dir(source.path());
    fs::write(
        source.path().join("LOG_LOCALIDADE.TXT"),
        common::encode(
            "1@SP@São Paulo@@1@M@2@S Paulo@3550308\n\
             2@SP@Pequena@22222222@0@M@1@Pequena@3500001\n",
        ),
    )
    .unwrap();
    let backend = DuckDBBackend::in_memory().unwrap();

    let result = DneLoader::new(&backend, &registry)
        .load(Some(&source.path().to_string_lossy()), TableSet::AllTables);

    assert!(matches!(
        result,
        Err(LoaderError::Integrity(IntegrityError::Cycle { .. }))
    ));
    for table in registry.names() {
        assert!(!backend.table_exists(table).unwrap(), "{} kept", table);
    }
}

fn assert_reload_replaces_previous_load(table_set: TableSet) {
    let registry = TableRegistry::dne();
    let source = tempdir().unwrap();
    common::write_dne_package_dir(source.path());
    let source = source.path().to_string_lossy().to_string();
    let backend = DuckDBBackend::in_memory().unwrap();
    let loader = |config: LoaderConfig| {
        DneLoader::new(&backend, &registry)
            .with_config(config)
            .load(Some(&source), table_set)
            .unwrap()
    };

    let temp_root = tempdir().unwrap();
    loader(config_with_temp_root(temp_root.path()));
    let summary = loader(config_with_temp_root(temp_root.path()));

    assert_eq!(summary.unified.total(), common::UNIFIED_CEPS);
    assert_eq!(summary.inserted("log_localidade"), Some(4));
    assert_eq!(
        backend.count_rows(UNIFIED_TABLE).unwrap(),
        common::UNIFIED_CEPS
    );
    assert_eq!(backend.count_rows("log_localidade").unwrap(), 4);
    assert_eq!(backend.count_rows("log_logradouro").unwrap(), 3);
}

#[test]
fn test_reload_replaces_previous_load() {
    assert_reload_replaces_previous_load(TableSet::AllTables);
}

#[test]
fn test_reload_of_cep_tables_replaces_previous_load() {
    assert_reload_replaces_previous_load(TableSet::CepTables);
}

#[test]
fn test_unresolvable_source_touches_nothing() {
    let registry = TableRegistry::dne();
    let source = tempdir().unwrap();
    let backend = DuckDBBackend::in_memory().unwrap();

    let result = DneLoader::new(&backend, &registry).load(
        Some(&source.path().join("missing").to_string_lossy()),
        TableSet::UnifiedCepOnly,
    );

    assert!(matches!(
        result,
        Err(LoaderError::Resolver(ResolverError::SourceNotFound(_)))
    ));
    assert!(!backend.table_exists(UNIFIED_TABLE).unwrap());
}

#[test]
fn test_loaded_file_database_survives_reconnect() {
    let registry = TableRegistry::dne();
    let source = tempdir().unwrap();
    let target = tempdir().unwrap();
    let zip = common::write_outer_zip(source.path(), "eDNE_Basico.zip");
    let url = format!("duckdb://{}", target.path().join("cep.duckdb").display());

    {
        let backend = connect(&url).unwrap();
        DneLoader::new(backend.as_ref(), &registry)
            .load(Some(&zip.to_string_lossy()), TableSet::UnifiedCepOnly)
            .unwrap();
    }

    let backend = connect(&url).unwrap();
    let record = CepQuerier::new(backend.as_ref())
        .query("77777-777")
        .unwrap()
        .unwrap();
    assert_eq!(record.nome.as_deref(), Some("AC Direita"));
    assert_eq!(record.complemento.as_deref(), Some("50"));
    assert_eq!(record.municipio_cod_ibge, 3550308);
}
